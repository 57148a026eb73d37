//! Editor-facing context that owns a tree history and its growth clock.
//!
//! A front end holds one [`TreeWorkspace`] and calls [`TreeWorkspace::tick`]
//! once per frame. Each tick grows every node by the part of the clock
//! interval since the previous tick that lies past the node's stage, so
//! running the clock in reverse shrinks the tree back along the same path.

use std::path::Path;

use tracing::{info, warn};

use crate::{
    clock::{GrowthClock, MonotonicTime, TimeSource},
    config::{GrowthConfig, MeshConfig},
    error::StoreError,
    growth::advance_growth,
    mesh::{MeshData, generate_tree_mesh},
    node::LSystemGeneration,
    sample,
    scene::{SceneEntity, SceneSink, create_tree},
    store,
    validate::validate_history,
};

/// History, clock and settings edited together by a front end.
///
/// ### Fields
/// - `generations` - The current, possibly grown, history.
/// - `growth` - Settings used by [`TreeWorkspace::tick`].
/// - `mesh` - Settings used by [`TreeWorkspace::build_mesh`] and
///   [`TreeWorkspace::publish`].
pub struct TreeWorkspace<T: TimeSource = MonotonicTime> {
    pub generations: Vec<LSystemGeneration>,
    pub growth: GrowthConfig,
    pub mesh: MeshConfig,
    /// History as loaded, restored by [`TreeWorkspace::reset`].
    baseline: Vec<LSystemGeneration>,
    clock: GrowthClock<T>,
    /// Clock time already turned into growth.
    applied_time: f64,
}

impl TreeWorkspace<MonotonicTime> {
    pub fn new() -> Self {
        Self::with_clock(GrowthClock::new())
    }
}

impl Default for TreeWorkspace<MonotonicTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeSource> TreeWorkspace<T> {
    /// Creates an empty workspace driven by `clock`.
    ///
    /// ### Parameters
    /// - `clock` - Growth clock, typically with a custom [`TimeSource`] in tests.
    pub fn with_clock(clock: GrowthClock<T>) -> Self {
        Self {
            generations: Vec::new(),
            growth: GrowthConfig::default(),
            mesh: MeshConfig::default(),
            baseline: Vec::new(),
            clock,
            applied_time: 0.0,
        }
    }

    pub fn clock(&self) -> &GrowthClock<T> {
        &self.clock
    }

    /// Installs a new history and rewinds the clock.
    ///
    /// The history also becomes the baseline restored by
    /// [`TreeWorkspace::reset`].
    ///
    /// ### Parameters
    /// - `generations` - The history to edit from now on.
    pub fn replace_history(&mut self, generations: Vec<LSystemGeneration>) {
        self.baseline = generations.clone();
        self.generations = generations;
        self.clock.reset();
        self.applied_time = 0.0;
        info!(
            generations = self.generations.len(),
            nodes = self.node_count(),
            "history replaced"
        );
    }

    pub fn clear(&mut self) {
        self.replace_history(Vec::new());
    }

    /// Loads a text-format file. On error the current history is kept.
    ///
    /// ### Parameters
    /// - `path` - File written by [`TreeWorkspace::save_text`] or
    ///   [`store::save_generations_to_file`].
    ///
    /// ### Returns
    /// - `Ok(())` if the file was read and installed as the new history.
    /// - `Err(StoreError)` if the file could not be read.
    pub fn open_text(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let generations = store::read_text(path)?;
        self.replace_history(generations);
        Ok(())
    }

    /// Writes the current history in the text format.
    ///
    /// ### Returns
    /// - `Ok(())` if the whole file was written.
    /// - `Err(StoreError)` if the file could not be written.
    pub fn save_text(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        store::write_text(path, &self.generations)
    }

    /// Loads a binary-format file. On error the current history is kept.
    ///
    /// ### Returns
    /// - `Ok(())` if the file was decoded and installed as the new history.
    /// - `Err(StoreError)` if the file is unreadable, truncated or holds an
    ///   unknown node type.
    pub fn open_binary(&mut self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let generations = store::read_binary(path)?;
        self.replace_history(generations);
        Ok(())
    }

    /// Writes the current history in the binary cache format.
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        store::write_binary(path, &self.generations)
    }

    pub fn start(&self) {
        self.clock.start();
    }

    pub fn stop(&self) {
        self.clock.stop();
    }

    pub fn reverse(&self) {
        self.clock.reverse();
    }

    /// Rewinds the clock and restores the history as it was loaded.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.generations = self.baseline.clone();
        self.applied_time = 0.0;
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.clock.elapsed_seconds()
    }

    /// Advances growth to the current clock time.
    ///
    /// Each node changes by the part of the interval between the last tick
    /// and now that lies past its stage (see [`advance_growth`]). The
    /// interval runs backwards while the clock is reversed.
    ///
    /// ### Returns
    /// The number of nodes that changed.
    pub fn tick(&mut self) -> usize {
        self.clock.update();
        let now = self.clock.elapsed_seconds();
        let previous = self.applied_time;
        if now == previous {
            return 0;
        }
        self.applied_time = now;
        advance_growth(&mut self.generations, previous, now, &self.growth)
    }

    pub fn node_count(&self) -> usize {
        sample::node_count(&self.generations)
    }

    fn warn_if_invalid(&self) {
        if let Err(err) = validate_history(&self.generations) {
            warn!(%err, "tree history failed validation, meshing anyway");
        }
    }

    /// Welded mesh of the current history.
    ///
    /// Validation problems are logged but do not stop meshing.
    ///
    /// ### Returns
    /// A compact indexed mesh, empty if there are no nodes.
    pub fn build_mesh(&self) -> MeshData {
        self.warn_if_invalid();
        generate_tree_mesh(&self.generations, &self.mesh).welded()
    }

    /// Sends the current tree to `sink`.
    ///
    /// ### Parameters
    /// - `sink` - Receiver of the welded mesh.
    /// - `name` - Prefix of the entity name (see [`create_tree`]).
    ///
    /// ### Returns
    /// The sink's handle, or `None` if the history is empty.
    pub fn publish<S: SceneSink + ?Sized>(&self, sink: &mut S, name: &str) -> Option<SceneEntity> {
        if self.generations.is_empty() {
            return None;
        }
        self.warn_if_invalid();
        Some(create_tree(sink, name, &self.generations, &self.mesh))
    }
}
