//! In-process stand-in for an engine scene.
//!
//! Receives welded tree meshes through [`SceneSink`] and keeps them so the
//! editor can draw a wireframe and report mesh statistics.

use lsys_core::{
    mesh::MeshData,
    scene::{SceneEntity, SceneSink},
};

pub struct PreviewEntry {
    pub entity: SceneEntity,
    pub name: String,
    pub mesh: MeshData,
}

#[derive(Default)]
pub struct PreviewScene {
    entries: Vec<PreviewEntry>,
    next_entity: u64,
}

impl PreviewScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PreviewEntry] {
        &self.entries
    }

    /// The most recently spawned tree.
    pub fn latest(&self) -> Option<&PreviewEntry> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl SceneSink for PreviewScene {
    /// Replaces any previous tree with the same name.
    fn spawn_tree(&mut self, name: &str, mesh: MeshData) -> SceneEntity {
        self.entries.retain(|e| e.name != name);
        self.next_entity += 1;
        let entity = SceneEntity(self.next_entity);
        self.entries.push(PreviewEntry {
            entity,
            name: name.to_string(),
            mesh,
        });
        entity
    }
}
