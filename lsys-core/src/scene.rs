//! Hand-off of finished tree meshes to a scene.
//!
//! The library does not own a renderer. Anything that can accept a welded
//! mesh under a name (an engine scene, a preview window, a test double)
//! implements [`SceneSink`].

use tracing::info;

use crate::{
    config::MeshConfig,
    mesh::{MeshData, generate_tree_mesh},
    node::LSystemGeneration,
};

/// Opaque handle for something a [`SceneSink`] created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneEntity(pub u64);

pub trait SceneSink {
    /// Takes ownership of a welded, indexed mesh and returns its handle.
    fn spawn_tree(&mut self, name: &str, mesh: MeshData) -> SceneEntity;
}

/// Builds the welded mesh for every generation and hands it to `sink`.
///
/// The entity is named `"<name> tree"`, or just `"tree"` when `name` is empty.
///
/// ### Parameters
/// - `sink` - Receiver that takes ownership of the mesh.
/// - `name` - Prefix for the entity name.
/// - `generations` - History to mesh.
/// - `cfg` - Mesh settings.
///
/// ### Returns
/// The handle the sink assigned to the new entity.
pub fn create_tree<S: SceneSink + ?Sized>(
    sink: &mut S,
    name: &str,
    generations: &[LSystemGeneration],
    cfg: &MeshConfig,
) -> SceneEntity {
    let mesh = generate_tree_mesh(generations, cfg).welded();
    info!(
        "created tree with {} vertices and {} indices",
        mesh.vertex_count(),
        mesh.indices.len()
    );

    let label = if name.is_empty() {
        "tree".to_string()
    } else {
        format!("{name} tree")
    };
    sink.spawn_tree(&label, mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{LSystemNode, NodeType};
    use glam::Vec3;

    #[derive(Default)]
    struct RecordingSink {
        spawned: Vec<(String, MeshData)>,
    }

    impl SceneSink for RecordingSink {
        fn spawn_tree(&mut self, name: &str, mesh: MeshData) -> SceneEntity {
            self.spawned.push((name.to_string(), mesh));
            SceneEntity(self.spawned.len() as u64)
        }
    }

    fn generations() -> Vec<LSystemGeneration> {
        let mut root = LSystemNode::new_root(0, NodeType::Base);
        root.length = 2.0;
        root.radius = 0.4;
        let mut child = LSystemNode::new_child(1, 0, NodeType::Forward);
        child.position = Vec3::new(0.0, 2.0, 0.0);
        child.length = 1.0;
        child.radius = 0.2;
        vec![vec![root], vec![child]]
    }

    #[test]
    fn create_tree_hands_a_welded_mesh_to_the_sink() {
        let mut sink = RecordingSink::default();
        let entity = create_tree(&mut sink, "oak", &generations(), &MeshConfig::default());

        assert_eq!(entity, SceneEntity(1));
        let (name, mesh) = &sink.spawned[0];
        assert_eq!(name, "oak tree");
        assert!(mesh.is_well_formed());
        assert_eq!(mesh.indices.len(), 2 * 96);
        assert!(mesh.vertex_count() <= 2 * 34);
    }

    #[test]
    fn unnamed_tree_and_empty_history() {
        let mut sink = RecordingSink::default();
        create_tree(&mut sink, "", &[], &MeshConfig::default());

        let (name, mesh) = &sink.spawned[0];
        assert_eq!(name, "tree");
        assert!(mesh.is_empty());
        assert!(mesh.indices.is_empty());
    }
}
