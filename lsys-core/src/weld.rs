//! Exact vertex welding.
//!
//! Two vertices are merged only when position, normal and UV compare equal
//! component by component. There is no tolerance: vertices that differ by
//! rounding noise stay separate.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use tracing::{debug, warn};

use crate::mesh::MeshData;

/// Result of [`weld_vertices`].
///
/// `positions`, `normals` and `uvs` hold one entry per distinct vertex.
/// `indices` holds one entry per *input* vertex, mapping it to its
/// welded slot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeldedVertices {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

/// Hashable identity of a vertex: the bit patterns of its eight floats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VertexKey([u32; 8]);

impl VertexKey {
    fn new(p: Vec3, n: Vec3, uv: Vec2) -> Self {
        Self([
            float_key(p.x),
            float_key(p.y),
            float_key(p.z),
            float_key(n.x),
            float_key(n.y),
            float_key(n.z),
            float_key(uv.x),
            float_key(uv.y),
        ])
    }
}

/// `-0.0` and `0.0` compare equal, so they must share a key.
fn float_key(v: f32) -> u32 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

/// Deduplicates vertices in a single left-to-right pass.
///
/// The first occurrence of a vertex is appended to the output and later
/// occurrences reuse its slot, so welded order follows first appearance.
/// If the streams differ in length only the common prefix is welded.
///
/// ### Parameters
/// - `positions`, `normals`, `uvs` - Parallel vertex streams.
///
/// ### Returns
/// The distinct vertices plus, for every input vertex, the index of its
/// welded slot.
pub fn weld_vertices(positions: &[Vec3], normals: &[Vec3], uvs: &[Vec2]) -> WeldedVertices {
    let len = positions.len().min(normals.len()).min(uvs.len());
    if len != positions.len() || len != normals.len() || len != uvs.len() {
        warn!(
            positions = positions.len(),
            normals = normals.len(),
            uvs = uvs.len(),
            "vertex streams differ in length, welding the common prefix"
        );
    }

    let mut seen: HashMap<VertexKey, u32> = HashMap::with_capacity(len);
    let mut out = WeldedVertices {
        indices: Vec::with_capacity(len),
        ..WeldedVertices::default()
    };

    for ((&p, &n), &uv) in positions.iter().zip(normals).zip(uvs) {
        let index = *seen.entry(VertexKey::new(p, n, uv)).or_insert_with(|| {
            let slot = out.positions.len() as u32;
            out.positions.push(p);
            out.normals.push(n);
            out.uvs.push(uv);
            slot
        });
        out.indices.push(index);
    }

    debug!(input = len, welded = out.positions.len(), "welded vertices");
    out
}

impl MeshData {
    /// Welds the vertex streams and remaps the triangle indices onto them.
    ///
    /// Triangles that reference vertices outside the streams are dropped.
    ///
    /// ### Returns
    /// A mesh with the same triangles, in the same order, over the
    /// deduplicated vertices.
    pub fn welded(&self) -> MeshData {
        let weld = weld_vertices(&self.positions, &self.normals, &self.uvs);

        let mut indices = Vec::with_capacity(self.indices.len());
        let mut dropped = 0usize;
        for tri in self.indices.chunks_exact(3) {
            let mapped = [
                weld.indices.get(tri[0] as usize),
                weld.indices.get(tri[1] as usize),
                weld.indices.get(tri[2] as usize),
            ];
            match mapped {
                [Some(&a), Some(&b), Some(&c)] => indices.extend_from_slice(&[a, b, c]),
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropped triangles with out-of-range indices");
        }

        MeshData {
            positions: weld.positions,
            normals: weld.normals,
            uvs: weld.uvs,
            indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MeshConfig,
        mesh::generate_tree_mesh,
        node::{LSystemNode, NodeType},
    };

    fn streams(vertices: &[(Vec3, Vec3, Vec2)]) -> (Vec<Vec3>, Vec<Vec3>, Vec<Vec2>) {
        let p = vertices.iter().map(|v| v.0).collect();
        let n = vertices.iter().map(|v| v.1).collect();
        let uv = vertices.iter().map(|v| v.2).collect();
        (p, n, uv)
    }

    #[test]
    fn duplicates_share_a_slot() {
        let a = (Vec3::ZERO, Vec3::Y, Vec2::ZERO);
        let b = (Vec3::X, Vec3::Y, Vec2::ZERO);
        let c = (Vec3::X, Vec3::Y, Vec2::ONE);
        let (p, n, uv) = streams(&[a, b, a, c, b, a]);

        let w = weld_vertices(&p, &n, &uv);

        assert_eq!(w.positions.len(), 3);
        assert_eq!(w.normals.len(), 3);
        assert_eq!(w.uvs.len(), 3);
        assert_eq!(w.indices, vec![0, 1, 0, 2, 1, 0]);
        assert_eq!(w.positions, vec![Vec3::ZERO, Vec3::X, Vec3::X]);
        assert_eq!(w.uvs[2], Vec2::ONE);
    }

    #[test]
    fn any_differing_component_keeps_vertices_apart() {
        let base = (Vec3::ONE, Vec3::Z, Vec2::new(0.5, 0.5));
        let other_normal = (Vec3::ONE, Vec3::X, Vec2::new(0.5, 0.5));
        let other_uv = (Vec3::ONE, Vec3::Z, Vec2::new(0.5, 0.25));
        let (p, n, uv) = streams(&[base, other_normal, other_uv]);

        let w = weld_vertices(&p, &n, &uv);
        assert_eq!(w.positions.len(), 3);
        assert_eq!(w.indices, vec![0, 1, 2]);
    }

    #[test]
    fn near_coincident_vertices_are_not_merged() {
        let a = (Vec3::new(1.0, 0.0, 0.0), Vec3::Y, Vec2::ZERO);
        let b = (Vec3::new(1.0 + f32::EPSILON, 0.0, 0.0), Vec3::Y, Vec2::ZERO);
        let (p, n, uv) = streams(&[a, b]);

        assert_eq!(weld_vertices(&p, &n, &uv).positions.len(), 2);
    }

    #[test]
    fn signed_zeros_merge() {
        let a = (Vec3::new(0.0, 1.0, 0.0), Vec3::Y, Vec2::ZERO);
        let b = (Vec3::new(-0.0, 1.0, 0.0), Vec3::Y, Vec2::new(-0.0, 0.0));
        let (p, n, uv) = streams(&[a, b]);

        let w = weld_vertices(&p, &n, &uv);
        assert_eq!(w.positions.len(), 1);
        assert_eq!(w.indices, vec![0, 0]);
    }

    #[test]
    fn rewelding_is_identity() {
        let a = (Vec3::ZERO, Vec3::Y, Vec2::ZERO);
        let b = (Vec3::X, Vec3::Y, Vec2::X);
        let (p, n, uv) = streams(&[a, b, b, a, b]);

        let first = weld_vertices(&p, &n, &uv);
        let second = weld_vertices(&first.positions, &first.normals, &first.uvs);

        assert_eq!(second.positions, first.positions);
        assert_eq!(second.indices, vec![0, 1]);
    }

    #[test]
    fn mismatched_streams_weld_common_prefix() {
        let p = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let n = vec![Vec3::Y; 2];
        let uv = vec![Vec2::ZERO; 3];

        let w = weld_vertices(&p, &n, &uv);
        assert_eq!(w.indices.len(), 2);
    }

    #[test]
    fn welded_tube_keeps_its_triangles() {
        let mut node = LSystemNode::new_root(0, NodeType::Forward);
        node.length = 1.0;
        node.radius = 0.5;
        // Two identical nodes: the second weld pass finds every vertex again.
        let raw = generate_tree_mesh(&[vec![node, node]], &MeshConfig::default());
        assert_eq!(raw.vertex_count(), 68);

        let welded = raw.welded();

        assert!(welded.is_well_formed());
        assert!(welded.vertex_count() <= 34);
        assert_eq!(welded.indices.len(), raw.indices.len());
        for (&r, &w) in raw.indices.iter().zip(&welded.indices) {
            assert_eq!(raw.positions[r as usize], welded.positions[w as usize]);
            assert_eq!(raw.normals[r as usize], welded.normals[w as usize]);
            assert_eq!(raw.uvs[r as usize], welded.uvs[w as usize]);
        }
    }

    #[test]
    fn welding_drops_out_of_range_triangles() {
        let mesh = MeshData {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            uvs: vec![Vec2::ZERO; 3],
            indices: vec![0, 1, 2, 0, 1, 7],
        };

        assert_eq!(mesh.welded().indices, vec![0, 1, 2]);
    }
}
