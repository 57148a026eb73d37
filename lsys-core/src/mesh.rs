//! Tube-mesh generation for generations of nodes.
//!
//! Each node becomes an open tube: a ring of `segments + 1` vertex pairs
//! (bottom, top) around its axis, stitched into `2 * segments` triangles.
//! The last column of each ring duplicates the first position-wise so the
//! U coordinate can reach 1.0, but the index buffer wraps the last segment
//! back onto column zero. Nodes never share vertices and tubes have no caps.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::{
    config::MeshConfig,
    node::{LSystemGeneration, LSystemNode},
};

/// Parallel vertex streams plus a triangle-list index buffer.
///
/// `positions`, `normals` and `uvs` always have the same length, and
/// every entry of `indices` is smaller than that length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.uvs.clear();
        self.indices.clear();
    }

    /// Checks the stream-length and index-range invariants.
    pub fn is_well_formed(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n
            && self.uvs.len() == n
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < n)
    }

    fn reserve_nodes(&mut self, nodes: usize, segments: u32) {
        let verts = nodes * vertices_per_node(segments);
        self.positions.reserve(verts);
        self.normals.reserve(verts);
        self.uvs.reserve(verts);
        self.indices.reserve(nodes * indices_per_node(segments));
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) {
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
    }
}

/// Vertices emitted per node: a bottom and top vertex for each of the
/// `segments + 1` columns.
pub fn vertices_per_node(segments: u32) -> usize {
    2 * (segments as usize + 1)
}

pub fn indices_per_node(segments: u32) -> usize {
    6 * segments as usize
}

/// Appends one tube per node to `out`.
///
/// Indices are offset by the vertex count already in `out`, so repeated
/// calls build one consistent mesh. Dimensions are used as given; a
/// negative radius turns the tube inside out rather than failing.
///
/// ### Parameters
/// - `nodes` - Segments to mesh, in output order.
/// - `cfg` - Segment count (clamped to
///   [`MeshConfig::MIN_SEGMENTS`]..=[`MeshConfig::MAX_SEGMENTS`]) and taper.
/// - `out` - Mesh to append to; receives [`vertices_per_node`] vertices
///   and [`indices_per_node`] indices per node.
pub fn generate_mesh(nodes: &[LSystemNode], cfg: &MeshConfig, out: &mut MeshData) {
    let segments = cfg.clamped_segments();
    let step = TAU / segments as f32;
    out.reserve_nodes(nodes.len(), segments);

    for node in nodes {
        let base = out.positions.len() as u32;
        let rotation = node.orientation();
        let bottom = node.position;
        let top = bottom + rotation * Vec3::new(0.0, node.length, 0.0);
        let bottom_radius = node.radius;
        let top_radius = node.radius * cfg.taper;

        for i in 0..=segments {
            let theta = step * i as f32;
            let radial = Vec3::new(theta.cos(), 0.0, theta.sin());
            let normal = rotation * radial;
            let u = i as f32 / segments as f32;

            out.push_vertex(
                bottom + rotation * (radial * bottom_radius),
                normal,
                Vec2::new(u, 0.0),
            );
            out.push_vertex(
                top + rotation * (radial * top_radius),
                normal,
                Vec2::new(u, 1.0),
            );
        }

        for i in 0..segments {
            let a = base + i * 2;
            let b = base + ((i + 1) % segments) * 2;
            out.indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }
}

/// Generates the raw (unwelded) mesh for every node of every generation.
///
/// ### Parameters
/// - `generations` - History to mesh, generation by generation.
/// - `cfg` - Mesh settings shared by all nodes.
///
/// ### Returns
/// One mesh holding every tube; call [`MeshData::welded`] to compact it.
pub fn generate_tree_mesh(generations: &[LSystemGeneration], cfg: &MeshConfig) -> MeshData {
    let mut mesh = MeshData::new();
    for generation in generations {
        generate_mesh(generation, cfg, &mut mesh);
    }
    mesh
}
