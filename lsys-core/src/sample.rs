//! Random demo trees.
//!
//! This is not grammar expansion: it simply fans out a fixed number of
//! children per node, each tilted randomly off its parent's axis and placed
//! at the parent's tip. Generation `k` holds the nodes at depth `k`, with
//! parent ids pointing into generation `k - 1`.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use rand::Rng;

use crate::{
    node::{LSystemGeneration, LSystemNode, NodeType},
    types::NodeId,
};

const ROOT_LENGTH: f32 = 2.0;
const ROOT_RADIUS: f32 = 0.3;
const LENGTH_FALLOFF: f32 = 0.7;
const RADIUS_FALLOFF: f32 = 0.6;
/// Seconds of simulated time between the stages of successive depths.
const STAGE_STEP: f32 = 2.0;

fn kind_at_depth(depth: usize) -> NodeType {
    match depth {
        0 => NodeType::Base,
        1 => NodeType::Forward,
        2 => NodeType::Branch,
        3 => NodeType::Twig,
        _ => NodeType::Leaf,
    }
}

/// Builds `generations` layers of a random branching tree.
///
/// ### Parameters
/// - `generations` - Number of layers, including the single root layer.
/// - `children_per_node` - Fan-out of every node.
/// - `rng` - Source of tilt and spin angles.
///
/// ### Returns
/// The history; empty if `generations` is zero.
pub fn random_history(
    generations: usize,
    children_per_node: usize,
    rng: &mut impl Rng,
) -> Vec<LSystemGeneration> {
    if generations == 0 {
        return Vec::new();
    }

    let mut root = LSystemNode::new_root(0, NodeType::Base);
    root.length = ROOT_LENGTH;
    root.radius = ROOT_RADIUS;

    let mut history = vec![vec![root]];
    let mut next_id: NodeId = 1;

    for depth in 1..generations {
        let kind = kind_at_depth(depth);
        let mut layer = LSystemGeneration::new();

        for parent in &history[depth - 1] {
            for _ in 0..children_per_node {
                let tilt = rng.random_range(0.2..0.8_f32);
                let spin = rng.random_range(0.0..TAU);

                let mut child = LSystemNode::new_child(next_id, parent.node_id, kind);
                child.stage = depth as f32 * STAGE_STEP;
                child.length = parent.length * LENGTH_FALLOFF;
                child.radius = parent.radius * RADIUS_FALLOFF;
                child.angle = tilt.to_degrees();
                child.position = parent.top();
                child.rotation =
                    (parent.orientation() * Quat::from_rotation_y(spin) * Quat::from_rotation_z(tilt))
                        .normalize();

                layer.push(child);
                next_id += 1;
            }
        }
        history.push(layer);
    }
    history
}

/// Sum of node counts across `history`.
pub fn node_count(history: &[LSystemGeneration]) -> usize {
    history.iter().map(Vec::len).sum()
}

/// Axis-aligned bounds over the bottom and top of every node, if any.
pub fn bounds(history: &[LSystemGeneration]) -> Option<(Vec3, Vec3)> {
    history
        .iter()
        .flatten()
        .flat_map(|n| [n.position, n.top()])
        .fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_history;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn zero_generations_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_history(0, 3, &mut rng).is_empty());
        assert_eq!(bounds(&[]), None);
    }

    #[test]
    fn layers_fan_out() {
        let mut rng = StdRng::seed_from_u64(7);
        let history = random_history(4, 2, &mut rng);

        let sizes: Vec<_> = history.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 2, 4, 8]);
        assert_eq!(node_count(&history), 15);
        assert_eq!(history[0][0].kind, NodeType::Base);
        assert!(history[3].iter().all(|n| n.kind == NodeType::Twig));
    }

    #[test]
    fn children_start_at_their_parent_tip() {
        let mut rng = StdRng::seed_from_u64(11);
        let history = random_history(3, 3, &mut rng);

        for depth in 1..history.len() {
            for child in &history[depth] {
                let parent = history[depth - 1]
                    .iter()
                    .find(|p| Some(p.node_id) == child.parent_id)
                    .unwrap();
                assert!((child.position - parent.top()).length() < 1e-5);
                assert!(child.length < parent.length);
                assert!(child.stage > parent.stage);
            }
        }
    }

    #[test]
    fn history_is_structurally_valid() {
        let mut rng = StdRng::seed_from_u64(3);
        let history = random_history(5, 2, &mut rng);
        assert_eq!(validate_history(&history), Ok(()));
    }

    #[test]
    fn same_seed_same_tree() {
        let a = random_history(3, 2, &mut StdRng::seed_from_u64(42));
        let b = random_history(3, 2, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn bounds_cover_root_segment() {
        let history = random_history(1, 0, &mut StdRng::seed_from_u64(0));
        let (lo, hi) = bounds(&history).unwrap();
        assert_eq!(lo, Vec3::ZERO);
        assert_eq!(hi, Vec3::new(0.0, ROOT_LENGTH, 0.0));
    }
}
