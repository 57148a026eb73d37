//! Structural checks for generations.
//!
//! Mesh generation never calls these; they exist so callers can reject or
//! report bad input (dangling parents, cycles, negative dimensions) before
//! it turns into inside-out or degenerate geometry.

use std::collections::{HashMap, HashSet};

use crate::{
    error::ValidationError,
    node::{LSystemGeneration, LSystemNode},
    types::NodeId,
};

/// Validates a single generation; parents must live in the same generation.
///
/// ### Returns
/// - `Ok(())` if ids are unique, every parent exists, there are no
///   cycles and all dimensions are finite and non-negative.
/// - `Err(ValidationError)` describing the first problem found.
pub fn validate_generation(nodes: &[LSystemNode]) -> Result<(), ValidationError> {
    let mut parents = HashMap::new();
    collect_parents(nodes, &mut parents)?;
    check_links(nodes, &parents)
}

/// Validates a whole history.
///
/// Ids must be unique across the history, and a parent may live in the
/// same generation or any earlier one.
pub fn validate_history(generations: &[LSystemGeneration]) -> Result<(), ValidationError> {
    let mut parents = HashMap::new();
    for generation in generations {
        collect_parents(generation, &mut parents)?;
        check_links(generation, &parents)?;
    }
    Ok(())
}

/// Adds `nodes` to the id → parent map, checking ids and dimensions.
fn collect_parents(
    nodes: &[LSystemNode],
    parents: &mut HashMap<NodeId, Option<NodeId>>,
) -> Result<(), ValidationError> {
    for node in nodes {
        check_dimensions(node)?;
        if parents.insert(node.node_id, node.parent_id).is_some() {
            return Err(ValidationError::DuplicateId(node.node_id));
        }
    }
    Ok(())
}

fn check_dimensions(node: &LSystemNode) -> Result<(), ValidationError> {
    for (field, value) in [("length", node.length), ("radius", node.radius)] {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::BadDimension {
                node: node.node_id,
                field,
                value,
            });
        }
    }
    Ok(())
}

fn check_links(
    nodes: &[LSystemNode],
    parents: &HashMap<NodeId, Option<NodeId>>,
) -> Result<(), ValidationError> {
    let mut acyclic: HashSet<NodeId> = HashSet::new();

    for node in nodes {
        let mut visited = HashSet::new();
        let mut current = node.node_id;
        // Walk up until a root or a node already known to reach one.
        while let Some(parent) = parents.get(&current).copied().flatten() {
            if acyclic.contains(&current) {
                break;
            }
            if !parents.contains_key(&parent) {
                return Err(ValidationError::DanglingParent {
                    node: current,
                    parent,
                });
            }
            if !visited.insert(current) {
                return Err(ValidationError::Cycle(node.node_id));
            }
            current = parent;
        }
        acyclic.extend(visited);
        acyclic.insert(node.node_id);
    }
    Ok(())
}
