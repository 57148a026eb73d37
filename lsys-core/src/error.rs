//! Error types shared across the crate.
//!
//! None of these are fatal: callers that want the forgiving behavior use
//! the `*_lossy` / `load_*` / `save_*` wrappers, which log and degrade to an
//! empty or partial result.

use std::path::PathBuf;

use crate::{node::LSystemNode, types::NodeId};

/// Failure to decode one text node record.
///
/// Field-level failures keep the node as populated up to the failing
/// field; everything after it holds its default value.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum NodeParseError {
    #[error("node record is empty")]
    Empty,

    #[error("node record ends before field `{field}`")]
    MissingField {
        field: &'static str,
        partial: Box<LSystemNode>,
    },

    #[error("invalid value {token:?} for field `{field}`")]
    InvalidField {
        field: &'static str,
        token: String,
        partial: Box<LSystemNode>,
    },
}

impl NodeParseError {
    /// The node as far as it could be read.
    pub fn partial(&self) -> LSystemNode {
        match self {
            Self::Empty => LSystemNode::default(),
            Self::MissingField { partial, .. } | Self::InvalidField { partial, .. } => **partial,
        }
    }

    /// Name of the field that failed, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::MissingField { field, .. } | Self::InvalidField { field, .. } => Some(*field),
        }
    }
}

/// Failure to read or write a generation file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("generation {generation} is truncated")]
    Truncated { generation: usize },

    #[error("generation {generation} declares {count} nodes, which cannot be addressed")]
    CountTooLarge { generation: usize, count: u64 },

    #[error("unknown node type tag {0}")]
    UnknownNodeType(u32),
}

/// Structural problem found by [`crate::validate`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("node id {0} appears more than once")]
    DuplicateId(NodeId),

    #[error("node {node} references missing parent {parent}")]
    DanglingParent { node: NodeId, parent: NodeId },

    #[error("node {0} is part of a parent cycle")]
    Cycle(NodeId),

    #[error("node {node} has invalid {field} {value}")]
    BadDimension {
        node: NodeId,
        field: &'static str,
        value: f32,
    },
}
