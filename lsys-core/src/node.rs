use std::{fmt, str::FromStr, str::SplitWhitespace};

use glam::{Quat, Vec3};
use tracing::{debug, warn};

use crate::{
    error::NodeParseError,
    types::{NO_PARENT, NodeId},
};

/// Role of a node in the branching structure.
///
/// The declaration order is the on-disk ordinal used by both file formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeType {
    #[default]
    Base,
    Forward,
    Branch,
    Twig,
    Leaf,
    Decal,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Base,
        NodeType::Forward,
        NodeType::Branch,
        NodeType::Twig,
        NodeType::Leaf,
        NodeType::Decal,
    ];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeType::Base => "base",
            NodeType::Forward => "forward",
            NodeType::Branch => "branch",
            NodeType::Twig => "twig",
            NodeType::Leaf => "leaf",
            NodeType::Decal => "decal",
        }
    }
}

/// One segment of a generated branching structure.
///
/// `position` is the bottom of the segment and is authoritative: nothing
/// walks the parent chain to place a node. `rotation` orients the segment's
/// local up axis, along which it extends by `length`.
///
/// Negative ids are reserved for "no parent": a `parent_id` of
/// `Some(n)` with `n < 0` is written as [`NO_PARENT`] and reads back as
/// `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LSystemNode {
    pub kind: NodeType,
    pub node_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub stage: f32,
    pub length: f32,
    pub radius: f32,
    pub angle: f32,
    pub position: Vec3,
    pub rotation: Quat,
}

/// An ordered batch of nodes; insertion order is mesh assembly order.
pub type LSystemGeneration = Vec<LSystemNode>;

impl LSystemNode {
    pub fn new_root(node_id: NodeId, kind: NodeType) -> Self {
        Self {
            kind,
            node_id,
            ..Self::default()
        }
    }

    /// Creates a node linked to `parent`; a negative `parent` means none.
    pub fn new_child(node_id: NodeId, parent: NodeId, kind: NodeType) -> Self {
        Self {
            kind,
            node_id,
            parent_id: (parent >= 0).then_some(parent),
            ..Self::default()
        }
    }

    /// Normalized rotation, or identity when the stored quaternion is
    /// zero-length or not finite.
    pub fn orientation(&self) -> Quat {
        let q = self.rotation;
        if q.is_finite() && q.length_squared() > f32::EPSILON {
            q.normalize()
        } else {
            Quat::IDENTITY
        }
    }

    /// Parent id as stored on disk, [`NO_PARENT`] for none.
    pub fn parent_record(&self) -> NodeId {
        self.parent_id.filter(|&p| p >= 0).unwrap_or(NO_PARENT)
    }

    /// Offset from bottom to top of the segment.
    pub fn axis(&self) -> Vec3 {
        self.orientation() * Vec3::new(0.0, self.length, 0.0)
    }

    /// World position of the top of the segment.
    pub fn top(&self) -> Vec3 {
        self.position + self.axis()
    }

    /// Encodes the node as a single space-separated line.
    ///
    /// Field order: type ordinal, node id, parent id (`-1` for none), stage,
    /// length, radius, angle, position xyz, rotation xyzw.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Decodes a line produced by [`LSystemNode::serialize`].
    ///
    /// Tokens are consumed left to right and decoding stops at the first
    /// missing or unparsable one. Trailing extra tokens are ignored.
    pub fn deserialize(line: &str) -> Result<Self, NodeParseError> {
        if line.trim().is_empty() {
            return Err(NodeParseError::Empty);
        }

        let mut r = RecordReader::new(line);

        let tag: u32 = r.read("type")?;
        r.node.kind = match NodeType::from_ordinal(tag) {
            Some(kind) => kind,
            None => return Err(r.invalid("type", tag.to_string())),
        };
        r.node.node_id = r.read("node_id")?;
        let parent: NodeId = r.read("parent_id")?;
        r.node.parent_id = (parent >= 0).then_some(parent);
        r.node.stage = r.read("stage")?;
        r.node.length = r.read("length")?;
        r.node.radius = r.read("radius")?;
        r.node.angle = r.read("angle")?;

        let px = r.read("position")?;
        let py = r.read("position")?;
        let pz = r.read("position")?;
        r.node.position = Vec3::new(px, py, pz);

        let qx = r.read("rotation")?;
        let qy = r.read("rotation")?;
        let qz = r.read("rotation")?;
        let qw = r.read("rotation")?;
        r.node.rotation = Quat::from_xyzw(qx, qy, qz, qw);

        Ok(r.node)
    }

    /// Like [`LSystemNode::deserialize`], but a malformed record is logged
    /// and the partially decoded node returned instead.
    pub fn deserialize_lossy(line: &str) -> Self {
        match Self::deserialize(line) {
            Ok(node) => {
                debug!(node_id = node.node_id, "deserialized node");
                node
            }
            Err(err) => {
                warn!(%err, line, "malformed node record, keeping partial node");
                err.partial()
            }
        }
    }
}

impl fmt::Display for LSystemNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position;
        let q = self.rotation;
        write!(
            f,
            "{} {} {} {} {} {} {} {} {} {} {} {} {} {}",
            self.kind.ordinal(),
            self.node_id,
            self.parent_record(),
            self.stage,
            self.length,
            self.radius,
            self.angle,
            p.x,
            p.y,
            p.z,
            q.x,
            q.y,
            q.z,
            q.w,
        )
    }
}

impl FromStr for LSystemNode {
    type Err = NodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize(s)
    }
}

/// Sequential token reader that remembers what has been decoded so far.
struct RecordReader<'a> {
    tokens: SplitWhitespace<'a>,
    node: LSystemNode,
}

impl<'a> RecordReader<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace(),
            node: LSystemNode::default(),
        }
    }

    fn read<T: FromStr>(&mut self, field: &'static str) -> Result<T, NodeParseError> {
        let Some(token) = self.tokens.next() else {
            return Err(NodeParseError::MissingField {
                field,
                partial: Box::new(self.node),
            });
        };
        token.parse().map_err(|_| self.invalid(field, token.to_string()))
    }

    fn invalid(&self, field: &'static str, token: String) -> NodeParseError {
        NodeParseError::InvalidField {
            field,
            token,
            partial: Box::new(self.node),
        }
    }
}
