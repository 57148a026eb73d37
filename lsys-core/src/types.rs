/// Identifier for a node in an [`crate::node::LSystemGeneration`].
///
/// Unlike an index into the generation, ids are assigned by whoever
/// produced the nodes and survive (de)serialization. Parents are always
/// referenced by id, so nodes may appear in any order.
pub type NodeId = i32;

/// Parent id written to text and binary records for nodes without a parent.
pub const NO_PARENT: NodeId = -1;
