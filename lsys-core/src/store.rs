//! Whole-history persistence in two independent formats.
//!
//! **Text**: one [`LSystemNode::serialize`] line per node, and a line
//! holding exactly [`GENERATION_MARKER`] after every generation (the last
//! one included). Readable and diffable.
//!
//! **Binary**: per generation a `u64` node count followed by that many
//! fixed-size [`NodeRecord`]s, all in native byte order. It is a local
//! cache format and is not meant to move between machines.
//!
//! The fallible `read_*` / `write_*` functions return [`StoreError`]. The
//! `load_*` / `save_*` wrappers log failures and degrade to an empty
//! history or a `false` return. Files are encoded fully in memory and
//! written with a single call, so an unwritable target leaves nothing behind.

use std::{fs, path::Path};

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};
use tracing::{error, info};

use crate::{
    error::StoreError,
    node::{LSystemGeneration, LSystemNode, NodeType},
};

/// Line that terminates a generation in the text format.
pub const GENERATION_MARKER: &str = "---";

// ============================================================================
// Text format
// ============================================================================

/// Encodes a history in the text format.
///
/// ### Returns
/// The file contents, with every line (markers included) ending in `\n`.
pub fn encode_text(generations: &[LSystemGeneration]) -> String {
    let mut out = String::new();
    for generation in generations {
        for node in generation {
            out.push_str(&node.serialize());
            out.push('\n');
        }
        out.push_str(GENERATION_MARKER);
        out.push('\n');
    }
    out
}

/// Parses the text format.
///
/// Blank lines are skipped, malformed node lines are kept as partial nodes
/// (see [`LSystemNode::deserialize_lossy`]), and nodes after the last
/// marker still form a final generation.
pub fn decode_text(text: &str) -> Vec<LSystemGeneration> {
    let mut generations = Vec::new();
    let mut current = LSystemGeneration::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line == GENERATION_MARKER {
            generations.push(std::mem::take(&mut current));
        } else if !line.trim().is_empty() {
            current.push(LSystemNode::deserialize_lossy(line));
        }
    }
    if !current.is_empty() {
        generations.push(current);
    }
    generations
}

/// Writes `generations` to `path` in the text format with a single write.
pub fn write_text(
    path: impl AsRef<Path>,
    generations: &[LSystemGeneration],
) -> Result<(), StoreError> {
    let path = path.as_ref();
    fs::write(path, encode_text(generations)).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and decodes a text-format file.
///
/// Bytes that are not valid UTF-8 are replaced before decoding, so they
/// only spoil the node line they appear on.
///
/// ### Returns
/// - `Ok(generations)` once the file has been read, however many lines
///   were malformed.
/// - `Err(StoreError::Io)` if the file cannot be read.
pub fn read_text(path: impl AsRef<Path>) -> Result<Vec<LSystemGeneration>, StoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_text(&String::from_utf8_lossy(&bytes)))
}

/// Writes the text format, logging instead of returning errors.
///
/// ### Returns
/// `true` if the file was written.
pub fn save_generations_to_file(
    generations: &[LSystemGeneration],
    path: impl AsRef<Path>,
) -> bool {
    let path = path.as_ref();
    match write_text(path, generations) {
        Ok(()) => {
            info!(path = %path.display(), generations = generations.len(), "saved generations");
            true
        }
        Err(err) => {
            error!(%err, "unable to save generations");
            false
        }
    }
}

/// Reads the text format; any failure yields an empty history.
pub fn load_generations_from_file(path: impl AsRef<Path>) -> Vec<LSystemGeneration> {
    let path = path.as_ref();
    match read_text(path) {
        Ok(generations) => {
            info!(path = %path.display(), generations = generations.len(), "loaded generations");
            generations
        }
        Err(err) => {
            error!(%err, "unable to load generations");
            Vec::new()
        }
    }
}

// ============================================================================
// Binary format
// ============================================================================

/// Fixed-size on-disk node layout (56 bytes, no padding).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct NodeRecord {
    pub kind: u32,
    pub node_id: i32,
    pub parent_id: i32,
    pub stage: f32,
    pub length: f32,
    pub radius: f32,
    pub angle: f32,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

pub const NODE_RECORD_SIZE: usize = std::mem::size_of::<NodeRecord>();
const COUNT_SIZE: usize = std::mem::size_of::<u64>();

impl From<&LSystemNode> for NodeRecord {
    fn from(node: &LSystemNode) -> Self {
        Self {
            kind: node.kind.ordinal(),
            node_id: node.node_id,
            parent_id: node.parent_record(),
            stage: node.stage,
            length: node.length,
            radius: node.radius,
            angle: node.angle,
            position: node.position.to_array(),
            rotation: node.rotation.to_array(),
        }
    }
}

impl TryFrom<NodeRecord> for LSystemNode {
    type Error = StoreError;

    fn try_from(r: NodeRecord) -> Result<Self, Self::Error> {
        let kind = NodeType::from_ordinal(r.kind).ok_or(StoreError::UnknownNodeType(r.kind))?;
        Ok(Self {
            kind,
            node_id: r.node_id,
            parent_id: (r.parent_id >= 0).then_some(r.parent_id),
            stage: r.stage,
            length: r.length,
            radius: r.radius,
            angle: r.angle,
            position: Vec3::from_array(r.position),
            rotation: Quat::from_array(r.rotation),
        })
    }
}

/// Encodes a history in the binary cache format.
///
/// ### Parameters
/// - `generations` - History to encode; empty generations are kept as a
///   zero count.
///
/// ### Returns
/// For each generation a native-endian `u64` count followed by that many
/// [`NodeRecord`]s.
pub fn encode_binary(generations: &[LSystemGeneration]) -> Vec<u8> {
    let nodes: usize = generations.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(generations.len() * COUNT_SIZE + nodes * NODE_RECORD_SIZE);

    for generation in generations {
        out.extend_from_slice(bytemuck::bytes_of(&(generation.len() as u64)));
        for node in generation {
            out.extend_from_slice(bytemuck::bytes_of(&NodeRecord::from(node)));
        }
    }
    out
}

/// Decodes the output of [`encode_binary`].
///
/// ### Parameters
/// - `bytes` - Whole file contents; an empty slice is an empty history.
///
/// ### Returns
/// - `Ok(generations)` if every count and record was complete.
/// - `Err(StoreError::Truncated)` if the data ends inside a count or record.
/// - `Err(StoreError::CountTooLarge)` if a count cannot be addressed.
/// - `Err(StoreError::UnknownNodeType)` if a record holds an invalid kind tag.
pub fn decode_binary(mut bytes: &[u8]) -> Result<Vec<LSystemGeneration>, StoreError> {
    let mut generations = Vec::new();

    while !bytes.is_empty() {
        let generation = generations.len();
        let (count_bytes, rest) = bytes
            .split_at_checked(COUNT_SIZE)
            .ok_or(StoreError::Truncated { generation })?;
        let count: u64 = bytemuck::pod_read_unaligned(count_bytes);

        let needed = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(NODE_RECORD_SIZE))
            .ok_or(StoreError::CountTooLarge { generation, count })?;
        let (records, rest) = rest
            .split_at_checked(needed)
            .ok_or(StoreError::Truncated { generation })?;

        let nodes = records
            .chunks_exact(NODE_RECORD_SIZE)
            .map(|chunk| LSystemNode::try_from(bytemuck::pod_read_unaligned::<NodeRecord>(chunk)))
            .collect::<Result<LSystemGeneration, _>>()?;

        generations.push(nodes);
        bytes = rest;
    }
    Ok(generations)
}

/// Writes `generations` to `path` in the binary format with a single write.
pub fn write_binary(
    path: impl AsRef<Path>,
    generations: &[LSystemGeneration],
) -> Result<(), StoreError> {
    let path = path.as_ref();
    fs::write(path, encode_binary(generations)).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and decodes a binary-format file.
pub fn read_binary(path: impl AsRef<Path>) -> Result<Vec<LSystemGeneration>, StoreError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_binary(&bytes)
}

/// Writes the binary format, logging instead of returning errors.
pub fn save_tree(generations: &[LSystemGeneration], path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match write_binary(path, generations) {
        Ok(()) => {
            info!(path = %path.display(), generations = generations.len(), "saved tree");
            true
        }
        Err(err) => {
            error!(%err, "failed to save tree");
            false
        }
    }
}

/// Reads the binary format; any failure yields an empty history.
pub fn load_tree(path: impl AsRef<Path>) -> Vec<LSystemGeneration> {
    let path = path.as_ref();
    match read_binary(path) {
        Ok(generations) => {
            info!(path = %path.display(), generations = generations.len(), "loaded tree");
            generations
        }
        Err(err) => {
            error!(%err, path = %path.display(), "failed to load tree");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn node(id: i32, parent: Option<i32>, kind: NodeType) -> LSystemNode {
        LSystemNode {
            kind,
            node_id: id,
            parent_id: parent,
            stage: id as f32 * 0.5,
            length: 1.0 + id as f32 * 0.1,
            radius: 0.25,
            angle: 12.5,
            position: Vec3::new(id as f32, 2.0, -1.0),
            rotation: Quat::from_rotation_x(0.1 * id as f32),
        }
    }

    fn history() -> Vec<LSystemGeneration> {
        vec![
            vec![node(0, None, NodeType::Base)],
            vec![
                node(1, Some(0), NodeType::Forward),
                node(2, Some(0), NodeType::Branch),
            ],
            vec![node(3, Some(2), NodeType::Leaf)],
        ]
    }

    #[test]
    fn text_marks_every_generation() {
        let text = encode_text(&[vec![node(0, None, NodeType::Base)], vec![]]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], GENERATION_MARKER);
        assert_eq!(lines[2], GENERATION_MARKER);
    }

    #[test]
    fn text_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.txt");

        assert!(save_generations_to_file(&history(), &path));
        let loaded = load_generations_from_file(&path);

        assert_eq!(loaded, history());
    }

    #[test]
    fn text_keeps_empty_generations() {
        let gens = vec![vec![], vec![node(5, None, NodeType::Twig)], vec![]];
        assert_eq!(decode_text(&encode_text(&gens)), gens);
    }

    #[test]
    fn trailing_generation_without_marker_is_kept() {
        let text = format!(
            "{}\n---\n\n{}\r\n",
            node(0, None, NodeType::Base).serialize(),
            node(1, Some(0), NodeType::Forward).serialize()
        );

        let gens = decode_text(&text);
        assert_eq!(gens.len(), 2);
        assert_eq!(gens[1], vec![node(1, Some(0), NodeType::Forward)]);
    }

    #[test]
    fn malformed_lines_become_partial_nodes() {
        let gens = decode_text("1 42 -1 oops\n---\n");
        assert_eq!(gens.len(), 1);
        assert_eq!(gens[0].len(), 1);
        assert_eq!(gens[0][0].node_id, 42);
        assert_eq!(gens[0][0].stage, 0.0);
    }

    #[test]
    fn empty_text_is_empty_history() {
        assert!(decode_text("").is_empty());
        assert!(decode_text("\n\n").is_empty());
        assert_eq!(encode_text(&[]), "");
    }

    #[test]
    fn missing_text_file_loads_empty() {
        let dir = tempdir().unwrap();
        assert!(load_generations_from_file(dir.path().join("nope.txt")).is_empty());
        assert!(matches!(
            read_text(dir.path().join("nope.txt")),
            Err(StoreError::Io { .. })
        ));
    }

    #[test]
    fn unwritable_target_reports_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("tree.txt");

        assert!(!save_generations_to_file(&history(), &path));
        assert!(!save_tree(&history(), &path));
        assert!(!path.exists());
    }

    #[test]
    fn record_layout_is_fixed() {
        assert_eq!(NODE_RECORD_SIZE, 56);
    }

    #[test]
    fn binary_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.bin");

        assert!(save_tree(&history(), &path));
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 3 * COUNT_SIZE + 4 * NODE_RECORD_SIZE);

        assert_eq!(load_tree(&path), history());
    }

    #[test]
    fn binary_keeps_empty_generations() {
        let gens = vec![vec![], vec![node(1, None, NodeType::Decal)], vec![]];
        assert_eq!(decode_binary(&encode_binary(&gens)).unwrap(), gens);
        assert!(decode_binary(&[]).unwrap().is_empty());
    }

    #[test]
    fn truncated_binary_is_an_error() {
        let bytes = encode_binary(&history());

        let cut = &bytes[..bytes.len() - 10];
        assert!(matches!(
            decode_binary(cut),
            Err(StoreError::Truncated { generation: 2 })
        ));
        assert!(matches!(
            decode_binary(&bytes[..4]),
            Err(StoreError::Truncated { generation: 0 })
        ));
    }

    #[test]
    fn unknown_kind_tag_is_an_error() {
        let mut record = NodeRecord::from(&node(0, None, NodeType::Base));
        record.kind = 99;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(bytemuck::bytes_of(&1u64));
        bytes.extend_from_slice(bytemuck::bytes_of(&record));

        assert!(matches!(
            decode_binary(&bytes),
            Err(StoreError::UnknownNodeType(99))
        ));
    }

    #[test]
    fn corrupt_binary_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        assert!(load_tree(&path).is_empty());
    }

    #[test]
    fn formats_are_not_interchangeable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.txt");
        write_text(&path, &history()).unwrap();

        assert!(read_binary(&path).is_err() || read_binary(&path).unwrap() != history());
    }

    #[test]
    fn invalid_utf8_only_spoils_its_own_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("damaged.txt");

        let mut bytes = node(0, None, NodeType::Base).serialize().into_bytes();
        bytes.extend_from_slice(b"\n\xff\xfe bad\n---\n");
        fs::write(&path, &bytes).unwrap();

        let loaded = load_generations_from_file(&path);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].len(), 2);
        assert_eq!(loaded[0][0], node(0, None, NodeType::Base));
        assert_eq!(loaded[0][1], LSystemNode::default());
    }
}
