//! Shared helpers for building trees and containers in tests

#![allow(dead_code)]

use std::io::Cursor;

use chunky::{
    ChunkMetadata, ChunkyOptions, ChunkyReader, FolderNode, FourCc, MemoryFs, Node, Result,
    write_chunky,
};

/// Byte offset of the size field within a chunk header
pub const SIZE_FIELD_OFFSET: usize = 9;

pub fn fourcc(code: &str) -> FourCc {
    code.parse().expect("valid fourcc")
}

pub fn meta(name: &str, version: u32, code: &str) -> ChunkMetadata {
    ChunkMetadata::new(name, version, fourcc(code))
}

pub fn data(name: &str, code: &str, bytes: &[u8]) -> Node {
    Node::data(meta(name, 1, code), bytes.to_vec())
}

pub fn folder(name: &str, children: Vec<(&str, Node)>) -> Node {
    let mut node = FolderNode::new();
    node.metadata = Some(meta(name, 1, "FOLD"));
    for (child, child_node) in children {
        node = node.with_child(child, child_node);
    }
    Node::Folder(node)
}

pub fn tree(children: Vec<(&str, Node)>) -> MemoryFs {
    let mut root = FolderNode::new();
    for (child, node) in children {
        root = root.with_child(child, node);
    }
    MemoryFs::from_root(root)
}

/// A tree whose entry names already match their materialized names
pub fn sample_tree() -> MemoryFs {
    tree(vec![
        ("icon.TPIC", data("icon", "TPIC", &[0u8; 10])),
        (
            "ui.FOLD",
            folder(
                "ui",
                vec![
                    ("button.DATA", data("button", "DATA", b"click me")),
                    (
                        "deep.FOLD",
                        folder("deep", vec![("leaf.MESH", data("leaf", "MESH", &[7u8; 33]))]),
                    ),
                    ("empty.FOLD", folder("empty", vec![])),
                ],
            ),
        ),
        ("tail.DATA", data("tail", "DATA", b"")),
    ])
}

pub fn pack(tree: &MemoryFs) -> Vec<u8> {
    let mut stream = Cursor::new(Vec::new());
    write_chunky(&mut stream, tree).expect("pack");
    stream.into_inner()
}

pub fn unpack(bytes: &[u8]) -> Result<MemoryFs> {
    unpack_with(bytes, ChunkyOptions::default())
}

pub fn unpack_with(bytes: &[u8], options: ChunkyOptions) -> Result<MemoryFs> {
    let mut tree = MemoryFs::new();
    ChunkyReader::with_options(options).read(&mut Cursor::new(bytes), &mut tree)?;
    Ok(tree)
}

/// Overwrite the size field of the chunk whose header starts at `offset`
pub fn set_size(bytes: &mut [u8], offset: u64, size: u32) {
    let at = offset as usize + SIZE_FIELD_OFFSET;
    bytes[at..at + 4].copy_from_slice(&size.to_le_bytes());
}
