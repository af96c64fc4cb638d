//! Hierarchical trees that chunk containers are unpacked into and packed from
//!
//! The codec only talks to a tree through [`ChunkFs`]. Two implementations
//! are provided: [`MemoryFs`], an in-memory tree of [`Node`]s, and (with the
//! `disk` feature) [`DiskFs`], a directory on the local filesystem.

use std::fmt;

use crate::container::ContainerVersion;
use crate::error::Result;
use crate::fourcc::FourCc;

#[cfg(feature = "disk")]
pub mod disk;
pub mod memory;

#[cfg(feature = "disk")]
pub use disk::DiskFs;
pub use memory::{DataNode, FolderNode, MemoryFs, Node};

/// Namespace chunk metadata is stored under, apart from path data
pub const METADATA_NAMESPACE: &str = "chunky";

/// Chunk fields carried by every materialized entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkMetadata {
    /// Original chunk name, before slugging
    pub name: String,
    /// Chunk version
    pub version: u32,
    /// Chunk type tag
    pub fourcc: FourCc,
}

impl ChunkMetadata {
    /// Create metadata for a chunk
    pub fn new(name: impl Into<String>, version: u32, fourcc: FourCc) -> Self {
        Self {
            name: name.into(),
            version,
            fourcc,
        }
    }
}

/// Path of an entry inside a tree, as a list of names below the root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ChunkPath(Vec<String>);

impl ChunkPath {
    /// The root of the tree
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of a child entry
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    /// Whether this is the root
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Names from the root down to this entry
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Split into the parent path and the entry name; `None` for the root
    pub fn split_last(&self) -> Option<(ChunkPath, &str)> {
        let (last, parent) = self.0.split_last()?;
        Some((ChunkPath(parent.to_vec()), last.as_str()))
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for ChunkPath {
    fn from(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )
    }
}

impl fmt::Display for ChunkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

/// One child of a directory as reported by [`ChunkFs::children`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name within its parent
    pub name: String,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// A hierarchical tree the codec can materialize chunks into and read them from
///
/// Implementations must enumerate children in a stable order; packing
/// writes chunks in exactly that order.
pub trait ChunkFs {
    /// Create a new file holding `data`; fails with `EntryExists` if the
    /// path is taken
    fn write_file(&mut self, path: &ChunkPath, data: &[u8]) -> Result<()>;

    /// Read a whole file
    fn read_file(&self, path: &ChunkPath) -> Result<Vec<u8>>;

    /// Create a new directory; fails with `EntryExists` if the path is taken
    fn make_dir(&mut self, path: &ChunkPath) -> Result<()>;

    /// List the direct children of a directory
    fn children(&self, path: &ChunkPath) -> Result<Vec<DirEntry>>;

    /// Attach chunk metadata to an entry
    fn set_metadata(&mut self, path: &ChunkPath, metadata: &ChunkMetadata) -> Result<()>;

    /// Chunk metadata of an entry; `MissingMetadata` if none is attached
    fn metadata(&self, path: &ChunkPath) -> Result<ChunkMetadata>;

    /// Tag the root with the container version it was read from
    fn set_container_version(&mut self, version: ContainerVersion) -> Result<()>;

    /// Container version tagged on the root, if any
    fn container_version(&self) -> Result<Option<ContainerVersion>>;

    /// Persist buffered changes
    ///
    /// Called once a whole container has been unpacked. Trees that apply
    /// every change immediately need not override this.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
