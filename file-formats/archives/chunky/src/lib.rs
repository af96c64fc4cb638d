//! # Chunk container reader and writer
//!
//! A chunk container stores a tree of named, typed, versioned binary records
//! ("chunks") in one linear byte stream, in the spirit of RIFF/IFF. Data
//! chunks hold raw bytes, folder chunks hold further chunks. This crate
//! converts between such a stream and a hierarchical tree exposed through
//! the [`ChunkFs`] trait.
//!
//! ## Quick Start
//!
//! ```
//! use std::io::Cursor;
//! use chunky::{read_chunky, write_chunky, ChunkMetadata, ChunkPath, FolderNode, MemoryFs, Node};
//!
//! # fn main() -> Result<(), chunky::ChunkyError> {
//! let icon = ChunkMetadata::new("icon", 1, "TPIC".parse()?);
//! let tree = MemoryFs::from_root(
//!     FolderNode::new().with_child("icon.TPIC", Node::data(icon.clone(), vec![0u8; 10])),
//! );
//!
//! let mut stream = Cursor::new(Vec::new());
//! write_chunky(&mut stream, &tree)?;
//!
//! let unpacked = read_chunky(&mut stream)?;
//! let node = unpacked.node(&ChunkPath::from("icon.TPIC")).unwrap();
//! assert_eq!(node.metadata(), Some(&icon));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`header`]: Chunk header model and byte codec
//! - [`collection`]: Recursive packing and unpacking of chunk sequences
//! - [`container`]: Magic, version record and whole-stream reader/writer
//! - [`discovery`]: Header-only walk for diagnostics
//! - [`fs`]: The tree abstraction and its in-memory and on-disk implementations
//! - [`slug`]: Filesystem-safe names and collision handling
//! - [`error`]: Error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod collection;
pub mod container;
pub mod discovery;
pub mod error;
pub mod fourcc;
pub mod fs;
pub mod header;
pub mod options;
pub mod slug;

pub use collection::CollectionHandler;
pub use container::{ChunkyReader, ChunkyWriter, ContainerVersion, MAGIC, SUPPORTED_VERSION};
pub use discovery::{ChunkDiscovery, ChunkInfo, discover_chunks, discover_chunks_with_options};
pub use error::{ChunkyError, Result};
pub use fourcc::FourCc;
#[cfg(feature = "disk")]
pub use fs::DiskFs;
pub use fs::{
    ChunkFs, ChunkMetadata, ChunkPath, DataNode, DirEntry, FolderNode, METADATA_NAMESPACE,
    MemoryFs, Node,
};
pub use header::{ChunkHeader, ChunkKind};
pub use options::ChunkyOptions;

/// Read a container into a fresh in-memory tree
pub fn read_chunky<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<MemoryFs> {
    let mut tree = MemoryFs::new();
    ChunkyReader::new().read(reader, &mut tree)?;
    Ok(tree)
}

/// Write a tree as a container, returning the number of bytes written
pub fn write_chunky<W, F>(writer: &mut W, fs: &F) -> Result<u64>
where
    W: std::io::Write + std::io::Seek,
    F: ChunkFs + ?Sized,
{
    ChunkyWriter::new().write(writer, fs)
}

/// Check whether a stream holds a well-formed container
///
/// Format problems yield `Ok(false)`; I/O failures are returned as errors.
pub fn validate_chunky<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<bool> {
    validate_chunky_with_options(reader, &ChunkyOptions::default())
}

/// Check a stream against the limits a [`ChunkyReader`] with `options` applies
pub fn validate_chunky_with_options<R: std::io::Read + std::io::Seek>(
    reader: &mut R,
    options: &ChunkyOptions,
) -> Result<bool> {
    match discover_chunks_with_options(reader, options) {
        Ok(_) => Ok(true),
        Err(e) => match e {
            ChunkyError::InvalidMagic { .. }
            | ChunkyError::VersionMismatch { .. }
            | ChunkyError::Corruption { .. }
            | ChunkyError::UnexpectedEof
            | ChunkyError::NameDecode { .. }
            | ChunkyError::InvalidFourCc(_)
            | ChunkyError::InvalidChunkKind(_)
            | ChunkyError::DepthLimitExceeded(_) => Ok(false),
            _ => Err(e),
        },
    }
}
