//! Error types for chunk container operations

use std::io;
use thiserror::Error;

use crate::container::ContainerVersion;

/// Errors that can occur while reading or writing chunk containers
#[derive(Error, Debug)]
pub enum ChunkyError {
    /// I/O error on the stream or the backing filesystem
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended in the middle of a header or payload
    #[error("Unexpected end of file")]
    UnexpectedEof,

    /// The stream does not start with the container magic
    #[error("Not a recognized chunk container: found magic {found:?}")]
    InvalidMagic {
        /// The bytes found where the magic was expected
        found: Vec<u8>,
    },

    /// The container version is not the one this codec implements
    #[error("Unsupported container version: expected {expected}, found {found}")]
    VersionMismatch {
        /// The supported version
        expected: ContainerVersion,
        /// The version stored in the stream
        found: ContainerVersion,
    },

    /// A chunk name on the wire is not valid ASCII
    #[error("Chunk name is not valid ASCII: {bytes:?}")]
    NameDecode {
        /// The raw name bytes
        bytes: Vec<u8>,
    },

    /// A chunk name cannot be encoded
    #[error("Cannot encode chunk name {0:?}")]
    NameEncode(String),

    /// A FourCC tag is not ASCII
    #[error("Invalid FourCC: {0:?}")]
    InvalidFourCc(Vec<u8>),

    /// Unknown chunk kind tag
    #[error("Invalid chunk kind tag: {0:#04x}")]
    InvalidChunkKind(u8),

    /// A chunk's size field does not match its contents
    #[error("Corrupt chunk sequence: expected to end at offset {expected}, stopped at {found}")]
    Corruption {
        /// The declared end offset
        expected: u64,
        /// The offset where decoding actually stopped
        found: u64,
    },

    /// Too many siblings share the same materialized name
    #[error("Could not create {path}: name still taken after {attempts} attempts")]
    CollisionExhausted {
        /// The first candidate path
        path: String,
        /// Number of names tried
        attempts: u32,
    },

    /// Folder nesting is deeper than the configured limit
    #[error("Folder nesting exceeds depth limit of {0}")]
    DepthLimitExceeded(usize),

    /// A payload does not fit the 32-bit size field
    #[error("Chunk {path} is too large: {size} bytes")]
    ChunkTooLarge {
        /// Path of the offending entry
        path: String,
        /// Its byte size
        size: u64,
    },

    /// The entry already exists in the destination tree
    #[error("Entry already exists: {0}")]
    EntryExists(String),

    /// The entry does not exist
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A directory was expected
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// A file was expected
    #[error("Not a file: {0}")]
    NotAFile(String),

    /// No chunk metadata is attached to the entry
    #[error("Missing chunk metadata for {0}")]
    MissingMetadata(String),

    /// Metadata index could not be read or written
    #[cfg(feature = "serde")]
    #[error("Metadata index error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for chunk container operations
pub type Result<T> = std::result::Result<T, ChunkyError>;

impl ChunkyError {
    /// Whether the error signals a name collision in the destination tree
    pub fn is_collision(&self) -> bool {
        matches!(self, ChunkyError::EntryExists(_))
    }
}
