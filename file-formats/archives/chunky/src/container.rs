//! Whole-stream framing: magic, version record and the root chunk sequence
//!
//! ```text
//! File = Magic (10 bytes) + major: u32 + minor: u32 + Chunk*
//! ```
//!
//! The root sequence has no size field of its own; it runs to the end of
//! the stream.

use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::collection::CollectionHandler;
use crate::error::{ChunkyError, Result};
use crate::fs::{ChunkFs, ChunkPath};
use crate::header::map_eof;
use crate::options::ChunkyOptions;

/// Marker every container starts with
pub const MAGIC: [u8; 10] = *b"CHUNKY\r\n\x1a\0";

/// The only container version this codec reads and writes
pub const SUPPORTED_VERSION: ContainerVersion = ContainerVersion::new(1, 0);

/// Size of magic plus version record
pub const PREAMBLE_SIZE: u64 = MAGIC.len() as u64 + 8;

/// Container format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
}

impl ContainerVersion {
    /// Create a version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ContainerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Check the magic and version record at the current position
///
/// Nothing past the version record is read, so a mismatching version fails
/// before any chunk is looked at.
pub fn read_preamble<R: Read>(reader: &mut R) -> Result<ContainerVersion> {
    let mut magic = [0u8; MAGIC.len()];
    let mut filled = 0;
    while filled < magic.len() {
        match reader.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    if magic[..filled] != MAGIC {
        return Err(ChunkyError::InvalidMagic {
            found: magic[..filled].to_vec(),
        });
    }

    let found = ContainerVersion {
        major: reader.read_u32::<LittleEndian>().map_err(map_eof)?,
        minor: reader.read_u32::<LittleEndian>().map_err(map_eof)?,
    };
    if found != SUPPORTED_VERSION {
        return Err(ChunkyError::VersionMismatch {
            expected: SUPPORTED_VERSION,
            found,
        });
    }
    Ok(found)
}

/// Write the magic and version record
pub fn write_preamble<W: Write>(writer: &mut W) -> Result<u64> {
    writer.write_all(&MAGIC)?;
    writer.write_u32::<LittleEndian>(SUPPORTED_VERSION.major)?;
    writer.write_u32::<LittleEndian>(SUPPORTED_VERSION.minor)?;
    Ok(PREAMBLE_SIZE)
}

/// Reads containers into a [`ChunkFs`]
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use chunky::{ChunkyReader, ChunkyWriter, MemoryFs};
///
/// let mut buffer = Cursor::new(Vec::new());
/// ChunkyWriter::new().write(&mut buffer, &MemoryFs::new())?;
///
/// let mut tree = MemoryFs::new();
/// ChunkyReader::new().read(&mut buffer, &mut tree)?;
/// assert!(tree.root().is_empty());
/// # Ok::<(), chunky::ChunkyError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkyReader {
    options: ChunkyOptions,
}

impl ChunkyReader {
    /// Reader with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader with custom options
    pub fn with_options(options: ChunkyOptions) -> Self {
        Self { options }
    }

    /// Unpack a whole container from the start of `reader` into the root of `fs`
    ///
    /// On error `fs` may hold a partially unpacked tree which should be
    /// discarded.
    pub fn read<R, F>(&self, reader: &mut R, fs: &mut F) -> Result<ContainerVersion>
    where
        R: Read + Seek,
        F: ChunkFs + ?Sized,
    {
        reader.seek(SeekFrom::Start(0))?;
        let version = read_preamble(reader)?;
        fs.set_container_version(version)?;

        let start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        log::debug!(
            "Reading chunk container v{}, chunks span {}..{}",
            version,
            start,
            end
        );

        CollectionHandler::new(self.options).unpack_collection(
            reader,
            fs,
            &ChunkPath::root(),
            start,
            end,
        )?;
        fs.flush()?;
        Ok(version)
    }
}

/// Writes the contents of a [`ChunkFs`] as a container
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkyWriter {
    options: ChunkyOptions,
}

impl ChunkyWriter {
    /// Writer with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer with custom options
    pub fn with_options(options: ChunkyOptions) -> Self {
        Self { options }
    }

    /// Pack the root of `fs` into `writer` at its current position
    ///
    /// Returns the number of bytes written. On error the stream is left in an
    /// unspecified state and must be truncated before reuse.
    pub fn write<W, F>(&self, writer: &mut W, fs: &F) -> Result<u64>
    where
        W: Write + Seek,
        F: ChunkFs + ?Sized,
    {
        let mut written = write_preamble(writer)?;
        written += CollectionHandler::new(self.options).pack_collection(
            writer,
            fs,
            &ChunkPath::root(),
        )?;
        log::debug!("Wrote chunk container, {} bytes", written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_preamble_layout() {
        let mut buf = Vec::new();
        assert_eq!(write_preamble(&mut buf).unwrap(), 18);
        assert_eq!(&buf[..10], b"CHUNKY\r\n\x1a\0");
        assert_eq!(&buf[10..14], &1u32.to_le_bytes());
        assert_eq!(&buf[14..18], &0u32.to_le_bytes());
        assert_eq!(read_preamble(&mut Cursor::new(&buf)).unwrap(), SUPPORTED_VERSION);
    }

    #[test]
    fn test_bad_magic() {
        let err = read_preamble(&mut Cursor::new(b"RIFF\0\0\0\0")).unwrap_err();
        match err {
            ChunkyError::InvalidMagic { found } => assert_eq!(found, b"RIFF\0\0\0\0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_stream_is_not_a_container() {
        let err = read_preamble(&mut Cursor::new(Vec::<u8>::new())).unwrap_err();
        assert!(matches!(err, ChunkyError::InvalidMagic { .. }));
    }

    #[test]
    fn test_version_mismatch() {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&3u32.to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());

        let err = read_preamble(&mut Cursor::new(&buf)).unwrap_err();
        match err {
            ChunkyError::VersionMismatch { expected, found } => {
                assert_eq!(expected, ContainerVersion::new(1, 0));
                assert_eq!(found, ContainerVersion::new(3, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_version_record() {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&1u32.to_le_bytes());
        let err = read_preamble(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, ChunkyError::UnexpectedEof));
    }
}
