//! Chunk header model and its byte-level codec
//!
//! Every chunk starts with a header of the following layout, all integers
//! little-endian:
//!
//! | Offset | Size | Field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 1    | kind tag (`D` data, `F` folder)        |
//! | 1      | 4    | FourCC                                 |
//! | 5      | 4    | version                                |
//! | 9      | 4    | payload size (header excluded)         |
//! | 13     | 4    | name length                            |
//! | 17     | n    | name, ASCII, trailing NULs are trimmed |

use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ChunkyError, Result};
use crate::fourcc::FourCc;
use crate::fs::ChunkMetadata;

/// Map `UnexpectedEof` from the stream onto the codec's own error
pub(crate) fn map_eof(e: io::Error) -> ChunkyError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ChunkyError::UnexpectedEof
    } else {
        ChunkyError::Io(e)
    }
}

/// Read exactly `len` bytes without trusting `len` for the allocation size
pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(len)
        .read_to_end(&mut buf)
        .map_err(map_eof)?;
    if (buf.len() as u64) < len {
        return Err(ChunkyError::UnexpectedEof);
    }
    Ok(buf)
}

/// Whether a chunk carries raw bytes or nested chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChunkKind {
    /// Leaf chunk with an opaque payload
    Data = b'D',
    /// Chunk whose payload is a nested chunk sequence
    Folder = b'F',
}

impl ChunkKind {
    /// Decode the 1-byte kind tag
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            b'D' => Ok(ChunkKind::Data),
            b'F' => Ok(ChunkKind::Folder),
            other => Err(ChunkyError::InvalidChunkKind(other)),
        }
    }

    /// The 1-byte kind tag
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkKind::Data => f.write_str("DATA"),
            ChunkKind::Folder => f.write_str("FOLDER"),
        }
    }
}

/// Header of a single chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Data or folder
    pub kind: ChunkKind,
    /// Payload type tag
    pub fourcc: FourCc,
    /// Payload format version
    pub version: u32,
    /// Size of the payload in bytes (not including this header)
    pub size: u32,
    /// Chunk name
    pub name: String,
}

impl ChunkHeader {
    /// Size of the fixed part of a header, before the name bytes
    pub const FIXED_SIZE: usize = 1 + FourCc::SIZE + 4 * 3;

    /// Build a header for a chunk described by `metadata`
    pub fn from_metadata(kind: ChunkKind, metadata: &ChunkMetadata, size: u32) -> Self {
        Self {
            kind,
            fourcc: metadata.fourcc,
            version: metadata.version,
            size,
            name: metadata.name.clone(),
        }
    }

    /// The metadata a materialized node carries for this chunk
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            name: self.name.clone(),
            version: self.version,
            fourcc: self.fourcc,
        }
    }

    /// Number of bytes this header occupies on the wire
    pub fn encoded_len(&self) -> u64 {
        (Self::FIXED_SIZE + self.name.len()) as u64
    }

    /// Read a chunk header from a reader
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let kind = ChunkKind::from_tag(reader.read_u8().map_err(map_eof)?)?;

        let mut fourcc = [0u8; 4];
        reader.read_exact(&mut fourcc).map_err(map_eof)?;
        let fourcc = FourCc::from_bytes(fourcc)?;

        let version = reader.read_u32::<LittleEndian>().map_err(map_eof)?;
        let size = reader.read_u32::<LittleEndian>().map_err(map_eof)?;
        let name_len = reader.read_u32::<LittleEndian>().map_err(map_eof)?;

        let raw = read_bytes(reader, u64::from(name_len))?;
        let name = decode_name(raw)?;

        Ok(Self {
            kind,
            fourcc,
            version,
            size,
            name,
        })
    }

    /// Write the header, returning the number of bytes written
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<u64> {
        if !self.name.is_ascii() {
            return Err(ChunkyError::NameEncode(self.name.clone()));
        }
        let name_len = u32::try_from(self.name.len())
            .map_err(|_| ChunkyError::NameEncode(self.name.clone()))?;

        writer.write_u8(self.kind.tag())?;
        writer.write_all(self.fourcc.as_bytes())?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_u32::<LittleEndian>(name_len)?;
        writer.write_all(self.name.as_bytes())?;

        Ok(self.encoded_len())
    }
}

fn decode_name(mut raw: Vec<u8>) -> Result<String> {
    if !raw.is_ascii() {
        return Err(ChunkyError::NameDecode { bytes: raw });
    }
    while raw.last() == Some(&0) {
        raw.pop();
    }
    String::from_utf8(raw).map_err(|e| ChunkyError::NameDecode {
        bytes: e.into_bytes(),
    })
}
