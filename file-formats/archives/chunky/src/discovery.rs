//! Read-only walk over every chunk header of a container

use std::io::{Read, Seek, SeekFrom};

use crate::container::{ContainerVersion, read_preamble};
use crate::error::{ChunkyError, Result};
use crate::header::{ChunkHeader, ChunkKind};
use crate::options::ChunkyOptions;

/// Information about a discovered chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    /// The decoded header
    pub header: ChunkHeader,
    /// Offset in the stream where the header starts
    pub offset: u64,
    /// Offset in the stream where the payload starts
    pub data_offset: u64,
    /// Folder nesting level, 0 for root chunks
    pub depth: usize,
}

impl ChunkInfo {
    /// Offset just past the payload
    pub fn end_offset(&self) -> u64 {
        self.data_offset + u64::from(self.header.size)
    }
}

/// Result of walking a container
#[derive(Debug, Clone)]
pub struct ChunkDiscovery {
    /// Container version
    pub version: ContainerVersion,
    /// Total stream size
    pub file_size: u64,
    /// Every chunk in stream order (depth first)
    pub chunks: Vec<ChunkInfo>,
}

impl ChunkDiscovery {
    /// Get the total number of chunks discovered
    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Folder chunks only
    pub fn folders(&self) -> impl Iterator<Item = &ChunkInfo> {
        self.chunks
            .iter()
            .filter(|c| c.header.kind == ChunkKind::Folder)
    }

    /// Data chunks only
    pub fn data_chunks(&self) -> impl Iterator<Item = &ChunkInfo> {
        self.chunks
            .iter()
            .filter(|c| c.header.kind == ChunkKind::Data)
    }

    /// Deepest nesting level seen, 0 if there are no folders
    pub fn max_depth(&self) -> usize {
        self.chunks.iter().map(|c| c.depth).max().unwrap_or(0)
    }
}

/// Discover all chunks in a container without materializing them
///
/// Applies the same bounds checks as unpacking: a size field that does not
/// match the nested contents is a [`ChunkyError::Corruption`].
pub fn discover_chunks<R: Read + Seek>(reader: &mut R) -> Result<ChunkDiscovery> {
    discover_chunks_with_options(reader, &ChunkyOptions::default())
}

/// Discover all chunks using the depth limit of `options`
///
/// A container is accepted here exactly when [`ChunkyReader`] with the same
/// options would accept it.
///
/// [`ChunkyReader`]: crate::ChunkyReader
pub fn discover_chunks_with_options<R: Read + Seek>(
    reader: &mut R,
    options: &ChunkyOptions,
) -> Result<ChunkDiscovery> {
    reader.seek(SeekFrom::Start(0))?;
    let version = read_preamble(reader)?;
    let start = reader.stream_position()?;
    let file_size = reader.seek(SeekFrom::End(0))?;

    let mut chunks = Vec::new();
    walk(reader, options.max_depth, start, file_size, 0, &mut chunks)?;

    Ok(ChunkDiscovery {
        version,
        file_size,
        chunks,
    })
}

fn walk<R: Read + Seek>(
    reader: &mut R,
    max_depth: usize,
    start: u64,
    end: u64,
    depth: usize,
    chunks: &mut Vec<ChunkInfo>,
) -> Result<()> {
    let mut position = reader.seek(SeekFrom::Start(start))?;
    while position < end {
        let header = ChunkHeader::read(reader)?;
        let data_offset = reader.stream_position()?;
        let info = ChunkInfo {
            header,
            offset: position,
            data_offset,
            depth,
        };
        let chunk_end = info.end_offset();
        if chunk_end > end {
            return Err(ChunkyError::Corruption {
                expected: end,
                found: chunk_end,
            });
        }

        let is_folder = info.header.kind == ChunkKind::Folder;
        chunks.push(info);
        if is_folder {
            if depth >= max_depth {
                return Err(ChunkyError::DepthLimitExceeded(max_depth));
            }
            walk(reader, max_depth, data_offset, chunk_end, depth + 1, chunks)?;
        }
        position = reader.seek(SeekFrom::Start(chunk_end))?;
    }

    if position != end {
        return Err(ChunkyError::Corruption {
            expected: end,
            found: position,
        });
    }
    Ok(())
}
