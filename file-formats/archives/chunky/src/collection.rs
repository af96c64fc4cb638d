//! Translation between chunk sequences and trees
//!
//! Unpacking walks a byte range of the stream and materializes every chunk
//! into a [`ChunkFs`]. Packing walks a directory of a [`ChunkFs`] and
//! serializes every entry. Folder sizes are only known once their contents
//! have been written, so folder headers are written with a zero size and
//! patched afterwards.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{ChunkyError, Result};
use crate::fs::{ChunkFs, ChunkPath};
use crate::header::{ChunkHeader, ChunkKind, read_bytes};
use crate::options::ChunkyOptions;
use crate::slug::create_unique;

/// Recursive packer/unpacker for chunk sequences
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionHandler {
    options: ChunkyOptions,
}

impl CollectionHandler {
    /// Create a handler with the given options
    pub fn new(options: ChunkyOptions) -> Self {
        Self { options }
    }

    /// Unpack every chunk in `[start, end)` into the directory `parent`
    ///
    /// Decoding must stop exactly at `end`; anything else means a size field
    /// lied and is reported as [`ChunkyError::Corruption`].
    pub fn unpack_collection<R, F>(
        &self,
        reader: &mut R,
        fs: &mut F,
        parent: &ChunkPath,
        start: u64,
        end: u64,
    ) -> Result<()>
    where
        R: Read + Seek,
        F: ChunkFs + ?Sized,
    {
        self.unpack_range(reader, fs, parent, start, end, 0)
    }

    fn unpack_range<R, F>(
        &self,
        reader: &mut R,
        fs: &mut F,
        parent: &ChunkPath,
        start: u64,
        end: u64,
        depth: usize,
    ) -> Result<()>
    where
        R: Read + Seek,
        F: ChunkFs + ?Sized,
    {
        let mut position = reader.seek(SeekFrom::Start(start))?;
        while position < end {
            self.unpack_chunk(reader, fs, parent, end, depth)?;
            position = reader.stream_position()?;
        }

        if position != end {
            return Err(ChunkyError::Corruption {
                expected: end,
                found: position,
            });
        }
        Ok(())
    }

    fn unpack_chunk<R, F>(
        &self,
        reader: &mut R,
        fs: &mut F,
        parent: &ChunkPath,
        end: u64,
        depth: usize,
    ) -> Result<()>
    where
        R: Read + Seek,
        F: ChunkFs + ?Sized,
    {
        let header = ChunkHeader::read(reader)?;
        let body_start = reader.stream_position()?;
        let body_end = body_start + u64::from(header.size);
        if body_end > end {
            return Err(ChunkyError::Corruption {
                expected: end,
                found: body_end,
            });
        }

        log::trace!(
            "{} chunk {:?} ({}, v{}) at {}, {} bytes",
            header.kind,
            header.name,
            header.fourcc,
            header.version,
            body_start,
            header.size
        );

        let metadata = header.metadata();
        match header.kind {
            ChunkKind::Data => {
                let bytes = read_bytes(reader, u64::from(header.size))?;
                let name = create_unique(
                    &header.name,
                    &header.fourcc,
                    self.options.max_suffix,
                    |candidate| fs.write_file(&parent.join(candidate), &bytes),
                )?;
                fs.set_metadata(&parent.join(&name), &metadata)?;
            }
            ChunkKind::Folder => {
                if depth >= self.options.max_depth {
                    return Err(ChunkyError::DepthLimitExceeded(self.options.max_depth));
                }
                let name = create_unique(
                    &header.name,
                    &header.fourcc,
                    self.options.max_suffix,
                    |candidate| fs.make_dir(&parent.join(candidate)),
                )?;
                let path = parent.join(&name);
                fs.set_metadata(&path, &metadata)?;
                self.unpack_range(reader, fs, &path, body_start, body_end, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Pack every child of the directory `dir`, in the order the tree lists
    /// them, returning the number of bytes written
    pub fn pack_collection<W, F>(&self, writer: &mut W, fs: &F, dir: &ChunkPath) -> Result<u64>
    where
        W: Write + Seek,
        F: ChunkFs + ?Sized,
    {
        self.pack_children(writer, fs, dir, 0)
    }

    fn pack_children<W, F>(
        &self,
        writer: &mut W,
        fs: &F,
        dir: &ChunkPath,
        depth: usize,
    ) -> Result<u64>
    where
        W: Write + Seek,
        F: ChunkFs + ?Sized,
    {
        let mut written = 0;
        for entry in fs.children(dir)? {
            let path = dir.join(&entry.name);
            written += if entry.is_dir {
                self.pack_folder(writer, fs, &path, depth)?
            } else {
                self.pack_data(writer, fs, &path)?
            };
        }
        Ok(written)
    }

    fn pack_data<W, F>(&self, writer: &mut W, fs: &F, path: &ChunkPath) -> Result<u64>
    where
        W: Write + Seek,
        F: ChunkFs + ?Sized,
    {
        let metadata = fs.metadata(path)?;
        let bytes = fs.read_file(path)?;
        let size = u32::try_from(bytes.len()).map_err(|_| ChunkyError::ChunkTooLarge {
            path: path.to_string(),
            size: bytes.len() as u64,
        })?;

        let header = ChunkHeader::from_metadata(ChunkKind::Data, &metadata, size);
        let header_len = header.write(writer)?;
        writer.write_all(&bytes)?;

        Ok(header_len + u64::from(size))
    }

    fn pack_folder<W, F>(
        &self,
        writer: &mut W,
        fs: &F,
        path: &ChunkPath,
        depth: usize,
    ) -> Result<u64>
    where
        W: Write + Seek,
        F: ChunkFs + ?Sized,
    {
        if depth >= self.options.max_depth {
            return Err(ChunkyError::DepthLimitExceeded(self.options.max_depth));
        }
        let metadata = fs.metadata(path)?;

        // Size placeholder, patched once the children are written
        let header_pos = writer.stream_position()?;
        let mut header = ChunkHeader::from_metadata(ChunkKind::Folder, &metadata, 0);
        let header_len = header.write(writer)?;

        self.pack_children(writer, fs, path, depth + 1)?;

        let end_pos = writer.stream_position()?;
        let body_size = end_pos - (header_pos + header_len);
        header.size = u32::try_from(body_size).map_err(|_| ChunkyError::ChunkTooLarge {
            path: path.to_string(),
            size: body_size,
        })?;

        writer.seek(SeekFrom::Start(header_pos))?;
        header.write(writer)?;
        writer.seek(SeekFrom::Start(end_pos))?;

        log::trace!("Patched folder {} with size {}", path, body_size);
        Ok(header_len + body_size)
    }
}
