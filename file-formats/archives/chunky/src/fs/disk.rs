//! Chunk trees stored as a directory on the local filesystem
//!
//! Data chunks become files and folder chunks become directories. Chunk
//! metadata cannot live in the file contents, so every directory carries an
//! index file, [`INDEX_FILE`], holding the metadata of its children and the
//! order they were created in. The index of the root directory also records
//! the container version.
//!
//! Index changes are kept in memory and written out by [`ChunkFs::flush`],
//! which [`ChunkyReader`](crate::ChunkyReader) calls once a container has been
//! unpacked. Pending changes are also flushed when the [`DiskFs`] is dropped.
//!
//! Files and directories created by other means have no index entry. They
//! are still listed by [`ChunkFs::children`], after the indexed entries, but
//! have no chunk metadata, so packing a tree that contains them fails with
//! [`ChunkyError::MissingMetadata`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::container::ContainerVersion;
use crate::error::{ChunkyError, Result};
use crate::fs::{ChunkFs, ChunkMetadata, ChunkPath, DirEntry, METADATA_NAMESPACE};

/// Name of the per-directory metadata index
pub const INDEX_FILE: &str = ".chunky-meta.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DirIndex {
    #[serde(default)]
    namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    container_version: Option<ContainerVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<ChunkMetadata>,
    #[serde(default)]
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<ChunkMetadata>,
}

impl DirIndex {
    fn entry_mut(&mut self, file: &str) -> &mut IndexEntry {
        let position = match self.entries.iter().position(|e| e.file == file) {
            Some(position) => position,
            None => {
                self.entries.push(IndexEntry {
                    file: file.to_string(),
                    metadata: None,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[position]
    }
}

fn read_index(dir: &Path) -> Result<DirIndex> {
    match fs::read(dir.join(INDEX_FILE)) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DirIndex::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_index(dir: &Path, index: &mut DirIndex) -> Result<()> {
    index.namespace = METADATA_NAMESPACE.to_string();
    let bytes = serde_json::to_vec_pretty(index)?;
    fs::write(dir.join(INDEX_FILE), bytes)?;
    Ok(())
}

/// A chunk tree rooted at a directory
#[derive(Debug)]
pub struct DiskFs {
    root: PathBuf,
    /// Indexes changed since the last flush, keyed by directory
    pending: HashMap<PathBuf, DirIndex>,
}

impl DiskFs {
    /// Use an existing directory as the tree root
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ChunkyError::NotADirectory(root.display().to_string()));
        }
        Ok(Self {
            root,
            pending: HashMap::new(),
        })
    }

    /// Create the root directory (and its parents) if needed
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        Self::open(root)
    }

    /// Root directory of the tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &ChunkPath) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        for segment in path.segments() {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment == INDEX_FILE
                || segment.contains(['/', '\\'])
            {
                return Err(ChunkyError::NotFound(path.to_string()));
            }
            resolved.push(segment);
        }
        Ok(resolved)
    }

    /// Current index of `dir`, pending changes included
    fn load_index(&self, dir: &Path) -> Result<Cow<'_, DirIndex>> {
        match self.pending.get(dir) {
            Some(index) => Ok(Cow::Borrowed(index)),
            None => Ok(Cow::Owned(read_index(dir)?)),
        }
    }

    fn index_mut(&mut self, dir: PathBuf) -> Result<&mut DirIndex> {
        match self.pending.entry(dir) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let index = read_index(entry.key())?;
                Ok(entry.insert(index))
            }
        }
    }

    /// Record a freshly created entry so it keeps its position among siblings
    fn register(&mut self, path: &ChunkPath) -> Result<()> {
        if let Some((parent, name)) = path.split_last() {
            let dir = self.resolve(&parent)?;
            self.index_mut(dir)?.entry_mut(name);
        }
        Ok(())
    }
}

impl Drop for DiskFs {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("Failed to write chunk index under {}: {}", self.root.display(), e);
        }
    }
}

fn map_io(e: io::Error, path: &ChunkPath) -> ChunkyError {
    match e.kind() {
        io::ErrorKind::NotFound => ChunkyError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => ChunkyError::EntryExists(path.to_string()),
        _ => ChunkyError::Io(e),
    }
}

impl ChunkFs for DiskFs {
    fn write_file(&mut self, path: &ChunkPath, data: &[u8]) -> Result<()> {
        if path.is_root() {
            return Err(ChunkyError::EntryExists(path.to_string()));
        }
        let target = self.resolve(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|e| map_io(e, path))?;
        file.write_all(data)?;
        self.register(path)
    }

    fn read_file(&self, path: &ChunkPath) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(ChunkyError::NotAFile(path.to_string()));
        }
        fs::read(&target).map_err(|e| map_io(e, path))
    }

    fn make_dir(&mut self, path: &ChunkPath) -> Result<()> {
        if path.is_root() {
            return Err(ChunkyError::EntryExists(path.to_string()));
        }
        let target = self.resolve(path)?;
        fs::create_dir(&target).map_err(|e| map_io(e, path))?;
        self.register(path)
    }

    fn children(&self, path: &ChunkPath) -> Result<Vec<DirEntry>> {
        let dir = self.resolve(path)?;
        if !dir.exists() {
            return Err(ChunkyError::NotFound(path.to_string()));
        }
        if !dir.is_dir() {
            return Err(ChunkyError::NotADirectory(path.to_string()));
        }

        let index = self.load_index(&dir)?;
        let mut listed = Vec::new();
        for entry in &index.entries {
            let child = dir.join(&entry.file);
            if child.exists() {
                listed.push(DirEntry {
                    name: entry.file.clone(),
                    is_dir: child.is_dir(),
                });
            }
        }

        let mut unindexed = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                log::warn!("Skipping non UTF-8 entry {:?}", entry.path());
                continue;
            };
            if name == INDEX_FILE || index.entries.iter().any(|e| e.file == name) {
                continue;
            }
            unindexed.push(DirEntry {
                name,
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        unindexed.sort_by(|a, b| a.name.cmp(&b.name));
        listed.extend(unindexed);

        Ok(listed)
    }

    fn set_metadata(&mut self, path: &ChunkPath, metadata: &ChunkMetadata) -> Result<()> {
        let target = self.resolve(path)?;
        if !target.exists() {
            return Err(ChunkyError::NotFound(path.to_string()));
        }
        match path.split_last() {
            Some((parent, name)) => {
                let dir = self.resolve(&parent)?;
                self.index_mut(dir)?.entry_mut(name).metadata = Some(metadata.clone());
            }
            None => {
                let root = self.root.clone();
                self.index_mut(root)?.metadata = Some(metadata.clone());
            }
        }
        Ok(())
    }

    fn metadata(&self, path: &ChunkPath) -> Result<ChunkMetadata> {
        let target = self.resolve(path)?;
        if !target.exists() {
            return Err(ChunkyError::NotFound(path.to_string()));
        }
        let metadata = match path.split_last() {
            Some((parent, name)) => self
                .load_index(&self.resolve(&parent)?)?
                .entries
                .iter()
                .find(|e| e.file == name)
                .and_then(|e| e.metadata.clone()),
            None => self.load_index(&self.root)?.metadata.clone(),
        };
        metadata.ok_or_else(|| ChunkyError::MissingMetadata(path.to_string()))
    }

    fn set_container_version(&mut self, version: ContainerVersion) -> Result<()> {
        let root = self.root.clone();
        self.index_mut(root)?.container_version = Some(version);
        Ok(())
    }

    fn container_version(&self) -> Result<Option<ContainerVersion>> {
        Ok(self.load_index(&self.root)?.container_version)
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        for (dir, index) in &mut self.pending {
            write_index(dir, index)?;
        }
        log::debug!("Flushed {} chunk indexes", self.pending.len());
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn meta(name: &str) -> ChunkMetadata {
        ChunkMetadata::new(name, 2, "TPIC".parse().unwrap())
    }

    #[test]
    fn test_files_and_metadata_round_trip() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFs::open(temp.path()).unwrap();

        let dir = ChunkPath::from("ui.FOLD");
        fs.make_dir(&dir).unwrap();
        fs.set_metadata(&dir, &meta("ui")).unwrap();
        fs.write_file(&dir.join("icon.TPIC"), &[0u8; 10]).unwrap();
        fs.set_metadata(&dir.join("icon.TPIC"), &meta("icon")).unwrap();

        assert_eq!(fs.read_file(&dir.join("icon.TPIC")).unwrap(), vec![0u8; 10]);
        assert_eq!(fs.metadata(&dir).unwrap(), meta("ui"));
        assert_eq!(fs.metadata(&dir.join("icon.TPIC")).unwrap(), meta("icon"));
        assert!(temp.path().join("ui.FOLD").join("icon.TPIC").is_file());
    }

    #[test]
    fn test_children_follow_creation_order() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFs::open(temp.path()).unwrap();

        for name in ["zeta.DATA", "alpha.DATA", "mid.DATA"] {
            fs.write_file(&ChunkPath::root().join(name), b"x").unwrap();
        }
        fs.make_dir(&ChunkPath::root().join("sub.FOLD")).unwrap();

        let listed = fs.children(&ChunkPath::root()).unwrap();
        let names: Vec<_> = listed.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["zeta.DATA", "alpha.DATA", "mid.DATA", "sub.FOLD"]);
        assert!(listed[3].is_dir);
    }

    #[test]
    fn test_unindexed_entries_are_listed_last_sorted() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFs::open(temp.path()).unwrap();
        fs.write_file(&"z.DATA".into(), b"").unwrap();
        std::fs::write(temp.path().join("b.DATA"), b"").unwrap();
        std::fs::write(temp.path().join("a.DATA"), b"").unwrap();

        let names: Vec<_> = fs
            .children(&ChunkPath::root())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["z.DATA", "a.DATA", "b.DATA"]);
    }

    #[test]
    fn test_existing_entries_collide() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFs::open(temp.path()).unwrap();
        fs.make_dir(&"a.FOLD".into()).unwrap();
        assert!(fs.make_dir(&"a.FOLD".into()).unwrap_err().is_collision());
        assert!(fs.write_file(&"a.FOLD".into(), b"").unwrap_err().is_collision());
    }

    #[test]
    fn test_container_version_is_stored_in_root_index() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFs::open(temp.path()).unwrap();
        assert_eq!(fs.container_version().unwrap(), None);

        fs.set_container_version(ContainerVersion::new(1, 0)).unwrap();
        fs.flush().unwrap();
        let reopened = DiskFs::open(temp.path()).unwrap();
        assert_eq!(
            reopened.container_version().unwrap(),
            Some(ContainerVersion::new(1, 0))
        );
    }

    #[test]
    fn test_index_is_written_once_on_flush() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFs::open(temp.path()).unwrap();
        let index_path = temp.path().join(INDEX_FILE);

        for name in ["b.TPIC", "a.TPIC", "c.TPIC"] {
            let path = ChunkPath::root().join(name);
            fs.write_file(&path, b"").unwrap();
            fs.set_metadata(&path, &meta(name)).unwrap();
        }
        assert!(!index_path.exists());

        // Pending changes are visible before they reach the disk
        let names: Vec<_> = fs
            .children(&ChunkPath::root())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["b.TPIC", "a.TPIC", "c.TPIC"]);
        assert_eq!(fs.metadata(&"a.TPIC".into()).unwrap(), meta("a.TPIC"));

        fs.flush().unwrap();
        assert!(index_path.is_file());

        let reopened = DiskFs::open(temp.path()).unwrap();
        assert_eq!(reopened.metadata(&"c.TPIC".into()).unwrap(), meta("c.TPIC"));
        assert_eq!(reopened.children(&ChunkPath::root()).unwrap().len(), 3);
    }

    #[test]
    fn test_drop_flushes_pending_indexes() {
        let temp = TempDir::new().unwrap();
        {
            let mut fs = DiskFs::open(temp.path()).unwrap();
            fs.make_dir(&"ui.FOLD".into()).unwrap();
            fs.set_metadata(&"ui.FOLD".into(), &meta("ui")).unwrap();
        }

        let reopened = DiskFs::open(temp.path()).unwrap();
        assert_eq!(reopened.metadata(&"ui.FOLD".into()).unwrap(), meta("ui"));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let temp = TempDir::new().unwrap();
        let mut fs = DiskFs::open(temp.path()).unwrap();
        assert!(fs.write_file(&ChunkPath::root().join(".."), b"").is_err());
        assert!(fs.write_file(&ChunkPath::root().join(INDEX_FILE), b"").is_err());
    }
}
