//! In-memory chunk tree

use crate::container::ContainerVersion;
use crate::error::{ChunkyError, Result};
use crate::fs::{ChunkFs, ChunkMetadata, ChunkPath, DirEntry};

/// A file in the tree: raw payload bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataNode {
    /// Payload
    pub bytes: Vec<u8>,
    /// Chunk metadata, if attached
    pub metadata: Option<ChunkMetadata>,
}

/// A directory in the tree: named children in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderNode {
    /// Children, in the order they were added
    pub children: Vec<(String, Node)>,
    /// Chunk metadata, if attached
    pub metadata: Option<ChunkMetadata>,
}

/// Entry of an in-memory tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Leaf holding bytes
    Data(DataNode),
    /// Directory holding other nodes
    Folder(FolderNode),
}

impl Node {
    /// Data node with metadata attached
    pub fn data(metadata: ChunkMetadata, bytes: impl Into<Vec<u8>>) -> Self {
        Node::Data(DataNode {
            bytes: bytes.into(),
            metadata: Some(metadata),
        })
    }

    /// Empty folder node with metadata attached
    pub fn folder(metadata: ChunkMetadata) -> Self {
        Node::Folder(FolderNode {
            children: Vec::new(),
            metadata: Some(metadata),
        })
    }

    /// Metadata of this node
    pub fn metadata(&self) -> Option<&ChunkMetadata> {
        match self {
            Node::Data(data) => data.metadata.as_ref(),
            Node::Folder(folder) => folder.metadata.as_ref(),
        }
    }

    fn metadata_mut(&mut self) -> &mut Option<ChunkMetadata> {
        match self {
            Node::Data(data) => &mut data.metadata,
            Node::Folder(folder) => &mut folder.metadata,
        }
    }

    /// Whether this node is a folder
    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }
}

impl FolderNode {
    /// Empty folder without metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Child by name
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|(child, _)| child == name)
            .map(|(_, node)| node)
    }

    /// Mutable child by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(child, _)| child == name)
            .map(|(_, node)| node)
    }

    /// Append a child; fails if the name is taken
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Result<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ChunkyError::EntryExists(name));
        }
        self.children.push((name, node));
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert) for assembling trees by hand
    ///
    /// A duplicate name replaces the earlier child.
    pub fn with_child(mut self, name: impl Into<String>, node: Node) -> Self {
        let name = name.into();
        self.children.retain(|(child, _)| *child != name);
        self.children.push((name, node));
        self
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the folder has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A chunk tree held entirely in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFs {
    root: FolderNode,
    version: Option<ContainerVersion>,
}

impl MemoryFs {
    /// Empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree with the given root folder
    pub fn from_root(root: FolderNode) -> Self {
        Self {
            root,
            version: None,
        }
    }

    /// The root folder
    pub fn root(&self) -> &FolderNode {
        &self.root
    }

    /// Consume the tree, returning its root folder
    pub fn into_root(self) -> FolderNode {
        self.root
    }

    /// Node at `path`; the root itself is not a [`Node`]
    pub fn node(&self, path: &ChunkPath) -> Option<&Node> {
        let (parent, name) = path.split_last()?;
        self.folder(&parent).ok()?.get(name)
    }

    fn folder(&self, path: &ChunkPath) -> Result<&FolderNode> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = match current.get(segment) {
                Some(Node::Folder(folder)) => folder,
                Some(Node::Data(_)) => return Err(ChunkyError::NotADirectory(path.to_string())),
                None => return Err(ChunkyError::NotFound(path.to_string())),
            };
        }
        Ok(current)
    }

    fn folder_mut(&mut self, path: &ChunkPath) -> Result<&mut FolderNode> {
        let mut current = &mut self.root;
        for segment in path.segments() {
            current = match current.get_mut(segment) {
                Some(Node::Folder(folder)) => folder,
                Some(Node::Data(_)) => return Err(ChunkyError::NotADirectory(path.to_string())),
                None => return Err(ChunkyError::NotFound(path.to_string())),
            };
        }
        Ok(current)
    }

    fn insert(&mut self, path: &ChunkPath, node: Node) -> Result<()> {
        let Some((parent, name)) = path.split_last() else {
            return Err(ChunkyError::EntryExists(path.to_string()));
        };
        self.folder_mut(&parent)?
            .insert(name, node)
            .map_err(|_| ChunkyError::EntryExists(path.to_string()))
    }

    fn metadata_slot(&mut self, path: &ChunkPath) -> Result<&mut Option<ChunkMetadata>> {
        let Some((parent, name)) = path.split_last() else {
            return Ok(&mut self.root.metadata);
        };
        let node = self
            .folder_mut(&parent)?
            .get_mut(name)
            .ok_or_else(|| ChunkyError::NotFound(path.to_string()))?;
        Ok(node.metadata_mut())
    }
}

impl ChunkFs for MemoryFs {
    fn write_file(&mut self, path: &ChunkPath, data: &[u8]) -> Result<()> {
        self.insert(
            path,
            Node::Data(DataNode {
                bytes: data.to_vec(),
                metadata: None,
            }),
        )
    }

    fn read_file(&self, path: &ChunkPath) -> Result<Vec<u8>> {
        match self.node(path) {
            Some(Node::Data(data)) => Ok(data.bytes.clone()),
            Some(Node::Folder(_)) => Err(ChunkyError::NotAFile(path.to_string())),
            None if path.is_root() => Err(ChunkyError::NotAFile(path.to_string())),
            None => Err(ChunkyError::NotFound(path.to_string())),
        }
    }

    fn make_dir(&mut self, path: &ChunkPath) -> Result<()> {
        self.insert(path, Node::Folder(FolderNode::new()))
    }

    fn children(&self, path: &ChunkPath) -> Result<Vec<DirEntry>> {
        Ok(self
            .folder(path)?
            .children
            .iter()
            .map(|(name, node)| DirEntry {
                name: name.clone(),
                is_dir: node.is_folder(),
            })
            .collect())
    }

    fn set_metadata(&mut self, path: &ChunkPath, metadata: &ChunkMetadata) -> Result<()> {
        *self.metadata_slot(path)? = Some(metadata.clone());
        Ok(())
    }

    fn metadata(&self, path: &ChunkPath) -> Result<ChunkMetadata> {
        let metadata = if path.is_root() {
            self.root.metadata.as_ref()
        } else {
            self.node(path)
                .ok_or_else(|| ChunkyError::NotFound(path.to_string()))?
                .metadata()
        };
        metadata
            .cloned()
            .ok_or_else(|| ChunkyError::MissingMetadata(path.to_string()))
    }

    fn set_container_version(&mut self, version: ContainerVersion) -> Result<()> {
        self.version = Some(version);
        Ok(())
    }

    fn container_version(&self) -> Result<Option<ContainerVersion>> {
        Ok(self.version)
    }
}
