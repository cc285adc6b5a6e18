//! In-memory virtual node tree.
//!
//! Nodes live in an arena owned by [`VirtualTree`]. Directories own their
//! children through an insertion-ordered name map; every node keeps a
//! non-owning [`NodeId`] back to its parent so full paths can be rebuilt by
//! walking upward. The root is the only node without a parent.
//!
//! All mutation takes `&mut self`. Once the tree is shared behind an `Arc`
//! nothing can change it.

use indexmap::IndexMap;

use super::error::{VfsError, VfsResult};
use super::path::{self, SEPARATOR};
use super::types::FileType;

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root directory of every tree.
    pub const ROOT: NodeId = NodeId(0);
}

/// Leaf record: a content hash and its declared size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    pub hash: String,
    pub size: u64,
}

impl VirtualFile {
    pub fn new(hash: impl Into<String>, size: u64) -> Self {
        Self {
            hash: hash.into(),
            size,
        }
    }
}

/// What a node is.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Directory(IndexMap<String, NodeId>),
    File(VirtualFile),
}

/// One node in the arena.
#[derive(Debug, Clone)]
pub struct VirtualNode {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl VirtualNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn file_type(&self) -> FileType {
        match self.kind {
            NodeKind::Directory(_) => FileType::Directory,
            NodeKind::File(_) => FileType::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    /// The file record, if this node is a file.
    pub fn as_file(&self) -> Option<&VirtualFile> {
        match &self.kind {
            NodeKind::File(file) => Some(file),
            NodeKind::Directory(_) => None,
        }
    }

    fn children(&self) -> Option<&IndexMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Directory(children) => Some(children),
            NodeKind::File(_) => None,
        }
    }
}

/// The virtual filesystem tree.
#[derive(Debug, Clone)]
pub struct VirtualTree {
    nodes: Vec<VirtualNode>,
}

impl Default for VirtualTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTree {
    /// Create a tree holding only an empty root directory.
    pub fn new() -> Self {
        Self {
            nodes: vec![VirtualNode {
                name: SEPARATOR.to_string(),
                parent: None,
                kind: NodeKind::Directory(IndexMap::new()),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the root has no children.
    pub fn is_empty(&self) -> bool {
        self.child_count(NodeId::ROOT) == 0
    }

    /// Borrow a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &VirtualNode {
        &self.nodes[id.0]
    }

    /// Absolute path of a node, rebuilt from parent links.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            if node.parent.is_some() {
                names.push(node.name.as_str());
            }
            cursor = node.parent;
        }
        names.reverse();
        format!("{SEPARATOR}{}", names.join("/"))
    }

    /// Look up one segment relative to `dir`, honouring `.` and `..`.
    fn member(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        match name {
            "." => Some(dir),
            ".." => self.node(dir).parent,
            _ => self.node(dir).children()?.get(name).copied(),
        }
    }

    /// Resolve `path` starting at `from`.
    ///
    /// Returns `None` if any segment is missing, if a file is walked through
    /// before the segments run out, or if `..` climbs above the root.
    pub fn resolve(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let mut node = from;
        for name in path::segments(path) {
            if self.node(node).is_file() {
                return None;
            }
            node = self.member(node, name)?;
        }
        Some(node)
    }

    /// Resolve `path` and require a directory.
    pub fn resolve_dir(&self, from: NodeId, path: &str) -> VfsResult<NodeId> {
        let id = self
            .resolve(from, path)
            .ok_or_else(|| VfsError::not_found(path))?;
        if self.node(id).is_dir() {
            Ok(id)
        } else {
            Err(VfsError::not_a_directory(self.path_of(id)))
        }
    }

    /// Resolve `path` and require a file.
    pub fn resolve_file(&self, from: NodeId, path: &str) -> VfsResult<(NodeId, &VirtualFile)> {
        let id = self
            .resolve(from, path)
            .ok_or_else(|| VfsError::not_found(path))?;
        match self.node(id).as_file() {
            Some(file) => Ok((id, file)),
            None => Err(VfsError::not_a_file(self.path_of(id))),
        }
    }

    pub fn has_dir(&self, from: NodeId, path: &str) -> bool {
        self.resolve(from, path)
            .is_some_and(|id| self.node(id).is_dir())
    }

    pub fn has_file(&self, from: NodeId, path: &str) -> bool {
        self.resolve(from, path)
            .is_some_and(|id| self.node(id).is_file())
    }

    /// Immediate children of the directory at `path`, in insertion order.
    pub fn list_children(&self, from: NodeId, path: &str) -> VfsResult<Vec<NodeId>> {
        let dir = self.resolve_dir(from, path)?;
        Ok(self.children_of(dir))
    }

    /// Children of a node already known to be a directory.
    /// Files have no children.
    pub fn children_of(&self, dir: NodeId) -> Vec<NodeId> {
        self.node(dir)
            .children()
            .map(|c| c.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn child_count(&self, dir: NodeId) -> usize {
        self.node(dir).children().map_or(0, IndexMap::len)
    }

    /// Create every missing directory along `path` below `from`.
    ///
    /// Existing directories are descended into. An existing file anywhere
    /// along the way is a [`VfsError::StructuralConflict`].
    pub fn make_dir(&mut self, from: NodeId, path: &str) -> VfsResult<NodeId> {
        self.make_dir_segments(from, &path::segments(path))
    }

    fn make_dir_segments<S: AsRef<str>>(&mut self, from: NodeId, segments: &[S]) -> VfsResult<NodeId> {
        let mut dir = from;
        for name in segments {
            dir = self.make_child_dir(dir, name.as_ref())?;
        }
        Ok(dir)
    }

    fn make_child_dir(&mut self, dir: NodeId, name: &str) -> VfsResult<NodeId> {
        path::validate_name(name)?;
        if let Some(existing) = self.member(dir, name) {
            return match self.node(existing).kind {
                NodeKind::Directory(_) => Ok(existing),
                NodeKind::File(_) => Err(VfsError::conflict(
                    self.path_of(existing),
                    FileType::File,
                    FileType::Directory,
                )),
            };
        }
        Ok(self.insert(dir, name, NodeKind::Directory(IndexMap::new())))
    }

    /// Bind `file` at `path` below `from`, creating parent directories.
    ///
    /// Returns the record previously bound to that path, if it was a file.
    /// A directory already at the path is a [`VfsError::StructuralConflict`]
    /// and leaves the tree unchanged.
    pub fn make_file(
        &mut self,
        from: NodeId,
        path: &str,
        file: VirtualFile,
    ) -> VfsResult<Option<VirtualFile>> {
        let (parent, leaf) =
            path::split_leaf(path).ok_or_else(|| VfsError::invalid_name(path))?;
        path::validate_name(leaf)?;
        for name in &parent {
            path::validate_name(name)?;
        }

        // Check the leaf before materializing parents so a conflict leaves
        // no half-built directories behind.
        let existing_dir = self
            .resolve(from, path)
            .filter(|&id| self.node(id).is_dir());
        if let Some(existing) = existing_dir {
            return Err(VfsError::conflict(
                self.path_of(existing),
                FileType::Directory,
                FileType::File,
            ));
        }

        let dir = self.make_dir_segments(from, &parent)?;

        let Some(existing) = self.member(dir, leaf) else {
            self.insert(dir, leaf, NodeKind::File(file));
            return Ok(None);
        };
        if let NodeKind::File(slot) = &mut self.nodes[existing.0].kind {
            return Ok(Some(std::mem::replace(slot, file)));
        }
        Err(VfsError::conflict(
            self.path_of(existing),
            FileType::Directory,
            FileType::File,
        ))
    }

    fn insert(&mut self, dir: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(VirtualNode {
            name: name.to_string(),
            parent: Some(dir),
            kind,
        });
        if let NodeKind::Directory(children) = &mut self.nodes[dir.0].kind {
            children.insert(name.to_string(), id);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(hash: &str, size: u64) -> VirtualFile {
        VirtualFile::new(hash, size)
    }

    fn sample() -> VirtualTree {
        let mut tree = VirtualTree::new();
        tree.make_file(NodeId::ROOT, "a/b/c.txt", file("deadbeef", 42))
            .unwrap();
        tree.make_file(NodeId::ROOT, "a/d.txt", file("cafebabe", 7))
            .unwrap();
        tree
    }

    #[test]
    fn test_root_path() {
        let tree = VirtualTree::new();
        assert_eq!(tree.path_of(tree.root()), "/");
        assert!(tree.is_empty());
    }

    #[test]
    fn test_inserted_file_path_round_trip() {
        let tree = sample();
        for p in ["a/b/c.txt", "/a/d.txt"] {
            let id = tree.resolve(NodeId::ROOT, p).unwrap();
            assert!(tree.node(id).is_file());
            assert_eq!(tree.path_of(id), format!("/{}", path::normalize(p).unwrap()));
        }
    }

    #[test]
    fn test_normalization_idempotence() {
        let tree = sample();
        let expected = tree.resolve(NodeId::ROOT, "a/b/c.txt");
        assert!(expected.is_some());
        for raw in ["\\a\\b\\c.txt", "//a//b///c.txt/", "a\\/b/\\c.txt", " a / b /c.txt "] {
            assert_eq!(tree.resolve(NodeId::ROOT, raw), expected, "{raw:?}");
            let normal = path::normalize(raw).unwrap();
            assert_eq!(tree.resolve(NodeId::ROOT, raw), tree.resolve(NodeId::ROOT, &normal));
        }

        // Blank segments never match a name, and have no normal form that
        // could resolve somewhere else.
        for raw in ["a/ /b/c.txt", "a/b/\t/c.txt", "a//  //b/c.txt"] {
            assert_eq!(tree.resolve(NodeId::ROOT, raw), None, "{raw:?}");
            assert!(path::normalize(raw).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn test_dot_and_dotdot() {
        let tree = sample();
        let a = tree.resolve(NodeId::ROOT, "a").unwrap();
        let b = tree.resolve(NodeId::ROOT, "a/b").unwrap();
        assert_eq!(tree.resolve(a, "."), Some(a));
        assert_eq!(tree.resolve(b, ".."), Some(a));
        assert_eq!(tree.resolve(b, "../.."), Some(NodeId::ROOT));
        assert_eq!(tree.resolve(NodeId::ROOT, "a/./b/../d.txt"), tree.resolve(a, "d.txt"));
        assert_eq!(tree.resolve(NodeId::ROOT, ".."), None);
        assert_eq!(tree.resolve(b, "../../.."), None);
    }

    #[test]
    fn test_empty_path_is_self() {
        let tree = sample();
        assert_eq!(tree.resolve(NodeId::ROOT, "/"), Some(NodeId::ROOT));
        assert_eq!(tree.resolve(NodeId::ROOT, ""), Some(NodeId::ROOT));
        let a = tree.resolve(NodeId::ROOT, "a").unwrap();
        assert_eq!(tree.resolve(a, "/"), Some(a));
    }

    #[test]
    fn test_walk_through_file_fails() {
        let tree = sample();
        assert_eq!(tree.resolve(NodeId::ROOT, "a/d.txt/x"), None);
        assert_eq!(tree.resolve(NodeId::ROOT, "a/d.txt/."), None);
        assert_eq!(tree.resolve(NodeId::ROOT, "missing"), None);
    }

    #[test]
    fn test_make_dir_descends_existing() {
        let mut tree = sample();
        let before = tree.len();
        let b = tree.make_dir(NodeId::ROOT, "a/b").unwrap();
        assert_eq!(tree.len(), before);
        assert_eq!(tree.path_of(b), "/a/b");

        let deep = tree.make_dir(NodeId::ROOT, "x/y/z").unwrap();
        assert_eq!(tree.path_of(deep), "/x/y/z");
        assert_eq!(tree.child_count(deep), 0);
        assert!(tree.has_dir(NodeId::ROOT, "x/y"));
    }

    #[test]
    fn test_make_dir_through_file_conflicts() {
        let mut tree = sample();
        let err = tree.make_dir(NodeId::ROOT, "a/d.txt/sub").unwrap_err();
        assert!(matches!(
            err,
            VfsError::StructuralConflict {
                existing: FileType::File,
                ..
            }
        ));
        assert!(tree.has_file(NodeId::ROOT, "a/d.txt"));
    }

    #[test]
    fn test_file_over_directory_conflicts_and_preserves_children() {
        let mut tree = sample();
        let b = tree.resolve(NodeId::ROOT, "a/b").unwrap();
        let children_before = tree.children_of(b);

        let err = tree
            .make_file(NodeId::ROOT, "a/b", file("0123", 1))
            .unwrap_err();
        assert!(matches!(
            err,
            VfsError::StructuralConflict {
                existing: FileType::Directory,
                wanted: FileType::File,
                ..
            }
        ));
        assert!(tree.has_dir(NodeId::ROOT, "a/b"));
        assert_eq!(tree.children_of(b), children_before);
    }

    #[test]
    fn test_file_overwrite_returns_previous() {
        let mut tree = sample();
        let a = tree.resolve(NodeId::ROOT, "a").unwrap();
        let count = tree.child_count(a);

        let previous = tree
            .make_file(NodeId::ROOT, "a/d.txt", file("feedface", 9))
            .unwrap();
        assert_eq!(previous, Some(file("cafebabe", 7)));
        assert_eq!(tree.child_count(a), count);

        let (id, current) = tree.resolve_file(NodeId::ROOT, "a/d.txt").unwrap();
        assert_eq!(current, &file("feedface", 9));
        assert_eq!(tree.node(id).name(), "d.txt");
        assert_eq!(tree.node(id).parent(), Some(a));
    }

    #[test]
    fn test_make_file_relative_to_subdirectory() {
        let mut tree = VirtualTree::new();
        let index = tree.make_dir(NodeId::ROOT, "legacy").unwrap();
        tree.make_file(index, "icons/x.png", file("aa11", 3)).unwrap();
        let id = tree.resolve(NodeId::ROOT, "/legacy/icons/x.png").unwrap();
        assert_eq!(tree.path_of(id), "/legacy/icons/x.png");
    }

    #[test]
    fn test_make_file_invalid_names() {
        let mut tree = VirtualTree::new();
        for bad in ["", "/", "a/b:c", "a/../b", "./x", "a/ /b"] {
            let err = tree.make_file(NodeId::ROOT, bad, file("ab", 1)).unwrap_err();
            assert!(matches!(err, VfsError::InvalidName(_)), "{bad:?}: {err}");
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_list_children_order_and_errors() {
        let mut tree = VirtualTree::new();
        for name in ["zeta", "alpha", "mid"] {
            tree.make_file(NodeId::ROOT, &format!("d/{name}"), file("ab", 1))
                .unwrap();
        }
        let names: Vec<_> = tree
            .list_children(NodeId::ROOT, "d")
            .unwrap()
            .into_iter()
            .map(|id| tree.node(id).name().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        assert!(matches!(
            tree.list_children(NodeId::ROOT, "d/zeta"),
            Err(VfsError::NotADirectory(_))
        ));
        assert!(matches!(
            tree.list_children(NodeId::ROOT, "nope"),
            Err(VfsError::NotFound(_))
        ));
    }

    #[test]
    fn test_resolve_file_on_directory() {
        let tree = sample();
        assert!(matches!(
            tree.resolve_file(NodeId::ROOT, "a/b"),
            Err(VfsError::NotAFile(_))
        ));
    }
}
