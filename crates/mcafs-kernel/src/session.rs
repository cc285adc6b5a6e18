//! Per-connection view of the asset filesystem.
//!
//! A [`Session`] is a cursor over the shared, frozen tree. Relative paths
//! resolve against the cursor, absolute ones against the root. The cursor is
//! a node id, so the reported current directory is always the node's real
//! path and never a textual join that could drift from the tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::assets::AssetFs;
use crate::store::ReadStream;
use crate::vfs::{
    FileSystem, NodeId, NodeKind, ReadOptions, Stat, VfsError, VfsResult, WriteOptions,
    WriteStream, path,
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// One client's cursor over an [`AssetFs`].
#[derive(Debug)]
pub struct Session {
    id: u64,
    fs: Arc<AssetFs>,
    cwd: NodeId,
}

impl Session {
    /// Create a session with its cursor at the root.
    pub fn new(fs: Arc<AssetFs>) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(session = id, "session opened");
        Self {
            id,
            fs,
            cwd: NodeId::ROOT,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn assets(&self) -> &Arc<AssetFs> {
        &self.fs
    }

    fn start_of(&self, path: &str) -> NodeId {
        if path::is_absolute(path) {
            NodeId::ROOT
        } else {
            self.cwd
        }
    }

    fn lookup(&self, path: &str) -> VfsResult<NodeId> {
        self.fs
            .tree()
            .resolve(self.start_of(path), path)
            .ok_or_else(|| VfsError::not_found(path))
    }

    /// Returns true if `path` names a node.
    pub fn exists(&self, path: &str) -> bool {
        self.lookup(path).is_ok()
    }

    /// Absolute virtual path `path` resolves to.
    pub fn resolve_path(&self, path: &str) -> VfsResult<String> {
        let id = self.lookup(path)?;
        Ok(self.fs.tree().path_of(id))
    }

    async fn stat_node(&self, id: NodeId) -> Stat {
        let node = self.fs.tree().node(id);
        match node.kind() {
            NodeKind::File(file) => {
                let meta = match self.fs.store().object_metadata(&file.hash).await {
                    Ok(meta) => Some(meta),
                    Err(error) => {
                        tracing::debug!(session = self.id, hash = %file.hash, %error, "object missing for stat");
                        None
                    }
                };
                Stat::file(node.name(), file.size, meta.as_ref())
            }
            NodeKind::Directory(_) => {
                let meta = self.fs.store().root_metadata().await.ok();
                Stat::directory(node.name(), meta.as_ref())
            }
        }
    }

    /// Read up to `size` bytes of a file starting at `offset`.
    ///
    /// Returns fewer bytes if the object ends first.
    pub async fn read_range(&self, path: &str, offset: u64, size: u32) -> VfsResult<Vec<u8>> {
        let mut stream = self.read(path, ReadOptions::from_offset(offset)).await?;
        Ok(stream.read_chunk(size as usize).await?)
    }

    fn reject(&self, op: &str, path: &str) -> VfsError {
        tracing::info!(session = self.id, op, path, "rejected write on read-only filesystem");
        VfsError::ReadOnly
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::debug!(session = self.id, "session closed");
    }
}

#[async_trait]
impl FileSystem for Session {
    fn current_directory(&self) -> String {
        self.fs.tree().path_of(self.cwd)
    }

    async fn chdir(&mut self, path: &str) -> VfsResult<String> {
        let dir = self.fs.tree().resolve_dir(self.start_of(path), path)?;
        self.cwd = dir;
        let cwd = self.current_directory();
        tracing::debug!(session = self.id, cwd = %cwd, "changed directory");
        Ok(cwd)
    }

    async fn get(&self, path: &str) -> VfsResult<Stat> {
        let id = self.lookup(path)?;
        Ok(self.stat_node(id).await)
    }

    async fn list(&self, path: &str) -> VfsResult<Vec<Stat>> {
        let tree = self.fs.tree();
        let children = tree.list_children(self.start_of(path), path)?;
        let mut stats = Vec::with_capacity(children.len());
        for child in children {
            stats.push(self.stat_node(child).await);
        }
        Ok(stats)
    }

    async fn read(&self, path: &str, options: ReadOptions) -> VfsResult<ReadStream> {
        let (id, file) = self.fs.tree().resolve_file(self.start_of(path), path)?;
        let start = options.start.unwrap_or(0);
        tracing::debug!(
            session = self.id,
            path = %self.fs.tree().path_of(id),
            hash = %file.hash,
            start,
            "opening object"
        );
        self.fs.store().open_object(&file.hash, start).await
    }

    async fn write(&self, path: &str, _options: WriteOptions) -> VfsResult<WriteStream> {
        Err(self.reject("write", path))
    }

    async fn mkdir(&self, path: &str) -> VfsResult<String> {
        Err(self.reject("mkdir", path))
    }

    async fn delete(&self, path: &str) -> VfsResult<()> {
        Err(self.reject("delete", path))
    }

    async fn rename(&self, from: &str, _to: &str) -> VfsResult<()> {
        Err(self.reject("rename", from))
    }

    async fn chmod(&self, path: &str, _mode: u32) -> VfsResult<()> {
        Err(self.reject("chmod", path))
    }

    fn unique_name(&self, requested: &str) -> VfsResult<String> {
        Err(self.reject("unique_name", requested))
    }

    fn read_only(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ObjectStore, OBJECTS_DIR};
    use crate::vfs::{VirtualFile, VirtualTree};
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    fn setup() -> (Arc<AssetFs>, TempDir) {
        let dir = TempDir::new().unwrap();
        let shard = dir.path().join(OBJECTS_DIR).join(&HASH[..2]);
        std::fs::create_dir_all(&shard).unwrap();
        std::fs::write(shard.join(HASH), b"0123456789").unwrap();

        let mut tree = VirtualTree::new();
        tree.make_file(NodeId::ROOT, "idx/a/b/c.txt", VirtualFile::new(HASH, 10))
            .unwrap();
        tree.make_file(NodeId::ROOT, "idx/a/lost.txt", VirtualFile::new("ffff", 3))
            .unwrap();
        tree.make_dir(NodeId::ROOT, "idx/empty").unwrap();

        let store = ObjectStore::open(dir.path()).unwrap();
        (Arc::new(AssetFs::from_parts(store, tree)), dir)
    }

    #[tokio::test]
    async fn test_starts_at_root() {
        let (fs, _dir) = setup();
        let session = fs.session();
        assert_eq!(session.current_directory(), "/");
        assert!(session.read_only());
    }

    #[tokio::test]
    async fn test_chdir_relative_and_absolute() {
        let (fs, _dir) = setup();
        let mut session = fs.session();

        assert_eq!(session.chdir("idx").await.unwrap(), "/idx");
        assert_eq!(session.chdir("a/b").await.unwrap(), "/idx/a/b");
        assert_eq!(session.chdir("..").await.unwrap(), "/idx/a");
        assert_eq!(session.chdir("\\idx\\empty\\").await.unwrap(), "/idx/empty");
        assert_eq!(session.chdir("/").await.unwrap(), "/");
    }

    #[tokio::test]
    async fn test_chdir_failure_keeps_cursor() {
        let (fs, _dir) = setup();
        let mut session = fs.session();
        session.chdir("/idx/a").await.unwrap();

        assert!(matches!(
            session.chdir("b/c.txt").await,
            Err(VfsError::NotADirectory(_))
        ));
        assert!(matches!(
            session.chdir("missing").await,
            Err(VfsError::NotFound(_))
        ));
        assert_eq!(session.current_directory(), "/idx/a");

        session.chdir("/").await.unwrap();
        assert!(matches!(session.chdir("..").await, Err(VfsError::NotFound(_))));
        assert_eq!(session.current_directory(), "/");
    }

    #[tokio::test]
    async fn test_sessions_have_independent_cursors() {
        let (fs, _dir) = setup();
        let mut first = fs.session();
        let second = fs.session();
        first.chdir("/idx/a").await.unwrap();
        assert_eq!(second.current_directory(), "/");
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_get_file_uses_declared_size() {
        let (fs, _dir) = setup();
        let session = fs.session();
        let stat = session.get("/idx/a/b/c.txt").await.unwrap();
        assert!(stat.is_file());
        assert_eq!(stat.name, "c.txt");
        assert_eq!(stat.size, 10);
        assert!(stat.present);

        let lost = session.get("/idx/a/lost.txt").await.unwrap();
        assert_eq!(lost.size, 3);
        assert!(!lost.present);
    }

    #[tokio::test]
    async fn test_get_directory_and_missing() {
        let (fs, _dir) = setup();
        let session = fs.session();
        let stat = session.get("/idx/empty").await.unwrap();
        assert!(stat.is_dir());
        assert_eq!(stat.name, "empty");
        assert!(matches!(session.get("/idx/nope").await, Err(VfsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_stamps_child_names() {
        let (fs, _dir) = setup();
        let mut session = fs.session();
        session.chdir("/idx").await.unwrap();

        let stats = session.list("a").await.unwrap();
        let names: Vec<_> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "lost.txt"]);
        assert!(stats[0].is_dir());
        assert!(stats[1].is_file());

        assert!(session.list("empty").await.unwrap().is_empty());
        assert!(matches!(
            session.list("a/lost.txt").await,
            Err(VfsError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_read_from_offset() {
        let (fs, _dir) = setup();
        let session = fs.session();
        let mut stream = session
            .read("/idx/a/b/c.txt", ReadOptions::from_offset(4))
            .await
            .unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"456789");

        assert_eq!(session.read_range("idx/a/b/c.txt", 2, 3).await.unwrap(), b"234");
    }

    #[tokio::test]
    async fn test_read_errors() {
        let (fs, _dir) = setup();
        let session = fs.session();
        assert!(matches!(
            session.read("/idx/a", ReadOptions::default()).await,
            Err(VfsError::NotAFile(_))
        ));
        assert!(matches!(
            session.read("/idx/a/lost.txt", ReadOptions::default()).await,
            Err(VfsError::BackingStoreUnavailable { .. })
        ));
        assert!(matches!(
            session.read("/idx/none", ReadOptions::default()).await,
            Err(VfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_write_family_is_read_only() {
        let (fs, _dir) = setup();
        let session = fs.session();
        assert!(matches!(
            session.write("/idx/new.txt", WriteOptions::default()).await,
            Err(VfsError::ReadOnly)
        ));
        assert!(matches!(session.mkdir("/idx/new").await, Err(VfsError::ReadOnly)));
        assert!(matches!(session.delete("/idx/a/b/c.txt").await, Err(VfsError::ReadOnly)));
        assert!(matches!(
            session.rename("/idx/a", "/idx/z").await,
            Err(VfsError::ReadOnly)
        ));
        assert!(matches!(session.chmod("/idx/a", 0o777).await, Err(VfsError::ReadOnly)));
        assert!(matches!(session.unique_name("upload.bin"), Err(VfsError::ReadOnly)));

        assert!(session.exists("/idx/a/b/c.txt"));
        assert!(!session.exists("/idx/new"));
        assert!(!session.exists("/idx/z"));
    }

    #[tokio::test]
    async fn test_resolve_path() {
        let (fs, _dir) = setup();
        let mut session = fs.session();
        session.chdir("/idx/a/b").await.unwrap();
        assert_eq!(session.resolve_path("../lost.txt").unwrap(), "/idx/a/lost.txt");
        assert_eq!(session.resolve_path(".").unwrap(), "/idx/a/b");
    }
}
