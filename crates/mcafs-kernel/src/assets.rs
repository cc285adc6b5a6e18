//! The loaded, shared asset filesystem.

use std::path::PathBuf;
use std::sync::Arc;

use crate::index::{IndexInfo, IndexLoader, LoadOptions, ManifestFailure};
use crate::session::Session;
use crate::store::ObjectStore;
use crate::vfs::VirtualTree;

/// An object store plus the virtual tree built from its manifests.
///
/// Built once, then shared read-only by every session as `Arc<AssetFs>`.
#[derive(Debug)]
pub struct AssetFs {
    store: ObjectStore,
    tree: VirtualTree,
    indexes: Vec<IndexInfo>,
    failures: Vec<ManifestFailure>,
}

impl AssetFs {
    /// Open the store at `root` and load all of its manifests.
    ///
    /// Fails only if the root is unusable; broken manifests are recorded in
    /// [`AssetFs::failures`].
    pub fn load(root: impl Into<PathBuf>, options: LoadOptions) -> crate::VfsResult<Self> {
        let store = ObjectStore::open(root)?;
        let mut tree = VirtualTree::new();
        let report = IndexLoader::new(options).load_store(&store, &mut tree);
        Ok(Self {
            store,
            tree,
            indexes: report.loaded,
            failures: report.failed,
        })
    }

    /// Wrap a tree that was built some other way.
    pub fn from_parts(store: ObjectStore, tree: VirtualTree) -> Self {
        Self {
            store,
            tree,
            indexes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn tree(&self) -> &VirtualTree {
        &self.tree
    }

    /// Indexes that made it into the tree, in load order.
    pub fn indexes(&self) -> &[IndexInfo] {
        &self.indexes
    }

    /// Manifests that failed to load.
    pub fn failures(&self) -> &[ManifestFailure] {
        &self.failures
    }

    /// Start a session with its cursor at the root.
    pub fn session(self: &Arc<Self>) -> Session {
        Session::new(Arc::clone(self))
    }
}
