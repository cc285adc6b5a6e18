//! # mcafs-kernel
//!
//! Browse a content-addressed asset store through ordinary paths.
//!
//! The store keeps object bytes under `objects/<xx>/<hash>` and describes
//! them with manifests in `indexes/`. The kernel:
//! - Loads every manifest into one in-memory tree, one top-level directory
//!   per index
//! - Resolves absolute or cursor-relative paths to directories and files
//! - Maps file hashes to object locations and streams their bytes
//! - Hands each client a [`Session`] that implements the read side of a
//!   file transfer server and rejects every write
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcafs_kernel::{AssetFs, FileSystem, LoadOptions};
//!
//! # async fn demo() -> mcafs_kernel::VfsResult<()> {
//! let fs = Arc::new(AssetFs::load("/home/me/.minecraft/assets", LoadOptions::default())?);
//! let mut session = fs.session();
//! session.chdir("/legacy/minecraft/sounds").await?;
//! for stat in session.list(".").await? {
//!     println!("{} {}", stat.size, stat.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod index;
pub mod session;
pub mod store;
pub mod vfs;

pub use assets::AssetFs;
pub use index::{IndexInfo, IndexLoader, LoadOptions, LoadReport, Manifest};
pub use session::Session;
pub use store::{ObjectStore, ReadStream, default_root};
pub use vfs::{
    FileSystem, FileType, NodeId, ReadOptions, Stat, VfsError, VfsResult, VirtualFile,
    VirtualTree, WriteOptions,
};
