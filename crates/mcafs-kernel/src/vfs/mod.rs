//! Virtual filesystem over index manifests.
//!
//! Key components:
//!
//! - [`VirtualTree`] - Arena of directories and files built from manifests
//! - [`path`] - Separator handling and name rules shared by every lookup
//! - [`FileSystem`] - Entry points a file transfer session calls into
//!
//! ## Design Decisions
//!
//! - **Path-based surface**: sessions speak in client paths; node ids never
//!   leave the kernel except through the tree itself.
//! - **Frozen after load**: the tree is only mutable through `&mut`, and is
//!   shared between sessions behind an `Arc`.
//! - **Declared sizes win**: a file's size is the manifest's, not the size
//!   of whatever object currently sits on disk.

mod error;
mod ops;
pub mod path;
mod tree;
mod types;

pub use error::{VfsError, VfsResult};
pub use ops::{FileSystem, WriteStream};
pub use tree::{NodeId, NodeKind, VirtualFile, VirtualNode, VirtualTree};
pub use types::{FileType, ReadOptions, Stat, WriteOptions};
