//! Protocol-facing filesystem trait.
//!
//! This is the full set of entry points a session-oriented file transfer
//! server calls into. Paths are strings as the client sent them: absolute
//! when they start with a separator, otherwise relative to the session's
//! current directory.

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use super::types::{ReadOptions, Stat, WriteOptions};
use super::VfsResult;
use crate::store::ReadStream;

/// Writable stream handed out by [`FileSystem::write`].
pub type WriteStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Filesystem operations for one client session.
#[async_trait]
pub trait FileSystem: Send + Sync {
    // ========================================================================
    // Navigation
    // ========================================================================

    /// Absolute path of the current directory.
    fn current_directory(&self) -> String;

    /// Change the current directory, returning its new absolute path.
    ///
    /// On failure the current directory is left as it was.
    async fn chdir(&mut self, path: &str) -> VfsResult<String>;

    // ========================================================================
    // Reading
    // ========================================================================

    /// Stat one file or directory.
    async fn get(&self, path: &str) -> VfsResult<Stat>;

    /// Stat every child of a directory.
    async fn list(&self, path: &str) -> VfsResult<Vec<Stat>>;

    /// Open a file for streaming, optionally from a byte offset.
    async fn read(&self, path: &str, options: ReadOptions) -> VfsResult<ReadStream>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Open a file for writing.
    async fn write(&self, path: &str, options: WriteOptions) -> VfsResult<WriteStream>;

    /// Create a directory, returning its absolute path.
    async fn mkdir(&self, path: &str) -> VfsResult<String>;

    /// Delete a file or directory.
    async fn delete(&self, path: &str) -> VfsResult<()>;

    /// Rename a file or directory.
    async fn rename(&self, from: &str, to: &str) -> VfsResult<()>;

    /// Change permissions.
    async fn chmod(&self, path: &str, mode: u32) -> VfsResult<()>;

    /// Pick a fresh name to write an upload to.
    fn unique_name(&self, requested: &str) -> VfsResult<String>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns true if this filesystem rejects every write.
    fn read_only(&self) -> bool;
}
