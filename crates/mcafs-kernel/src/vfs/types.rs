//! Core VFS types.
//!
//! These are what the session surface hands back to a protocol server:
//! path-based, no inodes, serializable for logging or wire encoding.

use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::time::SystemTime;

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file backed by a stored object.
    File,
    /// Virtual directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Stat record for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Node name (`/` for the root).
    pub name: String,
    /// Node kind.
    pub kind: FileType,
    /// Size in bytes. For files this is the manifest's declared size.
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last access time (optional).
    pub atime: Option<SystemTime>,
    /// Creation time (optional).
    pub ctime: Option<SystemTime>,
    /// Whether the backing object was found when this record was made.
    /// Always true for directories.
    pub present: bool,
}

impl Stat {
    /// Stat for a file with the given declared size.
    ///
    /// Timestamps come from the object's metadata when it could be read;
    /// otherwise they fall back to the epoch and `present` is false.
    pub fn file(name: impl Into<String>, size: u64, object: Option<&Metadata>) -> Self {
        let mut stat = Self::with_times(name, FileType::File, size, object);
        stat.present = object.is_some();
        stat
    }

    /// Stat for a virtual directory, borrowing times from `borrowed`.
    pub fn directory(name: impl Into<String>, borrowed: Option<&Metadata>) -> Self {
        Self::with_times(name, FileType::Directory, 0, borrowed)
    }

    fn with_times(
        name: impl Into<String>,
        kind: FileType,
        size: u64,
        meta: Option<&Metadata>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            mtime: meta
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH),
            atime: meta.and_then(|m| m.accessed().ok()),
            ctime: meta.and_then(|m| m.created().ok()),
            present: true,
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Options for opening a read stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Byte offset to start reading from.
    pub start: Option<u64>,
}

impl ReadOptions {
    /// Start reading at `offset`.
    pub fn from_offset(offset: u64) -> Self {
        Self {
            start: Some(offset),
        }
    }
}

/// Options a client sends with a write request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Append to an existing file.
    pub append: bool,
    /// Byte offset to write at.
    pub start: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert!(FileType::File.is_file());
        assert!(!FileType::File.is_dir());
        assert!(FileType::Directory.is_dir());
    }

    #[test]
    fn test_file_stat_without_object() {
        let stat = Stat::file("c.txt", 42, None);
        assert!(stat.is_file());
        assert_eq!(stat.size, 42);
        assert!(!stat.present);
        assert_eq!(stat.mtime, SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn test_directory_stat_borrows_times() {
        let dir = tempfile::TempDir::new().unwrap();
        let meta = std::fs::metadata(dir.path()).unwrap();
        let stat = Stat::directory("icons", Some(&meta));
        assert!(stat.is_dir());
        assert!(stat.present);
        assert_eq!(stat.size, 0);
        assert_eq!(stat.mtime, meta.modified().unwrap());
    }

    #[test]
    fn test_read_options() {
        assert_eq!(ReadOptions::default().start, None);
        assert_eq!(ReadOptions::from_offset(7).start, Some(7));
    }
}
