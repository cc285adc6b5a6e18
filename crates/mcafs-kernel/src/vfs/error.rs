//! VFS error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::types::FileType;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Path does not resolve to any node.
    #[error("not found: {0}")]
    NotFound(String),

    /// Expected a directory, found a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file, found a directory.
    #[error("not a file: {0}")]
    NotAFile(String),

    /// A name is already bound to the other node kind.
    #[error("cannot create {wanted:?} at {path}: a {existing:?} already exists")]
    StructuralConflict {
        path: String,
        existing: FileType,
        wanted: FileType,
    },

    /// Path segment violates the naming rules.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// Content hash is not a well-formed hex digest.
    #[error("invalid content hash: {0:?}")]
    InvalidHash(String),

    /// Filesystem is read-only.
    #[error("filesystem is read-only")]
    ReadOnly,

    /// The object a hash maps to could not be opened.
    #[error("object {hash} unavailable at {}: {source}", path.display())]
    BackingStoreUnavailable {
        hash: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A manifest could not be read or parsed.
    #[error("failed to load index {index}: {reason}")]
    ManifestParse { index: String, reason: String },

    /// The object store root is missing or not a directory.
    #[error("asset store unavailable: {}", .0.display())]
    StoreUnavailable(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: impl Into<String>) -> Self {
        Self::NotAFile(path.into())
    }

    /// Create a StructuralConflict error.
    pub fn conflict(path: impl Into<String>, existing: FileType, wanted: FileType) -> Self {
        Self::StructuralConflict {
            path: path.into(),
            existing,
            wanted,
        }
    }

    /// Create an InvalidName error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Create a ManifestParse error.
    pub fn manifest(index: impl Into<String>, reason: impl ToString) -> Self {
        Self::ManifestParse {
            index: index.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns true for structural conflicts, which the loader skips.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StructuralConflict { .. })
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::NotAFile(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            e @ VfsError::StructuralConflict { .. } => {
                io::Error::new(io::ErrorKind::AlreadyExists, e.to_string())
            }
            VfsError::InvalidName(msg) | VfsError::InvalidHash(msg) => {
                io::Error::new(io::ErrorKind::InvalidInput, msg)
            }
            VfsError::ReadOnly => {
                io::Error::new(io::ErrorKind::ReadOnlyFilesystem, "filesystem is read-only")
            }
            VfsError::BackingStoreUnavailable { source, .. } => source,
            e @ VfsError::ManifestParse { .. } => {
                io::Error::new(io::ErrorKind::InvalidData, e.to_string())
            }
            e @ VfsError::StoreUnavailable(_) => {
                io::Error::new(io::ErrorKind::NotFound, e.to_string())
            }
            VfsError::Io(e) => e,
            VfsError::Other(msg) => io::Error::other(msg),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
