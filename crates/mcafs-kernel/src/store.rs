//! Content-addressed object store on disk.
//!
//! Layout below the store root:
//!
//! ```text
//! <root>/
//!   indexes/<name>.json      one manifest per index
//!   objects/<xx>/<hash>      object bytes, sharded by the first two hash chars
//! ```
//!
//! Hash → path mapping is pure. Whether the object is actually present is
//! only discovered when it is opened or stat'ed.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, ReadBuf};

use crate::vfs::{VfsError, VfsResult};

/// Directory holding the sharded objects.
pub const OBJECTS_DIR: &str = "objects";

/// Directory holding the manifests.
pub const INDEXES_DIR: &str = "indexes";

/// Store location below the per-user data directory.
pub const DEFAULT_SUBPATH: &str = ".minecraft/assets";

/// Default store root.
///
/// On Windows this is under the roaming application data directory,
/// elsewhere under the home directory.
pub fn default_root() -> Option<PathBuf> {
    let base = if cfg!(windows) {
        dirs::data_dir()
    } else {
        dirs::home_dir()
    };
    base.map(|b| b.join(DEFAULT_SUBPATH))
}

/// A well-formed hash is at least two ASCII hex digits.
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() >= 2 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Read access to an object store rooted at a directory.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Open the store at `root`.
    ///
    /// The root must exist and be a directory; nothing else is checked.
    pub fn open(root: impl Into<PathBuf>) -> VfsResult<Self> {
        let root: PathBuf = root.into();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            _ => Err(VfsError::StoreUnavailable(root)),
        }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.root.join(OBJECTS_DIR)
    }

    pub fn indexes_dir(&self) -> PathBuf {
        self.root.join(INDEXES_DIR)
    }

    /// Physical location of the object for `hash`.
    pub fn object_path(&self, hash: &str) -> VfsResult<PathBuf> {
        if !is_valid_hash(hash) {
            return Err(VfsError::InvalidHash(hash.to_string()));
        }
        Ok(self.objects_dir().join(&hash[..2]).join(hash))
    }

    fn unavailable(hash: &str, path: PathBuf, source: io::Error) -> VfsError {
        VfsError::BackingStoreUnavailable {
            hash: hash.to_string(),
            path,
            source,
        }
    }

    /// Metadata of the object for `hash`.
    pub async fn object_metadata(&self, hash: &str) -> VfsResult<Metadata> {
        let path = self.object_path(hash)?;
        fs::metadata(&path)
            .await
            .map_err(|e| Self::unavailable(hash, path, e))
    }

    /// Metadata of the store root. Virtual directories borrow it.
    pub async fn root_metadata(&self) -> VfsResult<Metadata> {
        Ok(fs::metadata(&self.root).await?)
    }

    /// Open the object for `hash`, positioned at `offset`.
    pub async fn open_object(&self, hash: &str, offset: u64) -> VfsResult<ReadStream> {
        let path = self.object_path(hash)?;
        let mut file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => return Err(Self::unavailable(hash, path, e)),
        };
        if offset > 0 {
            if let Err(e) = file.seek(io::SeekFrom::Start(offset)).await {
                return Err(Self::unavailable(hash, path, e));
            }
        }
        Ok(ReadStream {
            path,
            offset,
            file,
        })
    }

    /// Manifests in `indexes/` with the given extension, as
    /// `(index name, manifest path)` sorted by name.
    ///
    /// An `indexes/` directory that is missing or cannot be listed yields no
    /// manifests; unreadable entries are skipped.
    pub fn manifest_paths(&self, extension: &str) -> Vec<(String, PathBuf)> {
        let dir = self.indexes_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "no indexes directory in asset store");
                return Vec::new();
            }
            Err(error) => {
                tracing::warn!(dir = %dir.display(), %error, "cannot list indexes directory");
                return Vec::new();
            }
        };

        let mut manifests = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(error) => {
                    tracing::warn!(dir = %dir.display(), %error, "skipping unreadable index entry");
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some(extension) || !path.is_file() {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => manifests.push((stem.to_string(), path.clone())),
                None => tracing::warn!(path = %path.display(), "skipping manifest with non UTF-8 name"),
            }
        }
        manifests.sort_by(|a, b| a.0.cmp(&b.0));
        manifests
    }
}

/// Byte stream over one stored object.
///
/// Dropping the stream closes the underlying file.
#[derive(Debug)]
pub struct ReadStream {
    path: PathBuf,
    offset: u64,
    file: fs::File,
}

impl ReadStream {
    /// Physical path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset the stream started at.
    pub fn start_offset(&self) -> u64 {
        self.offset
    }

    /// Read up to `size` bytes from the current position.
    pub async fn read_chunk(&mut self, size: usize) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(size);
        (&mut self.file).take(size as u64).read_to_end(&mut buffer).await?;
        Ok(buffer)
    }
}

impl AsyncRead for ReadStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}
