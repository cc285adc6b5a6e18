//! Builds the virtual tree from the store's manifests.
//!
//! Every manifest becomes one top-level directory named after the file
//! stem. Loading is one pass at startup:
//!
//! - a manifest that fails to read or parse is reported and contributes
//!   nothing, the remaining manifests still load;
//! - an entry that conflicts with the tree (file vs directory), has an
//!   invalid name, or carries a malformed hash is skipped and counted, the
//!   rest of its manifest still loads;
//! - an entry that re-registers an existing file path replaces it.

use std::path::PathBuf;

use serde::Serialize;

use super::manifest::Manifest;
use crate::store::{self, ObjectStore};
use crate::vfs::{NodeId, VfsError, VfsResult, VirtualFile, VirtualTree, path};

/// Manifest file extension looked for in `indexes/`.
pub const DEFAULT_EXTENSION: &str = "json";

/// Options for a load pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Only files in `indexes/` with this extension are manifests.
    pub extension: String,
    /// Where manifests flagged `map_to_resources` are mounted inside their
    /// index directory. `None` mounts them like any other manifest.
    pub resources_prefix: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            resources_prefix: None,
        }
    }
}

impl LoadOptions {
    /// Mount flagged manifests under `prefix`.
    pub fn with_resources_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resources_prefix = Some(prefix.into());
        self
    }

    /// Path below the index directory where a manifest's entries go.
    fn mount_subpath(&self, manifest: &Manifest) -> Option<&str> {
        if manifest.map_to_resources {
            self.resources_prefix.as_deref()
        } else {
            None
        }
    }
}

/// What one manifest contributed to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    /// Index name, also the top-level directory name.
    pub name: String,
    /// Manifest file it came from, if loaded from disk.
    pub manifest: Option<PathBuf>,
    /// Absolute virtual path the entries were mounted under.
    pub mount: String,
    pub map_to_resources: bool,
    /// Entries declared by the manifest.
    pub entries: usize,
    /// Files bound into the tree.
    pub files: usize,
    /// Entries that replaced an earlier entry with the same path.
    pub overwritten: usize,
    /// Entries skipped for conflicts, bad names or bad hashes.
    pub skipped: usize,
}

/// A manifest that contributed nothing.
#[derive(Debug)]
pub struct ManifestFailure {
    pub name: String,
    pub manifest: Option<PathBuf>,
    pub error: VfsError,
}

/// Outcome of a full load pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<IndexInfo>,
    pub failed: Vec<ManifestFailure>,
}

impl LoadReport {
    /// Total files bound across all indexes.
    pub fn total_files(&self) -> usize {
        self.loaded.iter().map(|i| i.files).sum()
    }
}

/// Loads manifests into a [`VirtualTree`].
#[derive(Debug, Clone, Default)]
pub struct IndexLoader {
    options: LoadOptions,
}

impl IndexLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load every manifest in the store's `indexes/` directory.
    ///
    /// Never fails as a whole; per-manifest problems end up in the report.
    pub fn load_store(&self, store: &ObjectStore, tree: &mut VirtualTree) -> LoadReport {
        let mut report = LoadReport::default();
        for (name, manifest_path) in store.manifest_paths(&self.options.extension) {
            tracing::debug!(index = %name, path = %manifest_path.display(), "loading index");
            let result = Manifest::read(&name, &manifest_path)
                .and_then(|manifest| self.install(tree, &name, &manifest));
            match result {
                Ok(mut info) => {
                    info.manifest = Some(manifest_path);
                    report.loaded.push(info);
                }
                Err(error) => {
                    tracing::warn!(index = %name, %error, "skipping index");
                    report.failed.push(ManifestFailure {
                        name,
                        manifest: Some(manifest_path),
                        error,
                    });
                }
            }
        }
        tracing::info!(
            indexes = report.loaded.len(),
            failed = report.failed.len(),
            files = report.total_files(),
            "indexes are built"
        );
        report
    }

    /// Install one parsed manifest as the top-level directory `name`.
    pub fn install(
        &self,
        tree: &mut VirtualTree,
        name: &str,
        manifest: &Manifest,
    ) -> VfsResult<IndexInfo> {
        path::validate_name(name)?;
        let subpath = self.options.mount_subpath(manifest);
        if let Some(sub) = subpath {
            for segment in path::segments(sub) {
                path::validate_name(segment)?;
            }
        }

        let index_dir = tree.make_dir(NodeId::ROOT, name)?;
        let mount_dir = match subpath {
            Some(sub) => tree.make_dir(index_dir, sub)?,
            None => index_dir,
        };

        let mut info = IndexInfo {
            name: name.to_string(),
            manifest: None,
            mount: tree.path_of(mount_dir),
            map_to_resources: manifest.map_to_resources,
            entries: manifest.len(),
            files: 0,
            overwritten: 0,
            skipped: 0,
        };

        for (vpath, object) in &manifest.objects {
            tracing::trace!(index = %name, path = %vpath, hash = %object.hash, "loading entry");
            if !store::is_valid_hash(&object.hash) {
                tracing::warn!(index = %name, path = %vpath, hash = %object.hash, "skipping entry with invalid hash");
                info.skipped += 1;
                continue;
            }
            match tree.make_file(mount_dir, vpath, VirtualFile::from(object)) {
                Ok(None) => info.files += 1,
                Ok(Some(previous)) => {
                    tracing::debug!(
                        index = %name,
                        path = %vpath,
                        previous = %previous.hash,
                        current = %object.hash,
                        "entry replaced an earlier one"
                    );
                    info.overwritten += 1;
                }
                Err(error) => {
                    tracing::warn!(index = %name, path = %vpath, %error, "skipping entry");
                    info.skipped += 1;
                }
            }
        }

        Ok(info)
    }
}
