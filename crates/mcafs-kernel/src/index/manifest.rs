//! Manifest documents.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::vfs::{VfsError, VfsResult, VirtualFile};

/// One object entry in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedObject {
    pub hash: String,
    pub size: u64,
}

impl From<&IndexedObject> for VirtualFile {
    fn from(obj: &IndexedObject) -> Self {
        VirtualFile::new(obj.hash.clone(), obj.size)
    }
}

/// A parsed index manifest.
///
/// Entries keep document order so the virtual tree lists children in the
/// order the manifest declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Entries are meant to be served as resource-relative paths.
    #[serde(default)]
    pub map_to_resources: bool,
    pub objects: IndexMap<String, IndexedObject>,
}

impl Manifest {
    /// Parse manifest bytes for the index called `name`.
    pub fn from_slice(name: &str, bytes: &[u8]) -> VfsResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| VfsError::manifest(name, e))
    }

    /// Read and parse the manifest file at `path`.
    pub fn read(name: &str, path: &Path) -> VfsResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| VfsError::manifest(name, e))?;
        Self::from_slice(name, &bytes)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let json = br#"{"objects": {"a/b/c.txt": {"hash": "deadbeef", "size": 42}}}"#;
        let manifest = Manifest::from_slice("objects1", json).unwrap();
        assert!(!manifest.map_to_resources);
        assert_eq!(manifest.len(), 1);
        assert_eq!(
            manifest.objects["a/b/c.txt"],
            IndexedObject {
                hash: "deadbeef".into(),
                size: 42
            }
        );
    }

    #[test]
    fn test_parse_flag_and_unknown_fields() {
        let json = br#"{
            "map_to_resources": true,
            "virtual": false,
            "objects": {
                "z.ogg": {"hash": "aa", "size": 1},
                "a.ogg": {"hash": "bb", "size": 2}
            }
        }"#;
        let manifest = Manifest::from_slice("pre-1.6", json).unwrap();
        assert!(manifest.map_to_resources);
        let keys: Vec<_> = manifest.objects.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z.ogg", "a.ogg"]);
    }

    #[test]
    fn test_parse_failure_names_index() {
        let err = Manifest::from_slice("broken", b"{not json").unwrap_err();
        match err {
            VfsError::ManifestParse { index, .. } => assert_eq!(index, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_objects_is_failure() {
        assert!(Manifest::from_slice("empty", b"{}").is_err());
    }

    #[test]
    fn test_negative_size_is_failure() {
        let json = br#"{"objects": {"x": {"hash": "aa", "size": -1}}}"#;
        assert!(Manifest::from_slice("neg", json).is_err());
    }
}
