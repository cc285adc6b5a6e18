//! Index manifests and the loader that mounts them.

mod loader;
mod manifest;

pub use loader::{DEFAULT_EXTENSION, IndexInfo, IndexLoader, LoadOptions, LoadReport, ManifestFailure};
pub use manifest::{IndexedObject, Manifest};
