//! Config file and flag merging.
//!
//! Looks for `config.toml` under `$XDG_CONFIG_HOME/mcafs/` (or the platform
//! equivalent) unless `--config` names a file. Every field is optional;
//! command-line flags win over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use mcafs_kernel::LoadOptions;
use mcafs_kernel::index::DEFAULT_EXTENSION;
use mcafs_kernel::vfs::path;
use serde::Deserialize;

/// Default tracing filter when neither flag, file nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Asset store root. `~` is expanded.
    pub root: Option<String>,
    /// Extension of manifest files in `indexes/`.
    pub manifest_extension: Option<String>,
    /// Mount point for manifests flagged `map_to_resources`.
    pub resources_prefix: Option<String>,
    /// Tracing filter directive, e.g. `debug` or `mcafs_kernel=trace`.
    pub log_level: Option<String>,
}

/// Settings after merging file, flags and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub root: PathBuf,
    pub load: LoadOptions,
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mcafs").join("config.toml"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `explicit`, or the default file if it exists.
    ///
    /// An explicit path must exist; a missing default file yields an empty
    /// config.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let path = match explicit {
            Some(p) => expand(p),
            None => match Self::default_path() {
                Some(p) if p.is_file() => p,
                _ => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Fields set in `overrides` replace ours.
    pub fn overlay(self, overrides: Config) -> Self {
        Self {
            root: overrides.root.or(self.root),
            manifest_extension: overrides.manifest_extension.or(self.manifest_extension),
            resources_prefix: overrides.resources_prefix.or(self.resources_prefix),
            log_level: overrides.log_level.or(self.log_level),
        }
    }

    /// Resolve the store root and load options.
    ///
    /// Without a configured root, falls back to the platform's default
    /// asset directory.
    pub fn settings(&self) -> Result<Settings> {
        let root = match &self.root {
            Some(root) => expand(root),
            None => match mcafs_kernel::default_root() {
                Some(root) => root,
                None => bail!("no asset store root configured and no home directory found"),
            },
        };

        let extension = self
            .manifest_extension
            .as_deref()
            .map(|e| e.trim_start_matches('.'))
            .unwrap_or(DEFAULT_EXTENSION)
            .to_string();
        if extension.is_empty() {
            bail!("manifest extension must not be empty");
        }

        let resources_prefix = match self.resources_prefix.as_deref() {
            Some(prefix) => resources_subpath(prefix)?,
            None => None,
        };

        Ok(Settings {
            root,
            load: LoadOptions {
                extension,
                resources_prefix,
            },
        })
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }
}

/// Normalized mount subpath for `resources_prefix`, `None` when blank.
///
/// Every segment must be a legal stored name, otherwise each flagged
/// manifest would fail to mount.
fn resources_subpath(prefix: &str) -> Result<Option<String>> {
    if prefix.trim().is_empty() {
        return Ok(None);
    }
    let normal = path::normalize(prefix)
        .with_context(|| format!("invalid resources_prefix {prefix:?}"))?;
    for segment in path::segments(&normal) {
        path::validate_name(segment)
            .with_context(|| format!("invalid resources_prefix {prefix:?}"))?;
    }
    Ok(Some(normal).filter(|p| !p.is_empty()))
}

fn expand(path: &str) -> PathBuf {
    Path::new(shellexpand::tilde(path).as_ref()).to_path_buf()
}
