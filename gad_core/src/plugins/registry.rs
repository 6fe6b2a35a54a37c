//! # Plugin Registry
//!
//! JSON catalog of the discovered plugins, keyed by plugin name:
//!
//! ```json
//! {
//!   "Slab Bridge Design": {
//!     "version": "1.0.0",
//!     "author": "Bridge Design Cell",
//!     "description": "Performs design calculations for slab bridges."
//!   }
//! }
//! ```
//!
//! Rebuilding is a full overwrite. Builders serialize on an OS-level lock
//! held on a `.lock` sibling, and the catalog itself is replaced through an
//! atomic rename, so readers see either the old or the new file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{GadError, GadResult};
use crate::file_io::write_atomic;
use crate::plugins::contract::PluginDescriptor;
use crate::plugins::discovery::discover;

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub version: String,
    pub author: String,
    pub description: String,
}

/// Plugin name to metadata, sorted by name
pub type Catalog = BTreeMap<String, RegistryRecord>;

/// Project discovered plugins into a catalog.
pub fn project(plugins: &[PluginDescriptor]) -> Catalog {
    plugins
        .iter()
        .map(|plugin| {
            (
                plugin.name.clone(),
                RegistryRecord {
                    version: plugin.version.clone(),
                    author: plugin.author.clone(),
                    description: plugin.description.clone(),
                },
            )
        })
        .collect()
}

/// Registry file bound to the plugin directory it catalogs.
#[derive(Debug, Clone)]
pub struct PluginRegistry {
    path: PathBuf,
    plugin_dir: PathBuf,
}

impl PluginRegistry {
    pub fn new(path: impl Into<PathBuf>, plugin_dir: impl Into<PathBuf>) -> Self {
        PluginRegistry {
            path: path.into(),
            plugin_dir: plugin_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Rediscover plugins and overwrite the catalog. Returns what was written.
    pub fn build(&self) -> GadResult<Catalog> {
        let catalog = project(&discover(&self.plugin_dir).plugins);

        let json = serde_json::to_string_pretty(&catalog).map_err(|e| GadError::SerializationError {
            reason: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| GadError::registry(parent.display().to_string(), e.to_string()))?;
        }

        let _lock = RegistryLock::acquire(&self.path)?;
        write_atomic(&self.path, &format!("{}\n", json))
            .map_err(|e| GadError::registry(self.path.display().to_string(), e.to_string()))?;

        tracing::info!(path = %self.path.display(), plugins = catalog.len(), "plugin registry rebuilt");
        Ok(catalog)
    }

    /// Read the catalog. A missing file is an empty catalog.
    pub fn get(&self) -> GadResult<Catalog> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Catalog::new()),
            Err(e) => return Err(GadError::registry(self.path.display().to_string(), e.to_string())),
        };

        serde_json::from_str(&content).map_err(|e| GadError::registry(self.path.display().to_string(), e.to_string()))
    }

    /// Read the catalog, treating an unreadable one as empty.
    pub fn load_or_empty(&self) -> Catalog {
        self.get().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable plugin registry");
            Catalog::new()
        })
    }
}

/// Exclusive OS lock on `<registry>.lock`, released on drop.
///
/// The lock file is left in place; removing it would let a waiting builder
/// and a new one lock different inodes.
struct RegistryLock {
    _file: File,
}

impl RegistryLock {
    fn acquire(registry_path: &Path) -> GadResult<Self> {
        let lock_path = lock_path_for(registry_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| GadError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        file.lock_exclusive()
            .map_err(|e| GadError::file_error("lock", lock_path.display().to_string(), e.to_string()))?;

        Ok(RegistryLock { _file: file })
    }
}

fn lock_path_for(registry_path: &Path) -> PathBuf {
    let mut lock_path = registry_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}
