//! Filesystem abstraction for dataset storage.
//!
//! Datasets never touch storage directly. They go through a [`FileSystem`]
//! resolved from the protocol of their path:
//! - [`LocalFileSystem`]: the local disk (`file://` or no scheme)
//! - [`MemoryFileSystem`]: a process-local object store, also used to stand
//!   in for remote object stores in tests
//!
//! [`FileSystemRegistry`] maps protocols to filesystem factories.

mod local;
mod memory;
mod path;
mod registry;

pub use local::LocalFileSystem;
pub use memory::{MemoryFileSystem, MemoryFsStats};
pub use path::{canonical_protocol, StoragePath, DEFAULT_PROTOCOL};
pub use registry::{FileSystemFactory, FileSystemRegistry, FsOptions};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sluice_core::Result;

/// Options forwarded to [`FileSystem::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindOptions {
    /// Maximum depth below the root to descend. `1` lists direct children only.
    #[serde(default)]
    pub maxdepth: Option<usize>,
    /// Also report directories.
    #[serde(default)]
    pub withdirs: bool,
}

impl FindOptions {
    pub fn with_maxdepth(mut self, depth: usize) -> Self {
        self.maxdepth = Some(depth);
        self
    }

    pub fn with_dirs(mut self) -> Self {
        self.withdirs = true;
        self
    }
}

/// Storage capability consumed by datasets.
///
/// Every method accepts paths with or without the protocol prefix. Paths
/// returned by [`FileSystem::find`] are protocol-stripped.
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Canonical protocol served by this filesystem.
    fn protocol(&self) -> &str;

    /// Path separator.
    fn sep(&self) -> &str {
        "/"
    }

    /// Recursively list objects below `root`, sorted.
    ///
    /// A missing root yields an empty listing.
    fn find(&self, root: &str, options: &FindOptions) -> Result<Vec<String>>;

    fn exists(&self, path: &str) -> Result<bool>;

    /// Remove an object or a whole directory tree.
    fn remove_recursive(&self, path: &str) -> Result<()>;

    /// Drop the protocol prefix and any trailing separator.
    fn strip_protocol(&self, path: &str) -> String;

    /// Forget any listing cached for `path`.
    fn invalidate_cache(&self, _path: &str) {}

    fn read(&self, path: &str) -> Result<Bytes>;

    /// Write an object, creating intermediate directories as needed.
    fn write(&self, path: &str, data: &[u8]) -> Result<()>;
}
