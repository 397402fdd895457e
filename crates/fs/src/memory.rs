//! In-memory object store.

use bytes::Bytes;
use parking_lot::RwLock;
use sluice_core::{DatasetError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::path::StoragePath;
use crate::{FileSystem, FindOptions};

/// Flat object store kept in process memory.
///
/// Clones share the same objects, so every dataset resolved through a
/// registry sees the writes of the others. The protocol is configurable,
/// which lets it serve `s3://`-style paths in development and tests.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    protocol: String,
    store: Arc<MemoryStore>,
}

#[derive(Debug, Default)]
struct MemoryStore {
    objects: RwLock<BTreeMap<String, Bytes>>,
    finds: AtomicU64,
    invalidations: AtomicU64,
}

/// Counters describing how a [`MemoryFileSystem`] has been used.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryFsStats {
    /// Calls to `find`.
    pub finds: u64,
    /// Calls to `invalidate_cache`.
    pub invalidations: u64,
    /// Objects currently stored.
    pub objects: usize,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::with_protocol("memory")
    }

    pub fn with_protocol(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            store: Arc::new(MemoryStore::default()),
        }
    }

    pub fn stats(&self) -> MemoryFsStats {
        MemoryFsStats {
            finds: self.store.finds.load(Ordering::Relaxed),
            invalidations: self.store.invalidations.load(Ordering::Relaxed),
            objects: self.store.objects.read().len(),
        }
    }

    /// Store an object directly, bypassing any dataset.
    pub fn put(&self, path: &str, data: impl Into<Bytes>) {
        let key = self.strip_protocol(path);
        self.store.objects.write().insert(key, data.into());
    }

    /// All stored object keys, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.store.objects.read().keys().cloned().collect()
    }

    fn is_below(key: &str, root: &str, sep: &str) -> bool {
        root.is_empty()
            || key
                .strip_prefix(root)
                .map(|rest| rest.starts_with(sep) || root.ends_with(sep))
                .unwrap_or(false)
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemoryFileSystem {
    fn protocol(&self) -> &str {
        &self.protocol
    }

    fn find(&self, root: &str, options: &FindOptions) -> Result<Vec<String>> {
        self.store.finds.fetch_add(1, Ordering::Relaxed);
        let root = self.strip_protocol(root);
        let sep = self.sep();
        let objects = self.store.objects.read();

        if objects.contains_key(&root) {
            return Ok(vec![root]);
        }

        let prefix_len = if root.is_empty() {
            0
        } else if root.ends_with(sep) {
            root.len()
        } else {
            root.len() + sep.len()
        };
        let mut found = BTreeSet::new();
        for key in objects.keys().filter(|k| Self::is_below(k, &root, sep)) {
            let relative = &key[prefix_len.min(key.len())..];
            let parts: Vec<&str> = relative.split(sep).collect();
            if options.maxdepth.map_or(true, |depth| parts.len() <= depth) {
                found.insert(key.clone());
            }
            if options.withdirs {
                let depth_limit = options.maxdepth.unwrap_or(usize::MAX);
                for end in 1..parts.len() {
                    if end > depth_limit {
                        break;
                    }
                    let dir = parts[..end].join(sep);
                    if root.is_empty() {
                        found.insert(dir);
                    } else {
                        found.insert(format!("{root}{sep}{dir}"));
                    }
                }
            }
        }
        Ok(found.into_iter().collect())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let path = self.strip_protocol(path);
        let objects = self.store.objects.read();
        Ok(objects.contains_key(&path)
            || objects.keys().any(|k| Self::is_below(k, &path, self.sep())))
    }

    fn remove_recursive(&self, path: &str) -> Result<()> {
        let path = self.strip_protocol(path);
        let sep = self.sep().to_string();
        let mut objects = self.store.objects.write();
        let before = objects.len();
        objects.retain(|k, _| k != &path && !Self::is_below(k, &path, &sep));
        if objects.len() == before {
            return Err(DatasetError::Missing(path));
        }
        Ok(())
    }

    fn strip_protocol(&self, path: &str) -> String {
        StoragePath::strip_for(path, &self.protocol, self.sep())
    }

    fn invalidate_cache(&self, _path: &str) {
        self.store.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    fn read(&self, path: &str) -> Result<Bytes> {
        let key = self.strip_protocol(path);
        let found = self.store.objects.read().get(&key).cloned();
        found.ok_or(DatasetError::Missing(key))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.put(path, Bytes::copy_from_slice(data));
        Ok(())
    }
}
