//! Typed registry mapping dataset type ids to factories.

use parking_lot::RwLock;
use sluice_core::{ConfigMap, Dataset, DatasetError, Descriptor, Result};
use sluice_fs::FileSystemRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::file::{FileDataset, FileFormat};

/// Builds a dataset from its constructor arguments.
pub type DatasetFactory =
    Arc<dyn Fn(&ConfigMap, &FileSystemRegistry) -> Result<Arc<dyn Dataset>> + Send + Sync>;

/// Registry of dataset factories.
///
/// Unknown type ids are rejected with a configuration error naming the
/// known ones, so a typo fails when the dataset is declared rather than
/// when it is first used.
pub struct DatasetRegistry {
    factories: RwLock<HashMap<String, DatasetFactory>>,
    filesystems: Arc<FileSystemRegistry>,
}

impl DatasetRegistry {
    /// A registry with no dataset types.
    pub fn empty(filesystems: Arc<FileSystemRegistry>) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            filesystems,
        }
    }

    /// A registry with the built-in file datasets.
    pub fn new(filesystems: Arc<FileSystemRegistry>) -> Self {
        let registry = Self::empty(filesystems);
        for format in [FileFormat::Text, FileFormat::Bytes, FileFormat::Json] {
            registry.register(format.type_id(), move |config, filesystems| {
                Ok(Arc::new(FileDataset::open(format, config, filesystems)?) as Arc<dyn Dataset>)
            });
        }
        registry
    }

    /// Register a factory for `type_id`, replacing any previous one.
    pub fn register<F>(&self, type_id: impl Into<String>, factory: F)
    where
        F: Fn(&ConfigMap, &FileSystemRegistry) -> Result<Arc<dyn Dataset>> + Send + Sync + 'static,
    {
        let type_id = type_id.into();
        debug!(type_id = %type_id, "dataset type registered");
        self.factories.write().insert(type_id, Arc::new(factory));
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.factories.read().contains_key(type_id)
    }

    /// Fail unless `type_id` is registered.
    pub fn ensure_known(&self, type_id: &str) -> Result<()> {
        if self.contains(type_id) {
            return Ok(());
        }
        Err(self.unknown_type(type_id))
    }

    /// Instantiate the dataset a descriptor describes.
    pub fn create(&self, descriptor: &Descriptor) -> Result<Arc<dyn Dataset>> {
        let factory = self.factories.read().get(descriptor.type_id()).cloned();
        let Some(factory) = factory else {
            return Err(self.unknown_type(descriptor.type_id()));
        };
        factory(descriptor.config(), &self.filesystems)
    }

    fn unknown_type(&self, type_id: &str) -> DatasetError {
        DatasetError::config(format!(
            "unknown dataset type '{type_id}' (known: {})",
            self.type_ids().join(", ")
        ))
    }

    pub fn filesystems(&self) -> &Arc<FileSystemRegistry> {
        &self.filesystems
    }

    /// Registered type ids, sorted.
    pub fn type_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::new(Arc::new(FileSystemRegistry::new()))
    }
}

impl std::fmt::Debug for DatasetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetRegistry")
            .field("types", &self.type_ids())
            .field("filesystems", &self.filesystems)
            .finish()
    }
}
