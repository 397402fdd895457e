use sluice_core::{Data, DatasetError, Result};
use sluice_datasets::DatasetRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::PartitionedConfig;
use crate::store::{DatasetDescription, PartitionInput, PartitionStore};

/// Deferred load of one partition. Every call reads from storage again.
pub type LoadFn = Arc<dyn Fn() -> Result<Data> + Send + Sync>;

/// A directory of files exposed as one dataset keyed by partition id.
///
/// Loading is lazy: [`PartitionedDataset::load`] returns a [`LoadFn`] per
/// partition and reads nothing. The listing of the root is cached until the
/// next [`save`](PartitionedDataset::save) or
/// [`release`](PartitionedDataset::release).
#[derive(Debug)]
pub struct PartitionedDataset {
    store: PartitionStore,
    overwrite: bool,
}

impl PartitionedDataset {
    /// Build the dataset.
    ///
    /// Fails with [`DatasetError::Configuration`] before touching storage
    /// when the dataset definition asks for versioning or names an unknown
    /// type, and with [`DatasetError::UnsupportedProtocol`] when no
    /// filesystem serves the root.
    pub fn new(config: PartitionedConfig, registry: Arc<DatasetRegistry>) -> Result<Self> {
        let PartitionedConfig { source, overwrite } = config;
        Ok(Self {
            store: PartitionStore::new(source, registry)?,
            overwrite,
        })
    }

    pub fn path(&self) -> &str {
        self.store.path()
    }

    fn list(&self) -> Result<Arc<Vec<String>>> {
        self.store.listing(|| self.store.find_matching())
    }

    /// Ids of the partitions currently visible, sorted.
    pub fn partition_ids(&self) -> Result<Vec<String>> {
        let codec = self.store.codec();
        let mut ids: Vec<String> = self
            .list()?
            .iter()
            .map(|path| codec.to_partition_id(path))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// One load function per partition. Nothing is read until one is called.
    pub fn load(&self) -> Result<BTreeMap<String, LoadFn>> {
        let listing = self.list()?;
        if listing.is_empty() {
            return Err(DatasetError::NotFound(format!(
                "no partitions found in '{}'",
                self.store.path()
            )));
        }

        let mut partitions = BTreeMap::new();
        for path in listing.iter() {
            let dataset = self.store.instantiate(path)?;
            let load: LoadFn = Arc::new(move || dataset.load());
            partitions.insert(self.store.codec().to_partition_id(path), load);
        }
        Ok(partitions)
    }

    /// Write every partition, in partition id order.
    ///
    /// With `overwrite` set the existing root is removed first. There is no
    /// rollback: a failing partition leaves the earlier ones written.
    pub fn save<I, K, V>(&self, partitions: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<PartitionInput>,
    {
        let partitions: BTreeMap<String, PartitionInput> = partitions
            .into_iter()
            .map(|(id, input)| (id.into(), input.into()))
            .collect();
        self.store.save_partitions(partitions, self.overwrite)
    }

    /// Whether any partition is visible.
    pub fn exists(&self) -> Result<bool> {
        Ok(!self.list()?.is_empty())
    }

    /// Forget the cached listing.
    pub fn release(&self) {
        self.store.invalidate();
    }

    pub fn describe(&self) -> DatasetDescription {
        self.store.describe()
    }
}
