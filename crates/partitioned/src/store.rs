//! State shared by the partitioned and incremental engines.

use serde::Serialize;
use serde_json::Value;
use sluice_core::{
    ConfigMap, Data, Dataset, DatasetError, Descriptor, Result, CREDENTIALS_KEY, FS_ARGS_KEY,
    VERSIONED_FLAG_KEY, VERSION_KEY,
};
use sluice_datasets::DatasetRegistry;
use sluice_fs::{FileSystem, FindOptions, FsOptions, StoragePath};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::ListingCache;
use crate::codec::PartitionPathCodec;
use crate::config::SourceConfig;

/// Producer of one partition's data on save.
pub enum PartitionInput {
    Ready(Data),
    /// Invoked right before the partition is written.
    Deferred(Box<dyn FnOnce() -> Result<Data> + Send>),
}

impl PartitionInput {
    pub fn deferred<F>(produce: F) -> Self
    where
        F: FnOnce() -> Result<Data> + Send + 'static,
    {
        PartitionInput::Deferred(Box::new(produce))
    }

    pub fn resolve(self) -> Result<Data> {
        match self {
            PartitionInput::Ready(data) => Ok(data),
            PartitionInput::Deferred(produce) => produce(),
        }
    }
}

macro_rules! ready_from {
    ($($source:ty),*) => {
        $(
            impl From<$source> for PartitionInput {
                fn from(value: $source) -> Self {
                    PartitionInput::Ready(value.into())
                }
            }
        )*
    };
}

ready_from!(Data, String, &str, Vec<u8>, Value);

impl fmt::Debug for PartitionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionInput::Ready(data) => f.debug_tuple("Ready").field(data).finish(),
            PartitionInput::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Metadata reported by `describe`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetDescription {
    pub path: String,
    pub dataset_type: String,
    /// Dataset arguments, credentials removed.
    pub dataset_config: ConfigMap,
}

pub(crate) struct PartitionStore {
    path: String,
    normalized: String,
    descriptor: Descriptor,
    filepath_arg: String,
    credentials: ConfigMap,
    load_args: FindOptions,
    fs: Arc<dyn FileSystem>,
    codec: PartitionPathCodec,
    registry: Arc<DatasetRegistry>,
    cache: ListingCache,
}

/// Reject a descriptor that asks for dataset-level versioning.
pub(crate) fn ensure_unversioned(descriptor: &Descriptor, target: &str) -> Result<()> {
    if descriptor.requests_versioning() {
        return Err(DatasetError::config(format!(
            "versioning is not supported for the {target} of a partitioned dataset; \
             remove '{VERSION_KEY}' and '{VERSIONED_FLAG_KEY}' from its definition"
        )));
    }
    Ok(())
}

/// Inject `value` under `key` unless the target already declares its own.
pub(crate) fn propagate(config: &mut ConfigMap, key: &str, value: &ConfigMap, target: &str) {
    if value.is_empty() {
        return;
    }
    if config.contains_key(key) {
        warn!(
            key,
            owner = target,
            "top-level {key} not propagated, the {target} declares its own"
        );
        return;
    }
    config.insert(key.to_string(), Value::Object(value.clone()));
}

impl PartitionStore {
    /// Validate the configuration and bind the filesystem. The only I/O is
    /// the final cache invalidation, after every check has passed.
    pub(crate) fn new(source: SourceConfig, registry: Arc<DatasetRegistry>) -> Result<Self> {
        let SourceConfig {
            path,
            dataset,
            filepath_arg,
            filename_suffix,
            credentials,
            load_args,
            fs_args,
        } = source;

        let descriptor = Descriptor::parse(dataset)?;
        ensure_unversioned(&descriptor, "dataset")?;
        registry.ensure_known(descriptor.type_id())?;

        let mut config = descriptor.config().clone();
        propagate(&mut config, CREDENTIALS_KEY, &credentials, "dataset");
        propagate(&mut config, FS_ARGS_KEY, &fs_args, "dataset");
        if config.contains_key(&filepath_arg) {
            warn!(
                filepath_arg = %filepath_arg,
                "'{filepath_arg}' is set in the dataset definition and will be overwritten per partition"
            );
        }
        let descriptor = Descriptor::new(descriptor.type_id(), config);

        let root = StoragePath::parse(path.as_str());
        let fs = registry
            .filesystems()
            .resolve(root.canonical_protocol(), &FsOptions::new(credentials.clone(), fs_args))?;
        let codec = PartitionPathCodec::new(&root, fs.as_ref(), filename_suffix);
        let normalized = root.normalized();

        let store = Self {
            path,
            normalized,
            descriptor,
            filepath_arg,
            credentials,
            load_args,
            fs,
            codec,
            registry,
            cache: ListingCache::new(),
        };
        store.invalidate();
        Ok(store)
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn normalized(&self) -> &str {
        &self.normalized
    }

    pub(crate) fn credentials(&self) -> &ConfigMap {
        &self.credentials
    }

    pub(crate) fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub(crate) fn codec(&self) -> &PartitionPathCodec {
        &self.codec
    }

    pub(crate) fn registry(&self) -> &Arc<DatasetRegistry> {
        &self.registry
    }

    /// Cached listing, computed with `list` on a miss.
    pub(crate) fn listing<F>(&self, list: F) -> Result<Arc<Vec<String>>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        self.cache.get_or_try_init(list)
    }

    /// Paths below the root that carry the filename suffix.
    pub(crate) fn find_matching(&self) -> Result<Vec<String>> {
        let found = self.fs.find(&self.normalized, &self.load_args)?;
        let matching: Vec<String> = found
            .into_iter()
            .filter(|path| self.codec.matches_suffix(path))
            .collect();
        debug!(path = %self.path, count = matching.len(), "partitions listed");
        Ok(matching)
    }

    /// Dataset bound to a listed (protocol-stripped) path.
    pub(crate) fn instantiate(&self, path: &str) -> Result<Arc<dyn Dataset>> {
        let descriptor = self.descriptor.with(
            self.filepath_arg.as_str(),
            Value::String(self.codec.join_protocol(path)),
        );
        self.registry.create(&descriptor)
    }

    /// Dataset bound to a partition id.
    pub(crate) fn instantiate_partition(&self, partition_id: &str) -> Result<Arc<dyn Dataset>> {
        let descriptor = self.descriptor.with(
            self.filepath_arg.as_str(),
            Value::String(self.codec.to_storage_path(partition_id)),
        );
        self.registry.create(&descriptor)
    }

    pub(crate) fn invalidate(&self) {
        self.cache.invalidate();
        self.fs.invalidate_cache(&self.normalized);
        debug!(path = %self.path, "partition listing invalidated");
    }

    /// Write partitions in id order, invalidating the listing afterwards
    /// whether or not every write succeeded.
    pub(crate) fn save_partitions(
        &self,
        partitions: BTreeMap<String, PartitionInput>,
        overwrite: bool,
    ) -> Result<()> {
        let result = self.write_partitions(partitions, overwrite);
        self.invalidate();
        result
    }

    fn write_partitions(
        &self,
        partitions: BTreeMap<String, PartitionInput>,
        overwrite: bool,
    ) -> Result<()> {
        if overwrite && self.fs.exists(&self.normalized)? {
            self.fs.remove_recursive(&self.normalized)?;
            info!(path = %self.path, "existing partitions removed before overwrite");
        }

        let count = partitions.len();
        for (partition_id, input) in partitions {
            let dataset = self.instantiate_partition(&partition_id)?;
            let data = input.resolve()?;
            dataset.save(data)?;
            debug!(partition = %partition_id, "partition saved");
        }
        info!(path = %self.path, count, "partitions saved");
        Ok(())
    }

    pub(crate) fn describe(&self) -> DatasetDescription {
        DatasetDescription {
            path: self.path.clone(),
            dataset_type: self.descriptor.type_id().to_string(),
            dataset_config: self.descriptor.redacted_config(),
        }
    }
}

impl fmt::Debug for PartitionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionStore")
            .field("path", &self.path)
            .field("dataset_type", &self.descriptor.type_id())
            .field("filepath_arg", &self.filepath_arg)
            .field("filename_suffix", &self.codec.filename_suffix())
            .field("fs", &self.fs)
            .finish()
    }
}
