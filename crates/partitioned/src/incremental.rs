use serde_json::Value;
use sluice_core::{
    ConfigMap, Data, DatasetError, Descriptor, DescriptorSpec, Result, CREDENTIALS_KEY, TYPE_KEY,
    VERSIONED_FLAG_KEY, VERSION_KEY,
};
use sluice_datasets::{DatasetRegistry, FileFormat};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::comparison::Comparison;
use crate::config::{
    CheckpointSpec, IncrementalConfig, COMPARISON_KEY, DEFAULT_CHECKPOINT_FILENAME,
    DEFAULT_CHECKPOINT_TYPE, DEFAULT_FILEPATH_ARG, FORCE_CHECKPOINT_KEY,
};
use crate::store::{ensure_unversioned, DatasetDescription, PartitionInput, PartitionStore};

/// Checkpoint options after the engine-level keys have been taken out.
struct CheckpointOptions {
    config: ConfigMap,
    forced: Option<String>,
    comparison: Option<Comparison>,
}

impl CheckpointOptions {
    fn parse(spec: Option<CheckpointSpec>) -> Result<Self> {
        let mut config = match spec {
            None => ConfigMap::new(),
            Some(CheckpointSpec::Forced(value)) => {
                let mut config = ConfigMap::new();
                config.insert(FORCE_CHECKPOINT_KEY.to_string(), Value::String(value));
                config
            }
            Some(CheckpointSpec::Config(config)) => config,
        };

        for key in [VERSION_KEY, VERSIONED_FLAG_KEY] {
            if config.contains_key(key) {
                return Err(DatasetError::config(format!(
                    "versioning is not supported for the checkpoint; \
                     remove '{key}' from the checkpoint definition"
                )));
            }
        }

        let forced = match config.remove(FORCE_CHECKPOINT_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) => Some(value),
            Some(other) => {
                return Err(DatasetError::config(format!(
                    "'{FORCE_CHECKPOINT_KEY}' must be a string, got {other}"
                )))
            }
        };
        let comparison = match config.remove(COMPARISON_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(Comparison::from_name(&name)?),
            Some(other) => {
                return Err(DatasetError::config(format!(
                    "'{COMPARISON_KEY}' must be a string, got {other}"
                )))
            }
        };

        Ok(Self {
            config,
            forced,
            comparison,
        })
    }
}

/// A [`PartitionedDataset`](crate::PartitionedDataset) that only shows the
/// partitions past a stored checkpoint.
///
/// The checkpoint is an ordinary dataset holding the id of the last
/// confirmed partition, by default a `text` file named `CHECKPOINT` under
/// the root. [`IncrementalDataset::load`] reads every visible partition
/// eagerly; [`IncrementalDataset::confirm`] moves the checkpoint to the
/// greatest visible id.
///
/// A forced checkpoint replaces the stored value for the lifetime of the
/// instance. `confirm` still writes the store, but this instance keeps
/// filtering on the forced value.
#[derive(Debug)]
pub struct IncrementalDataset {
    store: PartitionStore,
    checkpoint: Descriptor,
    /// Protocol-stripped location of the checkpoint, hidden from listings.
    checkpoint_path: Option<String>,
    forced: Option<String>,
    comparison: Comparison,
}

impl IncrementalDataset {
    pub fn new(config: IncrementalConfig, registry: Arc<DatasetRegistry>) -> Result<Self> {
        let IncrementalConfig {
            source,
            checkpoint,
            comparison_func,
        } = config;
        let options = CheckpointOptions::parse(checkpoint)?;
        let store = PartitionStore::new(source, registry)?;

        let checkpoint = checkpoint_descriptor(&store, options.config)?;
        let checkpoint_path = checkpoint
            .get(DEFAULT_FILEPATH_ARG)
            .and_then(Value::as_str)
            .map(|path| store.fs().strip_protocol(path));
        let comparison = comparison_func.or(options.comparison).unwrap_or_default();

        debug!(
            path = %store.path(),
            checkpoint = ?checkpoint_path,
            forced = ?options.forced,
            comparison = comparison.name(),
            "incremental dataset ready"
        );
        Ok(Self {
            store,
            checkpoint,
            checkpoint_path,
            forced: options.forced,
            comparison,
        })
    }

    pub fn path(&self) -> &str {
        self.store.path()
    }

    pub fn checkpoint_descriptor(&self) -> &Descriptor {
        &self.checkpoint
    }

    pub fn forced_checkpoint(&self) -> Option<&str> {
        self.forced.as_deref()
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    /// Current checkpoint. A read failure of any kind counts as "nothing
    /// confirmed yet".
    pub fn read_checkpoint(&self) -> Option<String> {
        if let Some(forced) = &self.forced {
            return Some(forced.clone());
        }
        match self.load_checkpoint() {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(path = %self.store.path(), error = %err, "no readable checkpoint");
                None
            }
        }
    }

    /// Like [`read_checkpoint`](Self::read_checkpoint), but only a missing
    /// checkpoint object counts as absent; other failures are returned.
    pub fn read_checkpoint_strict(&self) -> Result<Option<String>> {
        if let Some(forced) = &self.forced {
            return Ok(Some(forced.clone()));
        }
        match self.load_checkpoint() {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_missing() => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn load_checkpoint(&self) -> Result<String> {
        let data = self.store.registry().create(&self.checkpoint)?.load()?;
        let kind = data.kind();
        data.into_text().ok_or(DatasetError::InvalidData {
            dataset: "checkpoint",
            found: kind,
        })
    }

    fn list(&self) -> Result<Arc<Vec<String>>> {
        self.store.listing(|| {
            let checkpoint = self.read_checkpoint();
            let codec = self.store.codec();
            let mut visible: Vec<String> = self
                .store
                .find_matching()?
                .into_iter()
                .filter(|path| Some(path.as_str()) != self.checkpoint_path.as_deref())
                .filter(|path| match &checkpoint {
                    None => true,
                    Some(checkpoint) => self
                        .comparison
                        .matches(&codec.to_partition_id(path), checkpoint),
                })
                .collect();
            self.comparison
                .sort_ids(&mut visible, |path| codec.to_partition_id(path));
            debug!(
                path = %self.store.path(),
                checkpoint = ?checkpoint,
                count = visible.len(),
                "partitions past checkpoint listed"
            );
            Ok(visible)
        })
    }

    /// Ids of the partitions past the checkpoint, in consumption order.
    pub fn partition_ids(&self) -> Result<Vec<String>> {
        let codec = self.store.codec();
        Ok(self
            .list()?
            .iter()
            .map(|path| codec.to_partition_id(path))
            .collect())
    }

    /// Read every partition past the checkpoint.
    ///
    /// Nothing new is not an error: the result is then empty.
    pub fn load(&self) -> Result<BTreeMap<String, Data>> {
        let listing = self.list()?;
        let codec = self.store.codec();
        let mut partitions = BTreeMap::new();
        for path in listing.iter() {
            let data = self.store.instantiate(path)?.load()?;
            partitions.insert(codec.to_partition_id(path), data);
        }
        debug!(path = %self.store.path(), count = partitions.len(), "partitions loaded");
        Ok(partitions)
    }

    /// Write every partition, in partition id order.
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
        self.store.save_partitions(partitions, false)
    }

    /// Move the checkpoint to the last partition of the listing the caller
    /// last observed (the furthest id under the comparison), and return its
    /// id. Does nothing when no partition is
    /// visible.
    pub fn confirm(&self) -> Result<Option<String>> {
        let listing = self.list()?;
        let Some(last) = listing.last() else {
            debug!(path = %self.store.path(), "nothing to confirm");
            return Ok(None);
        };
        let partition_id = self.store.codec().to_partition_id(last);

        let checkpoint = self.store.registry().create(&self.checkpoint)?;
        let value = if checkpoint.type_name() == FileFormat::Json.type_id() {
            Data::Json(Value::String(partition_id.clone()))
        } else {
            Data::Text(partition_id.clone())
        };
        checkpoint.save(value)?;
        info!(path = %self.store.path(), checkpoint = %partition_id, "checkpoint confirmed");

        self.store.invalidate();
        Ok(Some(partition_id))
    }

    /// Whether any partition lies past the checkpoint.
    pub fn exists(&self) -> Result<bool> {
        Ok(!self.list()?.is_empty())
    }

    pub fn release(&self) {
        self.store.invalidate();
    }

    pub fn describe(&self) -> DatasetDescription {
        self.store.describe()
    }
}

/// Default checkpoint definition overlaid with the configured one.
fn checkpoint_descriptor(store: &PartitionStore, overrides: ConfigMap) -> Result<Descriptor> {
    let sep = store.fs().sep();
    let default_path = format!(
        "{}{sep}{DEFAULT_CHECKPOINT_FILENAME}",
        store.normalized().trim_end_matches(sep)
    );

    let mut config = ConfigMap::new();
    config.insert(TYPE_KEY.to_string(), Value::String(DEFAULT_CHECKPOINT_TYPE.to_string()));
    config.insert(DEFAULT_FILEPATH_ARG.to_string(), Value::String(default_path));
    if !store.credentials().is_empty() {
        if overrides.contains_key(CREDENTIALS_KEY) {
            warn!(
                key = CREDENTIALS_KEY,
                owner = "checkpoint",
                "top-level credentials not propagated, the checkpoint declares its own"
            );
        }
        config.insert(
            CREDENTIALS_KEY.to_string(),
            Value::Object(store.credentials().clone()),
        );
    }
    config.extend(overrides);

    let descriptor = Descriptor::parse(DescriptorSpec::Config(config))?;
    ensure_unversioned(&descriptor, "checkpoint")?;
    store.registry().ensure_known(descriptor.type_id())?;
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_fs::{FileSystem, FileSystemRegistry, MemoryFileSystem};

    fn setup() -> (Arc<MemoryFileSystem>, Arc<DatasetRegistry>) {
        let memory = Arc::new(MemoryFileSystem::new());
        let filesystems = FileSystemRegistry::new();
        filesystems.register_instance("memory", memory.clone());
        (memory, Arc::new(DatasetRegistry::new(Arc::new(filesystems))))
    }

    fn object(value: Value) -> ConfigMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_default_checkpoint() {
        let (_, registry) = setup();
        let ds = IncrementalDataset::new(IncrementalConfig::new("memory://inc/", "text"), registry)
            .unwrap();
        let checkpoint = ds.checkpoint_descriptor();
        assert_eq!(checkpoint.type_id(), "text");
        assert_eq!(
            checkpoint.get("filepath"),
            Some(&json!("memory://inc/CHECKPOINT"))
        );
        assert!(ds.read_checkpoint().is_none());
        assert_eq!(ds.read_checkpoint_strict().unwrap(), None);
        assert_eq!(ds.comparison().name(), "gt");
    }

    #[test]
    fn test_checkpoint_is_not_a_partition() {
        let (memory, registry) = setup();
        memory.put("inc/p1", "1");
        memory.put("inc/CHECKPOINT", "p0");
        let ds = IncrementalDataset::new(IncrementalConfig::new("memory://inc", "text"), registry)
            .unwrap();
        assert_eq!(ds.read_checkpoint().as_deref(), Some("p0"));
        assert_eq!(ds.partition_ids().unwrap(), vec!["p1"]);
    }

    #[test]
    fn test_engine_keys_taken_from_checkpoint_mapping() {
        let (_, registry) = setup();
        let config = IncrementalConfig::new("memory://inc", "text").with_checkpoint(object(json!({
            "force_checkpoint": "p5",
            "comparison_func": "ge",
            "filepath": "memory://elsewhere/ckpt"
        })));
        let ds = IncrementalDataset::new(config, registry).unwrap();
        assert_eq!(ds.forced_checkpoint(), Some("p5"));
        assert_eq!(ds.comparison().name(), "ge");
        let checkpoint = ds.checkpoint_descriptor();
        assert!(!checkpoint.contains("force_checkpoint"));
        assert!(!checkpoint.contains("comparison_func"));
        assert_eq!(checkpoint.get("filepath"), Some(&json!("memory://elsewhere/ckpt")));
    }

    #[test]
    fn test_top_level_comparison_wins() {
        let (_, registry) = setup();
        let config = IncrementalConfig::new("memory://inc", "text")
            .with_checkpoint(object(json!({"comparison_func": "ge"})))
            .with_comparison(Comparison::Less);
        let ds = IncrementalDataset::new(config, registry).unwrap();
        assert_eq!(ds.comparison().name(), "lt");
    }

    #[test]
    fn test_versioned_checkpoint_rejected() {
        let (memory, registry) = setup();
        for definition in [json!({"versioned": false}), json!({"version": "v1"})] {
            let config =
                IncrementalConfig::new("memory://inc", "text").with_checkpoint(object(definition));
            let err = IncrementalDataset::new(config, registry.clone()).unwrap_err();
            assert!(matches!(err, DatasetError::Configuration(_)));
        }
        assert_eq!(memory.stats().invalidations, 0);
    }

    #[test]
    fn test_credentials_inherited_unless_declared() {
        let (_, registry) = setup();
        let credentials = object(json!({"token": "top"}));

        let ds = IncrementalDataset::new(
            IncrementalConfig::new("memory://inc", "text").with_credentials(credentials.clone()),
            registry.clone(),
        )
        .unwrap();
        assert_eq!(
            ds.checkpoint_descriptor().get("credentials"),
            Some(&json!({"token": "top"}))
        );

        let ds = IncrementalDataset::new(
            IncrementalConfig::new("memory://inc", "text")
                .with_credentials(credentials)
                .with_checkpoint(object(json!({"credentials": {"token": "own"}}))),
            registry,
        )
        .unwrap();
        assert_eq!(
            ds.checkpoint_descriptor().get("credentials"),
            Some(&json!({"token": "own"}))
        );
    }

    #[test]
    fn test_unreadable_checkpoint_counts_as_absent() {
        let (memory, registry) = setup();
        memory.put("inc/a", "1");
        memory.put("inc/CHECKPOINT", vec![0xff, 0xfe]);
        let ds = IncrementalDataset::new(IncrementalConfig::new("memory://inc", "text"), registry)
            .unwrap();
        assert!(ds.read_checkpoint().is_none());
        assert!(matches!(
            ds.read_checkpoint_strict(),
            Err(DatasetError::Decode { .. })
        ));
        assert_eq!(ds.partition_ids().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_json_checkpoint() {
        let (memory, registry) = setup();
        memory.put("inc/2023-01-01", "x");
        let config = IncrementalConfig::new("memory://inc", "text").with_checkpoint(object(json!({
            "type": "json",
            "filepath": "memory://state/inc.json"
        })));
        let ds = IncrementalDataset::new(config, registry).unwrap();
        assert_eq!(ds.confirm().unwrap().as_deref(), Some("2023-01-01"));
        assert_eq!(
            memory.read("memory://state/inc.json").unwrap().to_vec(),
            b"\"2023-01-01\"".to_vec()
        );
        assert_eq!(ds.read_checkpoint().as_deref(), Some("2023-01-01"));
        assert!(ds.load().unwrap().is_empty());
    }
}
