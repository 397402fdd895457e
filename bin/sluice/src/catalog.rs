//! JSON catalog of named partitioned datasets.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use sluice_core::Data;
use sluice_datasets::DatasetRegistry;
use sluice_partitioned::{
    DatasetDescription, IncrementalConfig, IncrementalDataset, PartitionInput, PartitionedConfig,
    PartitionedDataset,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// One catalog entry, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CatalogEntry {
    Partitioned(PartitionedConfig),
    Incremental(IncrementalConfig),
}

impl CatalogEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogEntry::Partitioned(_) => "partitioned",
            CatalogEntry::Incremental(_) => "incremental",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            CatalogEntry::Partitioned(config) => &config.source.path,
            CatalogEntry::Incremental(config) => &config.source.path,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let entries = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &CatalogEntry)> {
        self.entries.iter()
    }

    /// Build the dataset behind `name`.
    pub fn open(&self, name: &str, registry: Arc<DatasetRegistry>) -> Result<Entry> {
        let Some(entry) = self.entries.get(name) else {
            let known: Vec<&str> = self.entries.keys().map(String::as_str).collect();
            bail!("no catalog entry named '{name}' (known: {})", known.join(", "));
        };
        let opened = match entry.clone() {
            CatalogEntry::Partitioned(config) => {
                Entry::Partitioned(PartitionedDataset::new(config, registry)?)
            }
            CatalogEntry::Incremental(config) => {
                Entry::Incremental(IncrementalDataset::new(config, registry)?)
            }
        };
        Ok(opened)
    }
}

/// An opened catalog entry.
#[derive(Debug)]
pub enum Entry {
    Partitioned(PartitionedDataset),
    Incremental(IncrementalDataset),
}

impl Entry {
    pub fn partition_ids(&self) -> Result<Vec<String>> {
        Ok(match self {
            Entry::Partitioned(ds) => ds.partition_ids()?,
            Entry::Incremental(ds) => ds.partition_ids()?,
        })
    }

    /// Load one visible partition.
    pub fn read(&self, partition_id: &str) -> Result<Data> {
        match self {
            Entry::Partitioned(ds) => {
                let partitions = ds.load()?;
                let Some(load) = partitions.get(partition_id) else {
                    bail!("no partition '{partition_id}' in '{}'", ds.path());
                };
                Ok(load()?)
            }
            Entry::Incremental(ds) => {
                let mut partitions = ds.load()?;
                let Some(data) = partitions.remove(partition_id) else {
                    bail!(
                        "no partition '{partition_id}' past the checkpoint of '{}'",
                        ds.path()
                    );
                };
                Ok(data)
            }
        }
    }

    pub fn write(&self, partition_id: &str, data: Data) -> Result<()> {
        let partitions = [(partition_id.to_string(), PartitionInput::from(data))];
        match self {
            Entry::Partitioned(ds) => ds.save(partitions)?,
            Entry::Incremental(ds) => ds.save(partitions)?,
        }
        Ok(())
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(match self {
            Entry::Partitioned(ds) => ds.exists()?,
            Entry::Incremental(ds) => ds.exists()?,
        })
    }

    pub fn describe(&self) -> DatasetDescription {
        match self {
            Entry::Partitioned(ds) => ds.describe(),
            Entry::Incremental(ds) => ds.describe(),
        }
    }
}
