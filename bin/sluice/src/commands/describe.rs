//! Describe and exists commands.

use anyhow::Result;
use sluice_datasets::DatasetRegistry;
use std::sync::Arc;

use crate::catalog::{Catalog, Entry};

pub fn execute(catalog: &Catalog, registry: Arc<DatasetRegistry>, entry: &str) -> Result<()> {
    let opened = catalog.open(entry, registry)?;
    let mut description = serde_json::to_value(opened.describe())?;
    if let (Entry::Incremental(ds), Some(fields)) = (&opened, description.as_object_mut()) {
        fields.insert(
            "checkpoint".to_string(),
            serde_json::to_value(ds.checkpoint_descriptor().redacted_config())?,
        );
        fields.insert(
            "checkpoint_type".to_string(),
            ds.checkpoint_descriptor().type_id().into(),
        );
        fields.insert("comparison".to_string(), ds.comparison().name().into());
        if let Some(forced) = ds.forced_checkpoint() {
            fields.insert("forced_checkpoint".to_string(), forced.into());
        }
    }
    println!("{}", serde_json::to_string_pretty(&description)?);
    Ok(())
}

pub fn exists(catalog: &Catalog, registry: Arc<DatasetRegistry>, entry: &str) -> Result<bool> {
    let exists = catalog.open(entry, registry)?.exists()?;
    println!("{exists}");
    Ok(exists)
}
