//! Put command - write one partition from a file or inline text.

use anyhow::{bail, Context, Result};
use sluice_core::Data;
use sluice_datasets::DatasetRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;

pub fn execute(
    catalog: &Catalog,
    registry: Arc<DatasetRegistry>,
    entry: &str,
    partition: &str,
    file: Option<PathBuf>,
    text: Option<String>,
) -> Result<()> {
    let raw = match (file, text) {
        (Some(path), _) => std::fs::read(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(text)) => text.into_bytes(),
        (None, None) => bail!("either --file or --text is required"),
    };

    let opened = catalog.open(entry, registry)?;
    let data = to_data(&opened.describe().dataset_type, raw)?;
    opened
        .write(partition, data)
        .with_context(|| format!("failed to write {entry}/{partition}"))?;

    info!(entry = %entry, partition = %partition, "partition written");
    Ok(())
}

/// Shape raw input for the entry's dataset type.
fn to_data(dataset_type: &str, raw: Vec<u8>) -> Result<Data> {
    Ok(match dataset_type {
        "json" => Data::Json(serde_json::from_slice(&raw).context("input is not valid JSON")?),
        "text" => Data::Text(String::from_utf8(raw).context("input is not valid UTF-8")?),
        _ => Data::from(raw),
    })
}
