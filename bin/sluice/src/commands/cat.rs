//! Cat command - print one partition to stdout.

use anyhow::{Context, Result};
use sluice_core::Data;
use sluice_datasets::DatasetRegistry;
use std::io::Write;
use std::sync::Arc;

use crate::catalog::Catalog;

pub fn execute(
    catalog: &Catalog,
    registry: Arc<DatasetRegistry>,
    entry: &str,
    partition: &str,
) -> Result<()> {
    let data = catalog
        .open(entry, registry)?
        .read(partition)
        .with_context(|| format!("failed to read {entry}/{partition}"))?;

    let mut stdout = std::io::stdout().lock();
    match data {
        Data::Text(text) => stdout.write_all(text.as_bytes())?,
        Data::Bytes(raw) => stdout.write_all(&raw)?,
        Data::Json(value) => writeln!(stdout, "{}", serde_json::to_string_pretty(&value)?)?,
    }
    stdout.flush()?;
    Ok(())
}
