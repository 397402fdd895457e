//! Confirm command - advance an incremental entry's checkpoint.

use anyhow::{bail, Result};
use sluice_datasets::DatasetRegistry;
use std::sync::Arc;

use crate::catalog::{Catalog, Entry};

pub fn execute(catalog: &Catalog, registry: Arc<DatasetRegistry>, entry: &str) -> Result<()> {
    let Entry::Incremental(ds) = catalog.open(entry, registry)? else {
        bail!("'{entry}' is not an incremental entry, it has no checkpoint");
    };

    match ds.confirm()? {
        Some(checkpoint) => println!("{entry}: checkpoint at {checkpoint}"),
        None => println!("{entry}: nothing new to confirm"),
    }
    Ok(())
}
