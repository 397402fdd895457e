//! List command - catalog entries, or the partitions of one entry.

use anyhow::Result;
use sluice_datasets::DatasetRegistry;
use std::sync::Arc;

use crate::catalog::Catalog;

pub fn execute(
    catalog: &Catalog,
    registry: Arc<DatasetRegistry>,
    entry: Option<String>,
    format: String,
) -> Result<()> {
    let Some(entry) = entry else {
        if format == "json" {
            return print_entries_json(catalog);
        }
        print_entries_table(catalog);
        return Ok(());
    };

    let ids = catalog.open(&entry, registry)?.partition_ids()?;
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        println!("Partitions of {} ({})", entry, ids.len());
        println!("{}", "-".repeat(60));
        for id in &ids {
            println!("{id}");
        }
    }
    Ok(())
}

fn print_entries_table(catalog: &Catalog) {
    let entries: Vec<_> = catalog.entries().collect();
    println!("Entries ({})", entries.len());
    println!("{}", "=".repeat(80));
    println!("{:<25} {:<12} {}", "Name", "Kind", "Path");
    println!("{}", "-".repeat(80));

    for (name, entry) in entries {
        println!(
            "{:<25} {:<12} {}",
            truncate(name, 25),
            entry.kind(),
            entry.path()
        );
    }
}

fn truncate(name: &str, width: usize) -> String {
    name.chars().take(width).collect()
}

fn print_entries_json(catalog: &Catalog) -> Result<()> {
    let json: Vec<serde_json::Value> = catalog
        .entries()
        .map(|(name, entry)| {
            serde_json::json!({
                "name": name,
                "kind": entry.kind(),
                "path": entry.path(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
