//! `sluice` - operate partitioned datasets declared in a JSON catalog.
//!
//! ```text
//! sluice --catalog catalog.json ls
//! sluice --catalog catalog.json ls raw_events --format json
//! sluice --catalog catalog.json cat raw_events 2023-01-05
//! sluice --catalog catalog.json put reports 2023/q1 --file q1.txt
//! sluice --catalog catalog.json confirm raw_events
//! ```

mod catalog;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sluice_datasets::DatasetRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;

#[derive(Debug, Parser)]
#[command(name = "sluice")]
#[command(about = "Inspect and drive partitioned datasets")]
struct Args {
    /// Catalog file declaring the datasets
    #[arg(long, default_value = "catalog.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalog entries, or the partitions of one entry
    Ls {
        entry: Option<String>,

        /// Output format: table or json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Print one partition
    Cat { entry: String, partition: String },

    /// Write one partition
    Put {
        entry: String,
        partition: String,

        /// Read the content from this file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Use this string as the content
        #[arg(long)]
        text: Option<String>,
    },

    /// Advance the checkpoint of an incremental entry
    Confirm { entry: String },

    /// Show the configuration of an entry
    Describe { entry: String },

    /// Exit with status 1 when an entry has no visible partitions
    Exists { entry: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let catalog = Catalog::load(&args.catalog)?;
    let registry = Arc::new(DatasetRegistry::default());
    debug!(catalog = %args.catalog.display(), types = ?registry.type_ids(), "catalog loaded");

    match args.command {
        Command::Ls { entry, format } => commands::list::execute(&catalog, registry, entry, format),
        Command::Cat { entry, partition } => {
            commands::cat::execute(&catalog, registry, &entry, &partition)
        }
        Command::Put {
            entry,
            partition,
            file,
            text,
        } => commands::put::execute(&catalog, registry, &entry, &partition, file, text),
        Command::Confirm { entry } => commands::confirm::execute(&catalog, registry, &entry),
        Command::Describe { entry } => commands::describe::execute(&catalog, registry, &entry),
        Command::Exists { entry } => {
            if !commands::describe::exists(&catalog, registry, &entry)? {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
