//! Partitioned datasets.
//!
//! A partitioned dataset is a directory (or object-store prefix) of files
//! read and written through one underlying dataset type, each file being a
//! partition keyed by its path relative to the root.
//!
//! - [`PartitionedDataset`]: lazy loads, batch saves, optional overwrite
//! - [`IncrementalDataset`]: eager loads of the partitions past a stored
//!   checkpoint, advanced with [`IncrementalDataset::confirm`]
//!
//! # Example
//!
//! ```ignore
//! use sluice_datasets::DatasetRegistry;
//! use sluice_partitioned::{IncrementalConfig, IncrementalDataset};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(DatasetRegistry::default());
//! let events = IncrementalDataset::new(
//!     IncrementalConfig::new("data/events", "json").with_filename_suffix(".json"),
//!     registry,
//! )?;
//! for (id, event) in events.load()? {
//!     process(&id, event)?;
//! }
//! events.confirm()?;
//! ```

mod cache;
mod codec;
mod comparison;
mod config;
mod incremental;
mod partitioned;
mod store;

pub use cache::ListingCache;
pub use codec::PartitionPathCodec;
pub use comparison::{Comparison, ComparisonFn};
pub use config::{
    CheckpointSpec, IncrementalConfig, PartitionedConfig, SourceConfig, COMPARISON_KEY,
    DEFAULT_CHECKPOINT_FILENAME, DEFAULT_CHECKPOINT_TYPE, DEFAULT_FILEPATH_ARG,
    FORCE_CHECKPOINT_KEY,
};
pub use incremental::IncrementalDataset;
pub use partitioned::{LoadFn, PartitionedDataset};
pub use store::{DatasetDescription, PartitionInput};
