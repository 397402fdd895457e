//! Engine configuration.

use serde::{Deserialize, Serialize};
use sluice_core::{ConfigMap, DescriptorSpec};
use sluice_fs::FindOptions;

use crate::comparison::Comparison;

/// Argument under which each partition's path is passed to its dataset.
pub const DEFAULT_FILEPATH_ARG: &str = "filepath";
/// Dataset type of the default checkpoint.
pub const DEFAULT_CHECKPOINT_TYPE: &str = "text";
/// File name of the default checkpoint, placed directly under the root.
pub const DEFAULT_CHECKPOINT_FILENAME: &str = "CHECKPOINT";
/// Checkpoint mapping key carrying a forced checkpoint value.
pub const FORCE_CHECKPOINT_KEY: &str = "force_checkpoint";
/// Checkpoint mapping key carrying a named comparison.
pub const COMPARISON_KEY: &str = "comparison_func";

fn default_filepath_arg() -> String {
    DEFAULT_FILEPATH_ARG.to_string()
}

/// Options shared by both engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Root of the partitions, optionally prefixed with a protocol.
    pub path: String,
    /// Dataset every partition is loaded and saved with.
    pub dataset: DescriptorSpec,
    #[serde(default = "default_filepath_arg")]
    pub filepath_arg: String,
    /// Only paths ending with this suffix are partitions. Empty means all.
    #[serde(default)]
    pub filename_suffix: String,
    /// Passed to the filesystem and, unless they declare their own, to the
    /// partition datasets and the checkpoint.
    #[serde(default)]
    pub credentials: ConfigMap,
    /// Passed to the filesystem listing.
    #[serde(default)]
    pub load_args: FindOptions,
    #[serde(default)]
    pub fs_args: ConfigMap,
}

impl SourceConfig {
    pub fn new(path: impl Into<String>, dataset: impl Into<DescriptorSpec>) -> Self {
        Self {
            path: path.into(),
            dataset: dataset.into(),
            filepath_arg: default_filepath_arg(),
            filename_suffix: String::new(),
            credentials: ConfigMap::new(),
            load_args: FindOptions::default(),
            fs_args: ConfigMap::new(),
        }
    }
}

macro_rules! source_builders {
    ($config:ty) => {
        impl $config {
            pub fn with_filepath_arg(mut self, arg: impl Into<String>) -> Self {
                self.source.filepath_arg = arg.into();
                self
            }

            pub fn with_filename_suffix(mut self, suffix: impl Into<String>) -> Self {
                self.source.filename_suffix = suffix.into();
                self
            }

            pub fn with_credentials(mut self, credentials: ConfigMap) -> Self {
                self.source.credentials = credentials;
                self
            }

            pub fn with_load_args(mut self, load_args: FindOptions) -> Self {
                self.source.load_args = load_args;
                self
            }

            pub fn with_fs_args(mut self, fs_args: ConfigMap) -> Self {
                self.source.fs_args = fs_args;
                self
            }
        }
    };
}

/// Configuration of a [`PartitionedDataset`](crate::PartitionedDataset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionedConfig {
    #[serde(flatten)]
    pub source: SourceConfig,
    /// Remove the whole root before saving.
    #[serde(default)]
    pub overwrite: bool,
}

impl PartitionedConfig {
    pub fn new(path: impl Into<String>, dataset: impl Into<DescriptorSpec>) -> Self {
        Self {
            source: SourceConfig::new(path, dataset),
            overwrite: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

source_builders!(PartitionedConfig);

/// Checkpoint as configured: a forced value, or a dataset mapping.
///
/// The mapping may also carry `force_checkpoint` and `comparison_func`,
/// which the engine consumes. A mapping without `type` keeps the default
/// `text` checkpoint and only overrides its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckpointSpec {
    Forced(String),
    Config(ConfigMap),
}

impl From<&str> for CheckpointSpec {
    fn from(value: &str) -> Self {
        CheckpointSpec::Forced(value.to_string())
    }
}

impl From<ConfigMap> for CheckpointSpec {
    fn from(value: ConfigMap) -> Self {
        CheckpointSpec::Config(value)
    }
}

/// Configuration of an [`IncrementalDataset`](crate::IncrementalDataset).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalConfig {
    #[serde(flatten)]
    pub source: SourceConfig,
    #[serde(default)]
    pub checkpoint: Option<CheckpointSpec>,
    /// Takes precedence over a comparison given inside the checkpoint mapping.
    #[serde(default)]
    pub comparison_func: Option<Comparison>,
}

impl IncrementalConfig {
    pub fn new(path: impl Into<String>, dataset: impl Into<DescriptorSpec>) -> Self {
        Self {
            source: SourceConfig::new(path, dataset),
            checkpoint: None,
            comparison_func: None,
        }
    }

    pub fn with_checkpoint(mut self, checkpoint: impl Into<CheckpointSpec>) -> Self {
        self.checkpoint = Some(checkpoint.into());
        self
    }

    pub fn with_forced_checkpoint(self, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.with_checkpoint(CheckpointSpec::Forced(value))
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison_func = Some(comparison);
        self
    }
}

source_builders!(IncrementalConfig);
