//! Dataset descriptors: a type id plus constructor arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DatasetError, Result};

/// Constructor arguments of a dataset.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Key holding the dataset type id in a descriptor mapping.
pub const TYPE_KEY: &str = "type";
/// Key under which credentials are passed to a dataset.
pub const CREDENTIALS_KEY: &str = "credentials";
/// Key under which filesystem arguments are passed to a dataset.
pub const FS_ARGS_KEY: &str = "fs_args";
/// Key marking a pinned dataset version.
pub const VERSION_KEY: &str = "version";
/// Flag requesting dataset versioning.
pub const VERSIONED_FLAG_KEY: &str = "versioned";

/// A descriptor as written in configuration: either a bare type id or a
/// mapping with a `type` key and the remaining constructor arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorSpec {
    Type(String),
    Config(ConfigMap),
}

impl From<&str> for DescriptorSpec {
    fn from(value: &str) -> Self {
        DescriptorSpec::Type(value.to_string())
    }
}

impl From<String> for DescriptorSpec {
    fn from(value: String) -> Self {
        DescriptorSpec::Type(value)
    }
}

impl From<ConfigMap> for DescriptorSpec {
    fn from(value: ConfigMap) -> Self {
        DescriptorSpec::Config(value)
    }
}

impl From<Descriptor> for DescriptorSpec {
    fn from(value: Descriptor) -> Self {
        let mut config = value.config;
        config.insert(TYPE_KEY.to_string(), Value::String(value.type_id));
        DescriptorSpec::Config(config)
    }
}

/// A parsed dataset descriptor.
///
/// Descriptors are plain values: every per-partition instantiation works on
/// its own clone, so injecting a path never leaks into other partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    type_id: String,
    config: ConfigMap,
}

impl Descriptor {
    pub fn new(type_id: impl Into<String>, config: ConfigMap) -> Self {
        Self {
            type_id: type_id.into(),
            config,
        }
    }

    /// Parse a configured descriptor.
    ///
    /// A `versioned: true` flag is turned into an empty `version` entry, so
    /// [`Descriptor::requests_versioning`] only has to look for one key.
    pub fn parse(spec: DescriptorSpec) -> Result<Self> {
        let mut config = match spec {
            DescriptorSpec::Type(type_id) => return Ok(Self::new(type_id, ConfigMap::new())),
            DescriptorSpec::Config(config) => config,
        };

        let type_id = match config.remove(TYPE_KEY) {
            Some(Value::String(type_id)) if !type_id.is_empty() => type_id,
            Some(other) => {
                return Err(DatasetError::config(format!(
                    "'{TYPE_KEY}' must be a non-empty string, got {other}"
                )))
            }
            None => {
                return Err(DatasetError::config(format!(
                    "'{TYPE_KEY}' is missing from the dataset definition"
                )))
            }
        };

        match config.remove(VERSIONED_FLAG_KEY) {
            None | Some(Value::Bool(false)) => {}
            Some(Value::Bool(true)) => {
                config.entry(VERSION_KEY).or_insert(Value::Null);
            }
            Some(other) => {
                return Err(DatasetError::config(format!(
                    "'{VERSIONED_FLAG_KEY}' must be a boolean, got {other}"
                )))
            }
        }

        Ok(Self::new(type_id, config))
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn config(&self) -> &ConfigMap {
        &self.config
    }

    pub fn contains(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.config.insert(key.into(), value)
    }

    /// Return a copy with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: Value) -> Self {
        let mut copy = self.clone();
        copy.insert(key, value);
        copy
    }

    /// Whether the descriptor asks for dataset-level versioning.
    pub fn requests_versioning(&self) -> bool {
        self.config.contains_key(VERSION_KEY)
    }

    /// Constructor arguments with credentials removed.
    pub fn redacted_config(&self) -> ConfigMap {
        self.config
            .iter()
            .filter(|(key, _)| key.as_str() != CREDENTIALS_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
