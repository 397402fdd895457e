//! File-backed datasets.

use serde::Deserialize;
use sluice_core::{ConfigMap, Data, Dataset, DatasetError, Result};
use sluice_fs::{FileSystem, FileSystemRegistry, FsOptions};
use std::sync::Arc;
use tracing::debug;

/// How a file's bytes map to [`Data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Text,
    Bytes,
    Json,
}

impl FileFormat {
    pub fn type_id(self) -> &'static str {
        match self {
            FileFormat::Text => "text",
            FileFormat::Bytes => "bytes",
            FileFormat::Json => "json",
        }
    }
}

/// Constructor arguments accepted by the built-in file datasets.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDatasetConfig {
    /// Location of the file, optionally prefixed with a protocol.
    pub filepath: String,
    #[serde(default)]
    pub credentials: ConfigMap,
    #[serde(default)]
    pub fs_args: ConfigMap,
}

impl FileDatasetConfig {
    pub fn from_config(type_id: &str, config: &ConfigMap) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(config.clone())).map_err(|e| {
            DatasetError::config(format!("invalid arguments for '{type_id}' dataset: {e}"))
        })
    }
}

/// A dataset stored as a single file.
#[derive(Debug)]
pub struct FileDataset {
    format: FileFormat,
    filepath: String,
    fs: Arc<dyn FileSystem>,
}

impl FileDataset {
    /// Build a dataset, resolving the filesystem from the protocol of `filepath`.
    pub fn open(
        format: FileFormat,
        config: &ConfigMap,
        filesystems: &FileSystemRegistry,
    ) -> Result<Self> {
        let FileDatasetConfig {
            filepath,
            credentials,
            fs_args,
        } = FileDatasetConfig::from_config(format.type_id(), config)?;
        let fs = filesystems.resolve_path(&filepath, &FsOptions::new(credentials, fs_args))?;
        Ok(Self {
            format,
            filepath,
            fs,
        })
    }

    pub fn filepath(&self) -> &str {
        &self.filepath
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn decode(&self, raw: bytes::Bytes) -> Result<Data> {
        match self.format {
            FileFormat::Bytes => Ok(Data::Bytes(raw)),
            FileFormat::Text => String::from_utf8(raw.to_vec())
                .map(Data::Text)
                .map_err(|e| DatasetError::Decode {
                    path: self.filepath.clone(),
                    reason: e.to_string(),
                }),
            FileFormat::Json => serde_json::from_slice(&raw)
                .map(Data::Json)
                .map_err(|e| DatasetError::Decode {
                    path: self.filepath.clone(),
                    reason: e.to_string(),
                }),
        }
    }

    fn encode(&self, data: &Data) -> Result<Vec<u8>> {
        match (self.format, data) {
            (FileFormat::Bytes, _) => Ok(data.to_bytes().to_vec()),
            (FileFormat::Text, Data::Text(s)) => Ok(s.as_bytes().to_vec()),
            (FileFormat::Json, Data::Json(v)) => serde_json::to_vec_pretty(v).map_err(|e| {
                DatasetError::Decode {
                    path: self.filepath.clone(),
                    reason: e.to_string(),
                }
            }),
            (format, other) => Err(DatasetError::InvalidData {
                dataset: format.type_id(),
                found: other.kind(),
            }),
        }
    }
}

impl Dataset for FileDataset {
    fn load(&self) -> Result<Data> {
        let raw = self.fs.read(&self.filepath)?;
        debug!(path = %self.filepath, bytes = raw.len(), "file loaded");
        self.decode(raw)
    }

    fn save(&self, data: Data) -> Result<()> {
        let encoded = self.encode(&data)?;
        self.fs.write(&self.filepath, &encoded)?;
        debug!(path = %self.filepath, bytes = encoded.len(), "file saved");
        Ok(())
    }

    fn exists(&self) -> Result<bool> {
        self.fs.exists(&self.filepath)
    }

    fn type_name(&self) -> &'static str {
        self.format.type_id()
    }
}
