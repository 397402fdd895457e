#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::Value;
use sluice_core::{ConfigMap, Data, Dataset, DatasetError, Result};
use sluice_datasets::DatasetRegistry;
use sluice_fs::{FileSystemRegistry, MemoryFileSystem};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry whose `memory` protocol is served by the returned store.
pub fn memory_registry() -> (Arc<MemoryFileSystem>, Arc<DatasetRegistry>) {
    init_tracing();
    let memory = Arc::new(MemoryFileSystem::new());
    let filesystems = FileSystemRegistry::new();
    filesystems.register_instance("memory", memory.clone());
    (memory, Arc::new(DatasetRegistry::new(Arc::new(filesystems))))
}

/// Registry whose `s3` protocol (and its aliases) is served by the returned store.
pub fn s3_registry() -> (Arc<MemoryFileSystem>, Arc<DatasetRegistry>) {
    init_tracing();
    let s3 = Arc::new(MemoryFileSystem::with_protocol("s3"));
    let filesystems = FileSystemRegistry::new();
    filesystems.register_instance("s3", s3.clone());
    (s3, Arc::new(DatasetRegistry::new(Arc::new(filesystems))))
}

pub fn object(value: Value) -> ConfigMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// One call observed by a [`RecordingDataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub op: &'static str,
    pub filepath: String,
    pub config: ConfigMap,
}

pub type Recorder = Arc<Mutex<Vec<Recorded>>>;

/// Dataset that stores nothing and logs every call with its arguments.
#[derive(Debug)]
struct RecordingDataset {
    filepath: String,
    config: ConfigMap,
    log: Recorder,
}

impl RecordingDataset {
    fn record(&self, op: &'static str) {
        self.log.lock().push(Recorded {
            op,
            filepath: self.filepath.clone(),
            config: self.config.clone(),
        });
    }
}

impl Dataset for RecordingDataset {
    fn load(&self) -> Result<Data> {
        self.record("load");
        Ok(Data::Text(self.filepath.clone()))
    }

    fn save(&self, _data: Data) -> Result<()> {
        self.record("save");
        Ok(())
    }

    fn exists(&self) -> Result<bool> {
        Ok(true)
    }

    fn type_name(&self) -> &'static str {
        "recording"
    }
}

/// Register the `recording` dataset type and return its call log.
pub fn register_recording(registry: &DatasetRegistry) -> Recorder {
    let log: Recorder = Arc::new(Mutex::new(Vec::new()));
    let shared = log.clone();
    registry.register("recording", move |config, _filesystems| {
        let filepath = config
            .get("filepath")
            .and_then(Value::as_str)
            .ok_or_else(|| DatasetError::config("recording dataset needs a filepath"))?
            .to_string();
        Ok(Arc::new(RecordingDataset {
            filepath,
            config: config.clone(),
            log: shared.clone(),
        }) as Arc<dyn Dataset>)
    });
    log
}
