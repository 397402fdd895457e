//! Core types shared across the framework.
//!
//! Everything above the storage layer speaks in terms of:
//! - [`Data`]: the payload a dataset loads or saves
//! - [`Descriptor`]: a dataset type id plus its constructor arguments
//! - [`Dataset`]: a loadable/saveable object bound to one storage location
//! - [`DatasetError`]: the error taxonomy surfaced to the orchestration layer

mod data;
mod descriptor;
mod error;

pub use data::Data;
pub use descriptor::{
    ConfigMap, Descriptor, DescriptorSpec, CREDENTIALS_KEY, FS_ARGS_KEY, TYPE_KEY,
    VERSIONED_FLAG_KEY, VERSION_KEY,
};
pub use error::{DatasetError, Result};

/// A dataset bound to a single storage location.
///
/// Implementations are constructed from a [`Descriptor`] by a registry and
/// are cheap to create; callers may build a fresh instance per operation.
pub trait Dataset: Send + Sync {
    /// Read the payload from storage.
    fn load(&self) -> Result<Data>;

    /// Write the payload to storage, replacing what was there.
    fn save(&self, data: Data) -> Result<()>;

    /// Whether the backing object exists.
    fn exists(&self) -> Result<bool>;

    /// Short type name used in descriptions and log lines.
    fn type_name(&self) -> &'static str;
}
