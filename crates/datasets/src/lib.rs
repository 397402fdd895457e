//! Dataset registry and built-in datasets.
//!
//! A [`DatasetRegistry`] turns a [`Descriptor`](sluice_core::Descriptor)
//! into a live [`Dataset`](sluice_core::Dataset). Built-in types:
//! - `text`: a UTF-8 file
//! - `bytes`: a raw file
//! - `json`: a JSON document
//!
//! # Example
//!
//! ```ignore
//! use sluice_datasets::DatasetRegistry;
//! use sluice_core::{Descriptor, DescriptorSpec};
//!
//! let registry = DatasetRegistry::default();
//! let descriptor = Descriptor::parse(DescriptorSpec::from("text"))?
//!     .with("filepath", "data/notes.txt".into());
//! let dataset = registry.create(&descriptor)?;
//! dataset.save("hello".into())?;
//! ```

mod file;
mod registry;

pub use file::{FileDataset, FileDatasetConfig, FileFormat};
pub use registry::{DatasetFactory, DatasetRegistry};
