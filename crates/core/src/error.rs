use thiserror::Error;

/// Result type for dataset operations.
pub type Result<T, E = DatasetError> = std::result::Result<T, E>;

/// Errors raised by datasets, filesystems and the partitioned engines.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Invalid construction arguments. Raised before any I/O happens.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A partitioned dataset found nothing to load.
    #[error("{0}")]
    NotFound(String),

    /// A single object is absent from storage.
    #[error("'{0}' does not exist")]
    Missing(String),

    #[error("I/O failure on '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode '{path}': {reason}")]
    Decode { path: String, reason: String },

    #[error("{dataset} dataset cannot store {found} data")]
    InvalidData {
        dataset: &'static str,
        found: &'static str,
    },

    #[error("no filesystem registered for protocol '{0}'")]
    UnsupportedProtocol(String),
}

impl DatasetError {
    /// Wrap an I/O error, mapping `NotFound` to [`DatasetError::Missing`].
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            DatasetError::Missing(path)
        } else {
            DatasetError::Io { path, source }
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        DatasetError::Configuration(msg.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DatasetError::Missing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_missing() {
        let err = DatasetError::io(
            "a/b",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_missing());
        assert_eq!(err.to_string(), "'a/b' does not exist");

        let err = DatasetError::io(
            "a/b",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
