//! Mapping between partition ids and storage paths.

use sluice_fs::{FileSystem, StoragePath};

/// Converts partition ids to storage paths under a root and back.
///
/// Listings come back protocol-stripped; paths handed to datasets carry the
/// root's protocol again when the root was given with one, since some
/// consumers need the full URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPathCodec {
    /// Explicit scheme of the root, as given.
    scheme: Option<String>,
    /// Root with the protocol and trailing separator removed.
    stripped_root: String,
    sep: String,
    suffix: String,
}

impl PartitionPathCodec {
    pub fn new(root: &StoragePath, fs: &dyn FileSystem, filename_suffix: impl Into<String>) -> Self {
        Self {
            scheme: root.scheme().map(str::to_string),
            stripped_root: fs.strip_protocol(&root.normalized()),
            sep: fs.sep().to_string(),
            suffix: filename_suffix.into(),
        }
    }

    pub fn stripped_root(&self) -> &str {
        &self.stripped_root
    }

    pub fn filename_suffix(&self) -> &str {
        &self.suffix
    }

    /// Whether a listed path passes the filename suffix filter.
    pub fn matches_suffix(&self, path: &str) -> bool {
        path.ends_with(&self.suffix)
    }

    /// Full storage path of a partition, suffix and protocol included.
    pub fn to_storage_path(&self, partition_id: &str) -> String {
        let id = partition_id.trim_start_matches(self.sep.as_str());
        let joined = if self.stripped_root.is_empty() {
            format!("{id}{}", self.suffix)
        } else {
            format!(
                "{}{}{id}{}",
                self.stripped_root.trim_end_matches(self.sep.as_str()),
                self.sep,
                self.suffix
            )
        };
        self.join_protocol(&joined)
    }

    /// Partition id of a listed path: the part after the root, without the
    /// leading separator and with the suffix removed once.
    ///
    /// A path outside the root yields its unstripped remainder.
    pub fn to_partition_id(&self, path: &str) -> String {
        let remainder = match path.split_once(self.stripped_root.as_str()) {
            Some((_, rest)) if !self.stripped_root.is_empty() => rest,
            _ => path,
        };
        let remainder = remainder.trim_start_matches(self.sep.as_str());
        match remainder.strip_suffix(self.suffix.as_str()) {
            Some(stripped) if !self.suffix.is_empty() => stripped.to_string(),
            _ => remainder.to_string(),
        }
    }

    /// Put the root's protocol back in front of a stripped path.
    pub fn join_protocol(&self, path: &str) -> String {
        match &self.scheme {
            Some(scheme) if !path.starts_with(&format!("{scheme}://")) => {
                format!("{scheme}://{path}")
            }
            _ => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_fs::{LocalFileSystem, MemoryFileSystem};

    fn local(root: &str, suffix: &str) -> PartitionPathCodec {
        PartitionPathCodec::new(&StoragePath::parse(root), &LocalFileSystem::new(), suffix)
    }

    fn s3(root: &str, suffix: &str) -> PartitionPathCodec {
        PartitionPathCodec::new(
            &StoragePath::parse(root),
            &MemoryFileSystem::with_protocol("s3"),
            suffix,
        )
    }

    #[test]
    fn test_local_round_trip() {
        let codec = local("data/parts/", ".csv");
        assert_eq!(codec.to_storage_path("2023/01"), "data/parts/2023/01.csv");
        assert_eq!(codec.to_partition_id("data/parts/2023/01.csv"), "2023/01");
        for id in ["a", "nested/b", "c.d"] {
            assert_eq!(codec.to_partition_id(&codec.to_storage_path(id)), id);
        }
    }

    #[test]
    fn test_leading_separator_in_id() {
        let codec = local("data/parts", "");
        assert_eq!(codec.to_storage_path("/p1"), "data/parts/p1");
    }

    #[test]
    fn test_protocol_is_rejoined() {
        let codec = s3("s3://bucket/parts", ".csv");
        assert_eq!(codec.stripped_root(), "bucket/parts");
        assert_eq!(codec.to_storage_path("a"), "s3://bucket/parts/a.csv");
        assert_eq!(codec.join_protocol("bucket/parts/a.csv"), "s3://bucket/parts/a.csv");
        assert_eq!(codec.join_protocol("s3://bucket/parts/a.csv"), "s3://bucket/parts/a.csv");
        assert_eq!(codec.to_partition_id("bucket/parts/a.csv"), "a");
        assert_eq!(codec.to_partition_id("s3://bucket/parts/a.csv"), "a");
    }

    #[test]
    fn test_aliased_scheme_kept_as_given() {
        let codec = s3("s3a://bucket/parts", "");
        assert_eq!(codec.stripped_root(), "bucket/parts");
        assert_eq!(codec.to_storage_path("x"), "s3a://bucket/parts/x");
        assert_eq!(codec.to_partition_id("bucket/parts/x"), "x");
    }

    #[test]
    fn test_suffix_stripped_once() {
        let codec = local("root", ".csv");
        assert_eq!(codec.to_partition_id("root/a.csv.csv"), "a.csv");
        assert!(codec.matches_suffix("root/a.csv"));
        assert!(!codec.matches_suffix("root/a.txt"));
    }

    #[test]
    fn test_empty_suffix_is_noop() {
        let codec = local("root", "");
        assert_eq!(codec.to_partition_id("root/a.csv"), "a.csv");
        assert_eq!(codec.to_storage_path("a.csv"), "root/a.csv");
        assert!(codec.matches_suffix("root/anything"));
    }

    #[test]
    fn test_path_outside_root() {
        let codec = local("root", "");
        assert_eq!(codec.to_partition_id("elsewhere/a"), "elsewhere/a");
    }
}
