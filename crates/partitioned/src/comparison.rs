//! Predicates deciding which partitions lie past the checkpoint.

use sluice_core::{DatasetError, Result};
use std::fmt;
use std::sync::Arc;

/// Custom predicate: `(partition_id, checkpoint) -> visible`.
pub type ComparisonFn = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Relation a partition id must satisfy against the checkpoint to be listed.
///
/// Ids are compared as strings and listings are ordered by id so that the
/// last visible id is the furthest under the relation: ascending for `gt`
/// and `ge`, descending for `lt` and `le`. Ids should be fixed width
/// (`2023-01-05`, `000042`) for the ordering to mean anything.
///
/// A `Custom` predicate is paired with ascending order; it must treat
/// greater ids as further along.
#[derive(Clone, Default)]
pub enum Comparison {
    /// `id > checkpoint`
    #[default]
    Greater,
    /// `id >= checkpoint`
    GreaterOrEqual,
    /// `id < checkpoint`
    Less,
    /// `id <= checkpoint`
    LessOrEqual,
    Custom(ComparisonFn),
}

impl Comparison {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Comparison::Custom(Arc::new(predicate))
    }

    /// Parse a named predicate: `gt`, `ge`, `lt` or `le`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "gt" => Ok(Comparison::Greater),
            "ge" => Ok(Comparison::GreaterOrEqual),
            "lt" => Ok(Comparison::Less),
            "le" => Ok(Comparison::LessOrEqual),
            other => Err(DatasetError::config(format!(
                "unknown comparison '{other}' (expected one of: gt, ge, lt, le)"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Comparison::Greater => "gt",
            Comparison::GreaterOrEqual => "ge",
            Comparison::Less => "lt",
            Comparison::LessOrEqual => "le",
            Comparison::Custom(_) => "custom",
        }
    }

    /// Whether listings run from the greatest id down.
    pub fn descending(&self) -> bool {
        matches!(self, Comparison::Less | Comparison::LessOrEqual)
    }

    /// Order `ids` so the last one is the next checkpoint.
    pub fn sort_ids<T, F>(&self, items: &mut [T], id_of: F)
    where
        F: FnMut(&T) -> String,
    {
        items.sort_by_cached_key(id_of);
        if self.descending() {
            items.reverse();
        }
    }

    pub fn matches(&self, partition_id: &str, checkpoint: &str) -> bool {
        match self {
            Comparison::Greater => partition_id > checkpoint,
            Comparison::GreaterOrEqual => partition_id >= checkpoint,
            Comparison::Less => partition_id < checkpoint,
            Comparison::LessOrEqual => partition_id <= checkpoint,
            Comparison::Custom(predicate) => predicate(partition_id, checkpoint),
        }
    }
}

impl fmt::Debug for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Comparison({})", self.name())
    }
}

impl serde::Serialize for Comparison {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for Comparison {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Comparison::from_name(&name).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict_greater() {
        let cmp = Comparison::default();
        assert!(cmp.matches("2023-01-06", "2023-01-05"));
        assert!(!cmp.matches("2023-01-05", "2023-01-05"));
        assert!(!cmp.matches("2023-01-04", "2023-01-05"));
    }

    #[test]
    fn test_lexicographic_not_numeric() {
        // "10" sorts before "9" as a string
        assert!(!Comparison::Greater.matches("10", "9"));
        assert!(Comparison::Greater.matches("10", "09"));
    }

    #[test]
    fn test_named() {
        for name in ["gt", "ge", "lt", "le"] {
            assert_eq!(Comparison::from_name(name).unwrap().name(), name);
        }
        assert!(Comparison::GreaterOrEqual.matches("a", "a"));
        assert!(Comparison::Less.matches("a", "b"));
        assert!(Comparison::LessOrEqual.matches("b", "b"));
        assert!(matches!(
            Comparison::from_name("eq"),
            Err(DatasetError::Configuration(_))
        ));
    }

    #[test]
    fn test_sort_follows_relation() {
        let mut ids = vec!["2", "3", "1"];
        Comparison::Greater.sort_ids(&mut ids, |id| id.to_string());
        assert_eq!(ids, ["1", "2", "3"]);
        Comparison::LessOrEqual.sort_ids(&mut ids, |id| id.to_string());
        assert_eq!(ids, ["3", "2", "1"]);
        assert!(!Comparison::custom(|_, _| true).descending());
    }

    #[test]
    fn test_custom() {
        let by_len = Comparison::custom(|id, checkpoint| id.len() > checkpoint.len());
        assert!(by_len.matches("abc", "ab"));
        assert!(!by_len.matches("a", "ab"));
        assert_eq!(format!("{by_len:?}"), "Comparison(custom)");
    }

    #[test]
    fn test_serde() {
        let cmp: Comparison = serde_json::from_str("\"ge\"").unwrap();
        assert_eq!(cmp.name(), "ge");
        assert_eq!(serde_json::to_string(&Comparison::Less).unwrap(), "\"lt\"");
        assert!(serde_json::from_str::<Comparison>("\"between\"").is_err());
    }
}
