//! Storage path parsing: `scheme://path` with protocol normalization.

/// Protocol assumed when a path carries no scheme.
pub const DEFAULT_PROTOCOL: &str = "file";

/// Schemes served by the same backend as another scheme.
const PROTOCOL_ALIASES: &[(&str, &str)] = &[("s3a", "s3"), ("s3n", "s3"), ("local", "file")];

/// Map a scheme to the protocol of the backend serving it.
pub fn canonical_protocol(scheme: &str) -> &str {
    PROTOCOL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == scheme)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(scheme)
}

/// A storage path split into its optional scheme and the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    raw: String,
    scheme: Option<String>,
    path: String,
}

impl StoragePath {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.split_once("://") {
            Some((scheme, rest)) if is_scheme(scheme) => Self {
                scheme: Some(scheme.to_string()),
                path: rest.to_string(),
                raw,
            },
            _ => Self {
                scheme: None,
                path: raw.clone(),
                raw,
            },
        }
    }

    /// The path exactly as given.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The scheme, if one was given explicitly.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Everything after `scheme://`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The scheme, or [`DEFAULT_PROTOCOL`] when none was given.
    pub fn protocol(&self) -> &str {
        self.scheme().unwrap_or(DEFAULT_PROTOCOL)
    }

    /// Protocol of the backend serving this path.
    pub fn canonical_protocol(&self) -> &str {
        canonical_protocol(self.protocol())
    }

    pub fn has_explicit_protocol(&self) -> bool {
        self.scheme.is_some()
    }

    /// The path with an aliased scheme rewritten to its canonical protocol.
    pub fn normalized(&self) -> String {
        match self.scheme() {
            Some(scheme) if canonical_protocol(scheme) != scheme => {
                format!("{}://{}", canonical_protocol(scheme), self.path)
            }
            _ => self.raw.clone(),
        }
    }

    /// Strip the scheme if it is served by `protocol`, then any trailing `sep`.
    pub(crate) fn strip_for(raw: &str, protocol: &str, sep: &str) -> String {
        let parsed = Self::parse(raw);
        let path = match parsed.scheme() {
            Some(scheme) if canonical_protocol(scheme) == protocol => parsed.path(),
            _ => parsed.raw(),
        };
        let trimmed = path.trim_end_matches(sep);
        if trimmed.is_empty() && path.starts_with(sep) {
            sep.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// RFC 3986 scheme syntax. Single letters are treated as Windows drives.
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    candidate.len() > 1 && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
