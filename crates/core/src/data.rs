//! Payloads moved between datasets and callers.

use bytes::Bytes;

/// A loaded or to-be-saved payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// A parsed JSON document.
    Json(serde_json::Value),
}

impl Data {
    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Data::Text(_) => "text",
            Data::Bytes(_) => "bytes",
            Data::Json(_) => "json",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Data::Text(s) => Some(s),
            Data::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Convert into text when the payload has a lossless text form.
    pub fn into_text(self) -> Option<String> {
        match self {
            Data::Text(s) => Some(s),
            Data::Json(serde_json::Value::String(s)) => Some(s),
            Data::Bytes(b) => String::from_utf8(b.to_vec()).ok(),
            Data::Json(_) => None,
        }
    }

    /// Encode into the bytes written to storage.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Data::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            Data::Bytes(b) => b.clone(),
            Data::Json(v) => Bytes::from(v.to_string()),
        }
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::Text(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::Text(value.to_string())
    }
}

impl From<Bytes> for Data {
    fn from(value: Bytes) -> Self {
        Data::Bytes(value)
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Data::Bytes(Bytes::from(value))
    }
}

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        Data::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_text() {
        assert_eq!(Data::from("abc").into_text().as_deref(), Some("abc"));
        assert_eq!(Data::from(b"xyz".to_vec()).into_text().as_deref(), Some("xyz"));
        assert_eq!(
            Data::Json(serde_json::json!("2023-01-01")).into_text().as_deref(),
            Some("2023-01-01")
        );
        assert!(Data::Json(serde_json::json!({"a": 1})).into_text().is_none());
        assert!(Data::from(vec![0xff, 0xfe]).into_text().is_none());
    }

    #[test]
    fn test_to_bytes() {
        assert_eq!(Data::from("hi").to_bytes(), Bytes::from_static(b"hi"));
        assert_eq!(
            Data::Json(serde_json::json!([1, 2])).to_bytes(),
            Bytes::from_static(b"[1,2]")
        );
    }
}
