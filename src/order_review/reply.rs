//! Endpoint replies: `{ "type": "success" | "error", "description"?, ... }`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Outcome tag of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    /// The endpoint accepted the change.
    Success,
    /// The endpoint refused; `description` explains.
    Error,
    /// Anything else; treated as neither.
    #[serde(other)]
    Unknown,
}

/// A decoded reply. Fields other than `type` stay available by name.
#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    /// Outcome tag.
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Failure to obtain or decode a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// The transport could not deliver the request.
    Transport(String),
    /// The body was not a JSON reply.
    Malformed(String),
}

impl fmt::Display for ReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "Request failed: {msg}"),
            Self::Malformed(msg) => write!(f, "Malformed reply: {msg}"),
        }
    }
}

impl std::error::Error for ReviewError {}

impl Reply {
    /// Decodes a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Malformed`] when the body is not a JSON object
    /// with a `type` field.
    pub fn parse(body: &str) -> Result<Self, ReviewError> {
        serde_json::from_str(body.trim()).map_err(|e| ReviewError::Malformed(e.to_string()))
    }

    /// True for `type: "success"`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kind == ReplyKind::Success
    }

    /// True for `type: "error"`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == ReplyKind::Error
    }

    /// Raw field by name; JSON `null` counts as absent.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Field rendered as text: strings verbatim, numbers and booleans
    /// formatted, `null`/absent as `None`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.raw(name).map(value_text)
    }

    /// `description`, or the empty string.
    #[must_use]
    pub fn description(&self) -> String {
        self.text("description").unwrap_or_default()
    }

    /// Field decoded into `T`; decoding failures count as absent.
    #[must_use]
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.raw(name)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("Reply field '{name}' did not decode: {e}");
                None
            }
        }
    }

    /// Key/value pairs of an object or array field, in JSON order (array
    /// indices become keys).
    #[must_use]
    pub fn entries(&self, name: &str) -> Vec<(String, Value)> {
        match self.raw(name) {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// JSON scalar as display text.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_with_fields() {
        let reply = Reply::parse(r#"{"type":"success","boxCount":3,"InputPartHandling":"[]"}"#).unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.text("boxCount").as_deref(), Some("3"));
        assert_eq!(reply.field::<u32>("boxCount"), Some(3));
        assert_eq!(reply.text("missing"), None);
    }

    #[test]
    fn test_parse_error_and_unknown_kind() {
        let reply = Reply::parse(r#"{"type":"error","description":"<b>No</b>"}"#).unwrap();
        assert!(reply.is_error());
        assert_eq!(reply.description(), "<b>No</b>");
        let odd = Reply::parse(r#"{"type":"pending"}"#).unwrap();
        assert_eq!(odd.kind, ReplyKind::Unknown);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(Reply::parse("<html>"), Err(ReviewError::Malformed(_))));
        assert!(matches!(Reply::parse("{}"), Err(ReviewError::Malformed(_))));
    }

    #[test]
    fn test_entries_from_array_and_object() {
        let reply = Reply::parse(r#"{"type":"success","a":["x","y"],"b":{"k":"v"},"c":null}"#).unwrap();
        let a = reply.entries("a");
        assert_eq!(a[1].0, "1");
        assert_eq!(value_text(&a[1].1), "y");
        assert_eq!(reply.entries("b")[0].0, "k");
        assert!(reply.entries("c").is_empty());
    }
}
