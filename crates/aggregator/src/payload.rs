//! Alert-manager wire types

use serde::Deserialize;
use serde_json::Value;

/// One alert item as returned by `GET /api/v2/alerts`.
///
/// Only the fields the merger reads are decoded. Both are kept as raw JSON
/// so a missing or oddly-typed value degrades to a placeholder instead of
/// rejecting the whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlert {
    #[serde(default)]
    pub labels: Value,
    #[serde(default, rename = "startsAt")]
    pub starts_at: Value,
}

impl RawAlert {
    /// Build an alert from string labels (mostly for tests and fixtures)
    pub fn new<'a>(labels: impl IntoIterator<Item = (&'a str, &'a str)>, starts_at: &str) -> Self {
        let labels = labels
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect::<serde_json::Map<_, _>>();
        Self {
            labels: Value::Object(labels),
            starts_at: Value::String(starts_at.to_string()),
        }
    }
}

/// All alerts fetched from a single source endpoint in one round
#[derive(Debug, Clone, Default)]
pub struct SourcePayload {
    /// Endpoint the payload came from
    pub source: String,
    pub alerts: Vec<RawAlert>,
}

impl SourcePayload {
    pub fn new(source: impl Into<String>, alerts: Vec<RawAlert>) -> Self {
        Self {
            source: source.into(),
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_alertmanager_body() {
        let body = r#"[
            {"labels": {"uniq_id": "abc", "alertname": "disk-full"},
             "startsAt": "2024-01-01T10:00:00.123Z",
             "status": {"state": "active"}},
            {"startsAt": "2024-01-01T11:00:00Z"}
        ]"#;
        let alerts: Vec<RawAlert> = serde_json::from_str(body).unwrap();

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].labels["uniq_id"], "abc");
        assert!(alerts[1].labels.is_null());
    }

    #[test]
    fn test_non_array_body_is_rejected() {
        assert!(serde_json::from_str::<Vec<RawAlert>>(r#"{"status": "error"}"#).is_err());
        assert!(serde_json::from_str::<Vec<RawAlert>>(r#"["not-an-object"]"#).is_err());
    }
}
