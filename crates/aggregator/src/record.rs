//! Alert record model

use serde::{Deserialize, Serialize};

/// Reserved UID of the metadata row appended to the legacy flat view
pub const SENTINEL_UID: &str = "TS";

/// Rendered in place of a label the source did not send
pub const MISSING_VALUE: &str = "<missing>";

/// One alerting entity, merged from every alert sharing its UID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Stable key across cycles and sources (`uniq_id` label)
    pub uid: String,
    pub account: String,
    pub hostname: String,
    pub location: String,
    /// Prometheus server that raised the alert (`prom_serv` label)
    pub source_name: String,
    /// `"YYYY-MM-DD HH:MM:SS"` of the earliest alert seen for this UID
    pub earliest_time: String,
    /// Distinct alert names, in first-seen order
    pub services: Vec<String>,
    /// Set from the silence ledger at read time, never stored in a snapshot
    #[serde(default)]
    pub silenced: bool,
}

impl AlertRecord {
    /// Build the metadata row carrying the last refresh time
    pub fn sentinel(last_refresh: impl Into<String>) -> Self {
        Self {
            uid: SENTINEL_UID.to_string(),
            account: String::new(),
            hostname: String::new(),
            location: String::new(),
            source_name: String::new(),
            earliest_time: last_refresh.into(),
            services: Vec::new(),
            silenced: false,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.uid == SENTINEL_UID
    }

    /// Record an alert name unless already present
    pub fn add_service(&mut self, name: &str) -> bool {
        if self.services.iter().any(|s| s == name) {
            return false;
        }
        self.services.push(name.to_string());
        true
    }

    /// Keep the earlier of the stored and given timestamps
    pub fn observe_time(&mut self, timestamp: &str) -> bool {
        if timestamp < self.earliest_time.as_str() {
            self.earliest_time = timestamp.to_string();
            return true;
        }
        false
    }

    /// Case-insensitive substring match over every searchable field.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [
            &self.uid,
            &self.account,
            &self.hostname,
            &self.location,
            &self.source_name,
            &self.earliest_time,
        ]
        .into_iter()
        .chain(self.services.iter())
        .any(|field| field.to_lowercase().contains(needle))
    }
}
