//! Normalizer and Merger
//!
//! Folds raw alert items from every source into one record per UID.

use serde_json::{Map, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::payload::{RawAlert, SourcePayload};
use crate::profile::{LabelProfile, GROUP_LABEL};
use crate::record::{AlertRecord, MISSING_VALUE, SENTINEL_UID};

const UID_LABEL: &str = "uniq_id";
const ALERTNAME_LABEL: &str = "alertname";

/// Accumulates alert items into per-UID records for one refresh cycle
#[derive(Debug, Default)]
pub struct Merger {
    records: HashMap<String, AlertRecord>,
    /// Items dropped for lacking a label map or using the reserved UID
    skipped: usize,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge every alert of one source payload
    pub fn ingest_payload(&mut self, payload: &SourcePayload) {
        for alert in &payload.alerts {
            self.ingest(alert);
        }
        debug!(
            "Merged {} alerts from {} ({} records so far)",
            payload.alerts.len(),
            payload.source,
            self.records.len()
        );
    }

    /// Merge a single alert item. Returns false if the item was skipped.
    pub fn ingest(&mut self, alert: &RawAlert) -> bool {
        let Some(labels) = alert.labels.as_object() else {
            debug!("Skipping alert without a label map");
            self.skipped += 1;
            return false;
        };

        let uid = render(labels.get(UID_LABEL));
        if uid == SENTINEL_UID {
            warn!("Skipping alert using reserved uid {:?}", SENTINEL_UID);
            self.skipped += 1;
            return false;
        }

        let timestamp = normalize_timestamp(&render(Some(&alert.starts_at)));
        let alertname = render(labels.get(ALERTNAME_LABEL));

        match self.records.entry(uid) {
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                record.add_service(&alertname);
                record.observe_time(&timestamp);
            }
            Entry::Vacant(slot) => {
                let record = new_record(slot.key().clone(), labels, timestamp, alertname);
                slot.insert(record);
            }
        }
        true
    }

    /// Number of records merged so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_records(self) -> HashMap<String, AlertRecord> {
        self.records
    }
}

/// Merge all payloads of a round into a UID-keyed map
pub fn merge(payloads: &[SourcePayload]) -> HashMap<String, AlertRecord> {
    let mut merger = Merger::new();
    for payload in payloads {
        merger.ingest_payload(payload);
    }
    if merger.skipped() > 0 {
        debug!("Skipped {} unusable alert items", merger.skipped());
    }
    merger.into_records()
}

fn new_record(
    uid: String,
    labels: &Map<String, Value>,
    earliest_time: String,
    alertname: String,
) -> AlertRecord {
    let group = labels.get(GROUP_LABEL).and_then(Value::as_str);
    let profile = LabelProfile::for_group(group);

    AlertRecord {
        uid,
        account: render(labels.get(profile.account)),
        hostname: render(labels.get(profile.hostname)),
        location: render(labels.get(profile.location)),
        source_name: render(labels.get(profile.source_name)),
        earliest_time,
        services: vec![alertname],
        silenced: false,
    }
}

/// Render a label value as text, substituting a marker when absent
fn render(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING_VALUE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Convert an ISO-like `startsAt` into a lexically comparable
/// `"date time"` string without sub-second precision.
///
/// `2024-01-01T10:00:00.123Z` becomes `2024-01-01 10:00:00`.
/// Input without a `T` separator is returned as-is.
pub fn normalize_timestamp(raw: &str) -> String {
    match raw.split_once('T') {
        Some((date, time)) => {
            let time = time.split_once('.').map_or(time, |(whole, _)| whole);
            let time = time.strip_suffix('Z').unwrap_or(time);
            format!("{date} {time}")
        }
        None => raw.to_string(),
    }
}
