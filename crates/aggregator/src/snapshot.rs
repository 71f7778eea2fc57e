//! Published snapshots
//!
//! The refresh cycle is the only writer. Request handlers read through
//! [`SnapshotStore::get`], which hands out an `Arc` to an immutable
//! snapshot. Publishing swaps the `Arc`, so readers see either the old or
//! the new snapshot in full and never hold the lock while they work.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::record::AlertRecord;
use crate::search;

/// One fully merged and ordered view of the current alerts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub records: Vec<AlertRecord>,
    /// When the refresh cycle published this snapshot (`None` before the first)
    pub last_sync: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(records: Vec<AlertRecord>, last_sync: DateTime<Utc>) -> Self {
        Self {
            records,
            last_sync: Some(last_sync),
        }
    }

    /// Number of alerting entities
    pub fn server_count(&self) -> usize {
        self.records.len()
    }

    /// Number of distinct alerts across all entities
    pub fn alert_count(&self) -> usize {
        self.records.iter().map(|r| r.services.len()).sum()
    }

    /// Filter the records by a search query, keeping the sync time
    pub fn search(&self, query: &str) -> Snapshot {
        Snapshot {
            records: search::filter(query, self.records.clone()),
            last_sync: self.last_sync,
        }
    }

    /// Records followed by the sentinel row carrying the refresh time
    /// (`HH:MM:SS`, local), as consumed by the flat dashboard view
    pub fn legacy_rows(&self) -> Vec<AlertRecord> {
        let refreshed = self
            .last_sync
            .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let mut rows = Vec::with_capacity(self.records.len() + 1);
        rows.extend(self.records.iter().cloned());
        rows.push(AlertRecord::sentinel(refreshed));
        rows
    }
}

/// Shared holder of the latest published snapshot
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new record set, stamped with the current time
    pub fn set(&self, records: Vec<AlertRecord>) -> Arc<Snapshot> {
        self.publish(Snapshot::new(records, Utc::now()))
    }

    /// Publish a prepared snapshot
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        info!(
            "Publishing snapshot: {} records, {} alerts",
            snapshot.server_count(),
            snapshot.alert_count()
        );

        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::clone(&snapshot);
        snapshot
    }

    /// Handle to the latest snapshot
    pub fn get(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*current)
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.get().last_sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn record(uid: &str, services: &[&str]) -> AlertRecord {
        AlertRecord {
            uid: uid.into(),
            account: "Acme".into(),
            hostname: format!("{uid}.example.com"),
            location: "Lansing".into(),
            source_name: "prom-b3".into(),
            earliest_time: "2024-01-01 10:00:00".into(),
            services: services.iter().map(|s| s.to_string()).collect(),
            silenced: false,
        }
    }

    #[test]
    fn test_empty_store() {
        let store = SnapshotStore::new();
        assert!(store.get().records.is_empty());
        assert!(store.last_sync().is_none());
    }

    #[test]
    fn test_set_replaces_and_stamps() {
        let store = SnapshotStore::new();
        let before = Utc::now();
        store.set(vec![record("a", &["x"])]);
        let first = store.get();

        store.set(vec![record("b", &["y"]), record("c", &["z"])]);

        // Held handle is unaffected by the later publish
        assert_eq!(first.records[0].uid, "a");
        assert_eq!(store.get().server_count(), 2);
        assert!(store.last_sync().unwrap() >= before);
    }

    #[test]
    fn test_counts() {
        let snapshot = Snapshot::new(
            vec![record("a", &["x", "y"]), record("b", &["z"])],
            Utc::now(),
        );
        assert_eq!(snapshot.server_count(), 2);
        assert_eq!(snapshot.alert_count(), 3);
    }

    #[test]
    fn test_search_keeps_last_sync() {
        let snapshot = Snapshot::new(vec![record("a", &["x"]), record("b", &["y"])], Utc::now());
        let found = snapshot.search("!a.example");
        assert_eq!(found.records.len(), 1);
        assert_eq!(found.records[0].uid, "b");
        assert_eq!(found.last_sync, snapshot.last_sync);
    }

    #[test]
    fn test_legacy_rows_end_with_sentinel() {
        let snapshot = Snapshot::new(vec![record("a", &["x"])], Utc::now());
        let rows = snapshot.legacy_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_sentinel());
        assert_eq!(rows[1].earliest_time.len(), "HH:MM:SS".len());

        let rows = Snapshot::default().legacy_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].earliest_time, "N/A");
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let store = Arc::new(SnapshotStore::new());
        store.set(vec![record("a", &["x"])]);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = store.get();
                        let n = snap.records.len();
                        // Every published snapshot holds n records all tagged with n
                        assert!(snap.records.iter().all(|r| r.services.len() == n));
                    }
                })
            })
            .collect();

        for n in 1..=50 {
            let records = (0..n)
                .map(|i| {
                    let names: Vec<String> = (0..n).map(|j| format!("svc{j}")).collect();
                    let names: Vec<&str> = names.iter().map(String::as_str).collect();
                    record(&format!("h{i}"), &names)
                })
                .collect();
            store.set(records);
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
