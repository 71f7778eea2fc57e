//! Dashboard view assembly
//!
//! Each request works on a copy of the current snapshot: apply any
//! silence changes, filter by the search query, then mark silenced hosts.

use aggregator::{AlertRecord, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use silencing::SilenceLedger;
use std::sync::Arc;
use tokio::task::{self, JoinError};
use tracing::warn;

use crate::AppContext;

/// Search and silence changes submitted from the dashboard
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardRequest {
    /// Search-box text, `!` prefix to exclude
    pub search: String,
    /// Hostnames to silence
    pub silence: Vec<String>,
    /// Hostnames to unsilence
    pub unsilence: Vec<String>,
}

/// What the dashboard renders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    /// Alerting entities shown
    pub server_count: usize,
    /// Distinct alerts across the shown entities
    pub alert_count: usize,
    pub last_sync: Option<DateTime<Utc>>,
    pub records: Vec<AlertRecord>,
}

impl DashboardView {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            server_count: snapshot.server_count(),
            alert_count: snapshot.alert_count(),
            last_sync: snapshot.last_sync,
            records: snapshot.records,
        }
    }
}

impl AppContext {
    /// Run `f` against the ledger on the blocking pool. Ledger calls hold a
    /// std mutex across file I/O and must stay off the async workers.
    pub async fn with_ledger<F, T>(&self, f: F) -> Result<T, JoinError>
    where
        F: FnOnce(&SilenceLedger) -> T + Send + 'static,
        T: Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        task::spawn_blocking(move || f(&ledger)).await
    }

    /// Apply a dashboard request and build the resulting view
    pub async fn dashboard(&self, request: DashboardRequest) -> DashboardView {
        let mut snapshot = self.snapshots.get().search(&request.search);
        let records = std::mem::take(&mut snapshot.records);

        let DashboardRequest {
            silence, unsilence, ..
        } = request;
        let annotated = self
            .with_ledger(move |ledger| {
                ledger.add_all(silence.iter().map(String::as_str));
                ledger.remove_all(unsilence.iter().map(String::as_str));
                ledger.annotate(records)
            })
            .await;

        snapshot.records = match annotated {
            Ok(records) => records,
            Err(e) => {
                warn!("Silence ledger task failed: {}", e);
                self.snapshots.get().search(&request.search).records
            }
        };
        DashboardView::from_snapshot(snapshot)
    }

    /// Flat rows ending with the refresh-time sentinel, filtered and annotated
    pub async fn dashboard_rows(&self, search: &str) -> Vec<AlertRecord> {
        let snapshot = self.snapshots.get();
        let rows = aggregator::search::filter(search, snapshot.legacy_rows());
        match self.with_ledger(move |ledger| ledger.annotate(rows)).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Silence ledger task failed: {}", e);
                aggregator::search::filter(search, snapshot.legacy_rows())
            }
        }
    }
}
