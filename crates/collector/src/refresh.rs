//! Refresh Cycle
//!
//! Collect, merge, order, publish. The loop runs one cycle at a time; a
//! slow cycle delays the next tick instead of overlapping it.

use aggregator::{merge, order, SnapshotStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::client::SourceCollector;

/// Where the refresh cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Collecting,
    Merging,
    Publishing,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::Collecting => "collecting",
            CycleState::Merging => "merging",
            CycleState::Publishing => "publishing",
        }
    }
}

/// Summary of one completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub sources: usize,
    pub failed: usize,
    pub records: usize,
    /// False when the previous snapshot was kept
    pub published: bool,
    pub elapsed: Duration,
}

/// Periodic collect-merge-publish driver
pub struct RefreshCycle {
    collector: SourceCollector,
    store: Arc<SnapshotStore>,
    interval: Duration,
    retain_on_total_failure: bool,
    state: watch::Sender<CycleState>,
}

impl RefreshCycle {
    pub fn new(collector: SourceCollector, store: Arc<SnapshotStore>, interval: Duration) -> Self {
        let (state, _) = watch::channel(CycleState::Idle);
        Self {
            collector,
            store,
            interval,
            retain_on_total_failure: false,
            state,
        }
    }

    /// Keep the previous snapshot when every source failed, instead of
    /// publishing an empty one
    pub fn retain_on_total_failure(mut self, retain: bool) -> Self {
        self.retain_on_total_failure = retain;
        self
    }

    pub fn state(&self) -> CycleState {
        *self.state.borrow()
    }

    /// Receiver following state transitions
    pub fn subscribe(&self) -> watch::Receiver<CycleState> {
        self.state.subscribe()
    }

    /// Run a single cycle to completion
    pub async fn run_once(&self) -> CycleReport {
        info!("Fetching alerts from alert managers...");
        let started = Instant::now();

        self.state.send_replace(CycleState::Collecting);
        let round = self.collector.collect().await;

        self.state.send_replace(CycleState::Merging);
        let records = order(merge(&round.payloads));
        let record_count = records.len();

        self.state.send_replace(CycleState::Publishing);
        let published = if round.all_failed() && self.retain_on_total_failure {
            warn!(
                "All {} sources failed; keeping previous snapshot",
                round.attempted()
            );
            false
        } else {
            if round.all_failed() {
                warn!(
                    "All {} sources failed; publishing empty snapshot",
                    round.attempted()
                );
            }
            let snapshot = self.store.set(records);
            metrics::gauge!("alertdeck_snapshot_records").set(snapshot.server_count() as f64);
            true
        };

        self.state.send_replace(CycleState::Idle);

        let elapsed = started.elapsed();
        metrics::counter!("alertdeck_refresh_cycles_total").increment(1);
        metrics::histogram!("alertdeck_refresh_duration_seconds").record(elapsed.as_secs_f64());
        info!(
            "Alert update complete: {} servers from {}/{} sources, took {:?}",
            record_count,
            round.payloads.len(),
            round.attempted(),
            elapsed
        );

        CycleReport {
            sources: round.attempted(),
            failed: round.failures.len(),
            records: record_count,
            published,
            elapsed,
        }
    }

    /// Run a cycle every interval until `shutdown` turns true or its
    /// sender is dropped. The first cycle starts one interval from now;
    /// callers run the startup cycle themselves via [`run_once`](Self::run_once).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting refresh loop every {:?}", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Refresh loop stopped");
    }

    /// Spawn [`run`](Self::run) on the runtime
    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
