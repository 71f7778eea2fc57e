//! Alert Source Collection
//!
//! Polls every configured alert manager in parallel and drives the
//! periodic refresh cycle that republishes the merged snapshot.

mod client;
mod endpoint;
mod error;
mod refresh;

#[cfg(test)]
mod testing;

pub use client::{CollectionRound, CollectorConfig, SourceCollector, DEFAULT_ALERTS_PATH};
pub use endpoint::{Endpoint, DEFAULT_ALERTMANAGER_PORT};
pub use error::CollectError;
pub use refresh::{CycleReport, CycleState, RefreshCycle};
