//! Alert Aggregation
//!
//! Turns raw alert-manager payloads into deduplicated per-entity records,
//! orders them for display, filters them by search query, and publishes
//! them as immutable snapshots.

mod merge;
mod order;
mod payload;
mod profile;
mod record;
pub mod search;
mod snapshot;

pub use merge::{merge, normalize_timestamp, Merger};
pub use order::order;
pub use payload::{RawAlert, SourcePayload};
pub use profile::LabelProfile;
pub use record::{AlertRecord, MISSING_VALUE, SENTINEL_UID};
pub use snapshot::{Snapshot, SnapshotStore};
