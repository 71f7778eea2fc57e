//! Silence Ledger
//!
//! Flat-file persistence of silenced hostnames and the read-time overlay
//! that marks matching alert records as silenced.

mod ledger;

pub use ledger::SilenceLedger;

use std::path::PathBuf;
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid hostname: {0:?}")]
    InvalidHostname(String),
}
