//! Ledger Implementation

use aggregator::AlertRecord;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::LedgerError;

/// Durable set of silenced hostnames, one per line.
///
/// Every file access holds the same mutex, so a removal's read and rewrite
/// never interleave with another add or remove.
pub struct SilenceLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SilenceLedger {
    /// Open a ledger backed by `path`. The file is created on first add.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Using silence ledger at {}", path.display());
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a hostname. Repeated adds leave repeated lines.
    pub fn add(&self, hostname: &str) -> Result<(), LedgerError> {
        validate(hostname)?;
        let _guard = self.guard();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{hostname}").map_err(|e| self.io_error(e))?;

        metrics::counter!("alertdeck_silence_ops_total", "op" => "add").increment(1);
        info!("Silenced alerts for: {}", hostname);
        Ok(())
    }

    /// Drop every line equal to `hostname` and rewrite the file.
    /// Returns how many lines were removed.
    pub fn remove(&self, hostname: &str) -> Result<usize, LedgerError> {
        let _guard = self.guard();

        let entries = self.read_entries()?;
        let before = entries.len();
        let remaining: Vec<String> = entries.into_iter().filter(|h| h != hostname).collect();

        let mut contents = String::new();
        for host in &remaining {
            contents.push_str(host);
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;

        let removed = before - remaining.len();
        metrics::counter!("alertdeck_silence_ops_total", "op" => "remove").increment(1);
        info!("Unsilenced alerts for: {} ({} entries removed)", hostname, removed);
        Ok(removed)
    }

    /// Every stored hostname in file order. A missing file is an empty ledger.
    pub fn list_all(&self) -> Result<Vec<String>, LedgerError> {
        let _guard = self.guard();
        self.read_entries()
    }

    /// Set `silenced` on each record from the current ledger contents.
    /// If the ledger cannot be read the records are returned unchanged.
    pub fn annotate(&self, mut records: Vec<AlertRecord>) -> Vec<AlertRecord> {
        let hosts: HashSet<String> = match self.list_all() {
            Ok(hosts) => hosts.into_iter().collect(),
            Err(e) => {
                warn!("Error reading silenced hosts: {}", e);
                return records;
            }
        };

        for record in &mut records {
            record.silenced = hosts.contains(&record.hostname);
        }
        records
    }

    /// Silence `hostname`, then annotate. Ledger failures are logged only.
    pub fn silence(&self, records: Vec<AlertRecord>, hostname: &str) -> Vec<AlertRecord> {
        self.silence_all(records, [hostname])
    }

    /// Unsilence `hostname`, then annotate. Ledger failures are logged only.
    pub fn unsilence(&self, records: Vec<AlertRecord>, hostname: &str) -> Vec<AlertRecord> {
        self.unsilence_all(records, [hostname])
    }

    /// Silence several hosts at once, then annotate
    pub fn silence_all<'a>(
        &self,
        records: Vec<AlertRecord>,
        hostnames: impl IntoIterator<Item = &'a str>,
    ) -> Vec<AlertRecord> {
        self.add_all(hostnames);
        self.annotate(records)
    }

    /// Unsilence several hosts at once, then annotate
    pub fn unsilence_all<'a>(
        &self,
        records: Vec<AlertRecord>,
        hostnames: impl IntoIterator<Item = &'a str>,
    ) -> Vec<AlertRecord> {
        self.remove_all(hostnames);
        self.annotate(records)
    }

    /// Add each non-blank hostname, logging failures
    pub fn add_all<'a>(&self, hostnames: impl IntoIterator<Item = &'a str>) {
        for host in hostnames.into_iter().map(str::trim).filter(|h| !h.is_empty()) {
            if let Err(e) = self.add(host) {
                warn!("Error silencing alert {}: {}", host, e);
            }
        }
    }

    /// Remove each non-blank hostname, logging failures
    pub fn remove_all<'a>(&self, hostnames: impl IntoIterator<Item = &'a str>) {
        for host in hostnames.into_iter().map(str::trim).filter(|h| !h.is_empty()) {
            if let Err(e) = self.remove(host) {
                warn!("Error unsilencing alert {}: {}", host, e);
            }
        }
    }

    fn read_entries(&self) -> Result<Vec<String>, LedgerError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No silence ledger at {} yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// The mutex guards no data, so a poisoned lock is still usable
    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn validate(hostname: &str) -> Result<(), LedgerError> {
    if hostname.trim().is_empty() || hostname.contains(|c: char| c == '\n' || c == '\r') {
        return Err(LedgerError::InvalidHostname(hostname.to_string()));
    }
    Ok(())
}
