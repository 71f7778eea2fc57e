//! Search filter
//!
//! A query is a case-insensitive substring. A leading `!` inverts it, so
//! `!db01` keeps every record that does *not* mention `db01`.

use crate::record::AlertRecord;

/// Whether matching records are kept or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Include,
    Exclude,
}

/// A parsed, non-empty search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub mode: MatchMode,
    /// Lowercased search text
    pub needle: String,
}

impl Query {
    /// Parse raw search-box text. Returns `None` when nothing remains to
    /// match on, which callers treat as "no filter".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (mode, rest) = match raw.strip_prefix('!') {
            Some(rest) => (MatchMode::Exclude, rest),
            None => (MatchMode::Include, raw),
        };

        // "! db01" and "!db01" are the same query
        let needle = rest.trim();
        if needle.is_empty() {
            return None;
        }

        Some(Self {
            mode,
            needle: needle.to_lowercase(),
        })
    }

    /// Whether the record survives this query
    pub fn keeps(&self, record: &AlertRecord) -> bool {
        let found = record.matches(&self.needle);
        match self.mode {
            MatchMode::Include => found,
            MatchMode::Exclude => !found,
        }
    }
}

/// Filter records by a raw query.
///
/// Sentinel rows never take part in matching; the first one found is put
/// back at the end of the result.
pub fn filter(query: &str, records: Vec<AlertRecord>) -> Vec<AlertRecord> {
    let Some(query) = Query::parse(query) else {
        return records;
    };

    let mut sentinel = None;
    let mut kept: Vec<AlertRecord> = Vec::with_capacity(records.len());
    for record in records {
        if record.is_sentinel() {
            sentinel.get_or_insert(record);
        } else if query.keeps(&record) {
            kept.push(record);
        }
    }

    kept.extend(sentinel);
    kept
}
