//! Read-side lookup of ledger entries for operators.
//!
//! Queries decode the current snapshot, filter by actor and/or event type,
//! and return newest first. They do not verify signatures; run the
//! integrity verifier for that.

use tracing::warn;

use attest_contracts::{entry::SignedEntry, error::AttestResult};
use attest_core::traits::LedgerStore;

/// Page size used when a query does not set `limit`.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Filter and paging options for [`query_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    /// Only entries recorded for this actor.
    pub actor_id: Option<String>,
    /// Only entries of this event type.
    pub event_type: Option<String>,
    /// Maximum number of entries returned.
    pub limit: usize,
    /// Number of matching entries skipped (newest first) before collecting.
    pub offset: usize,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            actor_id: None,
            event_type: None,
            limit: DEFAULT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

impl EntryQuery {
    fn matches(&self, entry: &SignedEntry) -> bool {
        let actor_matches = self
            .actor_id
            .as_deref()
            .map_or(true, |actor| entry.record.actor_id() == actor);
        let type_matches = self
            .event_type
            .as_deref()
            .map_or(true, |kind| entry.record.event_type() == kind);
        actor_matches && type_matches
    }
}

/// Matching entries, newest first (by timestamp, then sequence number).
///
/// Lines that do not decode are skipped with a warning.
pub fn query_entries(store: &dyn LedgerStore, query: &EntryQuery) -> AttestResult<Vec<SignedEntry>> {
    let mut entries: Vec<SignedEntry> = Vec::new();

    for (position, line) in store.read_lines()?.iter().enumerate() {
        match SignedEntry::from_line(line) {
            Ok(entry) if query.matches(&entry) => entries.push(entry),
            Ok(_) => {}
            Err(e) => warn!(position, error = %e, "skipping undecodable ledger line"),
        }
    }

    entries.sort_by(|a, b| {
        b.record
            .timestamp()
            .cmp(&a.record.timestamp())
            .then(b.sequence_number.cmp(&a.sequence_number))
    });

    Ok(entries
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect())
}
