//! Trait seams of the ledger.
//!
//! - `LedgerStore`: durable, append-only line storage
//! - `Clock`: the writer's source of record timestamps
//!
//! The writer and verifier are written against these traits so the same
//! chaining and verification logic runs over an in-memory store in tests and
//! a file in production.

use attest_contracts::error::AttestResult;

/// Append-only storage of encoded ledger entries, one per line.
///
/// Implementations must be safe to share across threads. Readers may run
/// concurrently with an append.
pub trait LedgerStore: Send + Sync {
    /// Durably append one encoded entry (no trailing newline).
    ///
    /// Must be all-or-nothing: on `Err` no part of `line` may be visible to
    /// any later `read_lines`. Failures are reported as
    /// `AttestError::PersistenceFailure`.
    fn append_line(&self, line: &str) -> AttestResult<()>;

    /// Snapshot of every complete line currently in the store, in append order.
    ///
    /// Lines appended after the snapshot is taken are not included. Failures
    /// are reported as `AttestError::StoreUnreadable`.
    fn read_lines(&self) -> AttestResult<Vec<String>>;

    /// Number of complete lines currently in the store.
    fn len(&self) -> AttestResult<u64> {
        Ok(self.read_lines()?.len() as u64)
    }

    fn is_empty(&self) -> AttestResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Source of record timestamps, in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall-clock time (UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}
