//! The ledger writer: the single append path.
//!
//! `LedgerWriter` owns the cached tail of the chain (next sequence number and
//! last chain value) behind a `Mutex`. `append` holds that lock across the
//! whole read-tail → build entry → persist → advance sequence, so concurrent
//! callers get strictly increasing sequence numbers with no gaps and never
//! chain two entries onto the same predecessor.
//!
//! Only one process may write to a given store. The lock is in-process; two
//! processes appending to the same file will race.
//!
//! A failed append whose line may nonetheless have reached the store poisons
//! the writer: every later append fails until the store is reopened, at
//! which point the tail is re-read and the chain resumes after whatever
//! actually landed.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use attest_contracts::{
    entry::{LedgerAnchor, SignedEntry, SigningInput},
    error::{AttestError, AttestResult},
    record::{AuditRecord, Payload},
};
use attest_core::{
    chain::{chain_value, sign},
    traits::{Clock, LedgerStore, SystemClock},
};
use attest_keys::KeyProvider;

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable tail of the chain.
struct WriterState {
    /// Sequence number the next entry will carry.
    next_sequence: u64,

    /// `chain_value` of the last persisted entry, or the genesis constant.
    last_chain_value: String,

    /// Set when the store's contents no longer match the cached tail.
    poisoned: bool,
}

// ── Public writer ─────────────────────────────────────────────────────────────

/// Appends signed, chained entries to a `LedgerStore`.
///
/// Share one writer per store across the application via `Arc`.
pub struct LedgerWriter {
    store: Arc<dyn LedgerStore>,
    keys: Arc<KeyProvider>,
    clock: Arc<dyn Clock>,
    state: Mutex<WriterState>,
}

impl LedgerWriter {
    /// Open a writer over `store`, resuming after its current tail.
    pub fn open(store: Arc<dyn LedgerStore>, keys: Arc<KeyProvider>) -> AttestResult<Self> {
        Self::open_with_clock(store, keys, Arc::new(SystemClock))
    }

    /// Like [`open`](Self::open) but with an explicit timestamp source.
    ///
    /// Returns `StoreUnreadable` if the store cannot be read, its last line
    /// is not a signed entry, or the last entry's sequence number does not
    /// match the number of stored entries.
    pub fn open_with_clock(
        store: Arc<dyn LedgerStore>,
        keys: Arc<KeyProvider>,
        clock: Arc<dyn Clock>,
    ) -> AttestResult<Self> {
        let lines = store.read_lines()?;

        let state = match lines.last() {
            None => WriterState {
                next_sequence: 0,
                last_chain_value: SignedEntry::GENESIS_CHAIN_VALUE.to_string(),
                poisoned: false,
            },
            Some(line) => {
                let tail = SignedEntry::from_line(line).map_err(|e| {
                    AttestError::StoreUnreadable {
                        reason: format!("last ledger line is not a signed entry: {}", e),
                    }
                })?;
                let line_count = lines.len() as u64;
                if tail.sequence_number.checked_add(1) != Some(line_count) {
                    warn!(
                        tail_sequence = tail.sequence_number,
                        line_count,
                        "ledger tail sequence does not match line count"
                    );
                    return Err(AttestError::StoreUnreadable {
                        reason: format!(
                            "last entry carries sequence {} but the store holds {} entries; run verification",
                            tail.sequence_number, line_count
                        ),
                    });
                }
                WriterState {
                    next_sequence: line_count,
                    last_chain_value: tail.chain_value,
                    poisoned: false,
                }
            }
        };

        info!(
            next_sequence = state.next_sequence,
            head = %state.last_chain_value,
            "ledger writer opened"
        );

        Ok(Self {
            store,
            keys,
            clock,
            state: Mutex::new(state),
        })
    }

    /// Record one event and return the persisted entry.
    ///
    /// # Errors
    ///
    /// - `MissingKeyConfiguration` if the key provider holds no key; the
    ///   store is not touched.
    /// - `InvalidRecord` if `event_type` or `actor_id` is empty.
    /// - `PersistenceFailure` if the store rejects the write. The sequence
    ///   counter and head chain value are left as they were, so the call can
    ///   be retried. If the store afterwards holds more entries than the
    ///   writer accounts for, the writer is poisoned and keeps failing until
    ///   it is reopened.
    /// - `PersistenceFailure` on a poisoned writer.
    pub fn append(
        &self,
        event_type: &str,
        actor_id: &str,
        payload: Payload,
    ) -> AttestResult<SignedEntry> {
        let mut state = self.lock_state()?;
        if state.poisoned {
            return Err(AttestError::PersistenceFailure {
                reason: "ledger writer is poisoned by an unconfirmed write; reopen the store"
                    .to_string(),
            });
        }

        let key = self.keys.current_key()?;
        let record = AuditRecord::new(self.clock.now_unix(), event_type, actor_id, payload)?;

        let sequence_number = state.next_sequence;
        let prev_chain_value = state.last_chain_value.clone();
        let chain = chain_value(&prev_chain_value, &record)?;
        let signature = sign(
            key,
            &SigningInput {
                sequence_number,
                record: &record,
                prev_chain_value: &prev_chain_value,
                chain_value: &chain,
            },
        )?;

        let entry = SignedEntry {
            sequence_number,
            record,
            prev_chain_value,
            chain_value: chain,
            signature,
        };
        let line = entry.to_line()?;

        if let Err(e) = self.store.append_line(&line) {
            let untouched = matches!(self.store.len(), Ok(count) if count == sequence_number);
            if untouched {
                warn!(
                    sequence = sequence_number,
                    event_type = %event_type,
                    error = %e,
                    "audit append failed; ledger state not advanced"
                );
            } else {
                state.poisoned = true;
                error!(
                    sequence = sequence_number,
                    event_type = %event_type,
                    error = %e,
                    "audit append failed but the store changed; writer poisoned until reopened"
                );
            }
            return Err(e);
        }

        state.next_sequence += 1;
        state.last_chain_value = entry.chain_value.clone();

        debug!(
            sequence = sequence_number,
            event_type = %entry.record.event_type(),
            actor_id = %entry.record.actor_id(),
            chain_value = %entry.chain_value,
            "audit entry appended"
        );

        Ok(entry)
    }

    /// Sequence number the next appended entry will carry.
    pub fn next_sequence(&self) -> AttestResult<u64> {
        Ok(self.lock_state()?.next_sequence)
    }

    /// Chain value of the last entry (genesis constant when empty).
    pub fn head_chain_value(&self) -> AttestResult<String> {
        Ok(self.lock_state()?.last_chain_value.clone())
    }

    /// Commitment to everything written so far, for external safekeeping.
    pub fn anchor(&self) -> AttestResult<LedgerAnchor> {
        let state = self.lock_state()?;
        Ok(LedgerAnchor {
            entry_count: state.next_sequence,
            head_chain_value: state.last_chain_value.clone(),
        })
    }

    /// True once a failed append left the store out of step with the writer.
    pub fn is_poisoned(&self) -> AttestResult<bool> {
        Ok(self.lock_state()?.poisoned)
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    fn lock_state(&self) -> AttestResult<MutexGuard<'_, WriterState>> {
        self.state.lock().map_err(|e| AttestError::PersistenceFailure {
            reason: format!("ledger writer lock poisoned: {}", e),
        })
    }
}
