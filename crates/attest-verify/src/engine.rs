//! Integrity verifier for the attest ledger.
//!
//! `IntegrityVerifier` replays a store snapshot from the start. For the
//! entry at position `i`, with `expected_prev` starting at the genesis
//! constant:
//!
//! 1. The line must decode as a `SignedEntry`, else `MalformedEntry`.
//! 2. **Chain**: `prev_chain_value` must equal `expected_prev`, and the
//!    chain value recomputed from `expected_prev` and the record must equal
//!    the stored one, else `ChainBroken`.
//! 3. **Signature**: the HMAC recomputed with the ledger key must match,
//!    else `SignatureInvalid`.
//! 4. **Sequence**: `sequence_number` must equal `i`, else `SequenceGap`.
//!
//! The scan stops at the first failure and does not try to resynchronize.
//! It only reads, never takes the writer's lock, and ignores anything
//! appended after its snapshot was taken.

use std::sync::Arc;

use tracing::{debug, info, warn};

use attest_contracts::{
    entry::{LedgerAnchor, SignedEntry},
    error::AttestResult,
    report::{FailureKind, VerificationReport},
};
use attest_core::{
    chain::{chain_value, signature_matches},
    traits::LedgerStore,
};
use attest_keys::KeyProvider;

// ── Public verifier ───────────────────────────────────────────────────────────

/// Read-only tamper-evidence scanner.
#[derive(Debug, Clone)]
pub struct IntegrityVerifier {
    keys: Arc<KeyProvider>,
}

impl IntegrityVerifier {
    /// Build a verifier over the ledger's key.
    ///
    /// Returns `MissingKeyConfiguration` if the provider holds no key:
    /// without it no signature can be checked.
    pub fn new(keys: Arc<KeyProvider>) -> AttestResult<Self> {
        keys.current_key()?;
        Ok(Self { keys })
    }

    /// Verify everything currently in `store`.
    pub fn verify(&self, store: &dyn LedgerStore) -> VerificationReport {
        match store.read_lines() {
            Ok(lines) => self.replay(&lines).report,
            Err(e) => {
                warn!(error = %e, "ledger store unreadable");
                VerificationReport::unreadable()
            }
        }
    }

    /// Verify `store` and additionally require it to reach `anchor`.
    ///
    /// A store shorter than the anchor reports `Truncated` at the first
    /// missing position. A store whose entry at the anchor position carries a
    /// different chain value reports `ChainBroken` there.
    pub fn verify_against_anchor(
        &self,
        store: &dyn LedgerStore,
        anchor: &LedgerAnchor,
    ) -> VerificationReport {
        let lines = match store.read_lines() {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "ledger store unreadable");
                return VerificationReport::unreadable();
            }
        };

        let Replay { report, chain } = self.replay(&lines);
        if !report.valid {
            return report;
        }

        if report.checked_count < anchor.entry_count {
            warn!(
                checked_count = report.checked_count,
                anchored_count = anchor.entry_count,
                "ledger is shorter than its anchor"
            );
            return VerificationReport::failed(report.checked_count, FailureKind::Truncated);
        }

        if anchor.entry_count > 0 {
            let position = anchor.entry_count - 1;
            let found = &chain[position as usize];
            if *found != anchor.head_chain_value {
                warn!(
                    failure_at = position,
                    expected = %anchor.head_chain_value,
                    found = %found,
                    "ledger diverges from its anchor"
                );
                return VerificationReport::failed(position, FailureKind::ChainBroken);
            }
        }

        report
    }

    // ── Replay ────────────────────────────────────────────────────────────────

    fn replay(&self, lines: &[String]) -> Replay {
        debug!(snapshot_len = lines.len(), "verifying ledger snapshot");

        let mut expected_prev = SignedEntry::GENESIS_CHAIN_VALUE.to_string();
        let mut chain = Vec::with_capacity(lines.len());

        for (idx, line) in lines.iter().enumerate() {
            let position = idx as u64;

            let failure = match SignedEntry::from_line(line) {
                Err(_) => Some(FailureKind::MalformedEntry),
                Ok(entry) => {
                    let outcome = self.check_entry(&entry, position, &expected_prev);
                    if outcome.is_none() {
                        expected_prev = entry.chain_value;
                        chain.push(expected_prev.clone());
                    }
                    outcome
                }
            };

            if let Some(kind) = failure {
                warn!(failure_at = position, reason = %kind, "ledger verification failed");
                return Replay {
                    report: VerificationReport::failed(position, kind),
                    chain,
                };
            }
        }

        info!(checked_count = lines.len(), head = %expected_prev, "ledger verified");
        Replay {
            report: VerificationReport::passed(lines.len() as u64),
            chain,
        }
    }

    /// The first failed check for one decoded entry, if any.
    fn check_entry(
        &self,
        entry: &SignedEntry,
        position: u64,
        expected_prev: &str,
    ) -> Option<FailureKind> {
        if entry.prev_chain_value != expected_prev {
            return Some(FailureKind::ChainBroken);
        }
        match chain_value(expected_prev, &entry.record) {
            Ok(recomputed) if recomputed == entry.chain_value => {}
            _ => return Some(FailureKind::ChainBroken),
        }

        let signature_ok = self
            .keys
            .current_key()
            .and_then(|key| signature_matches(key, &entry.signing_input(), &entry.signature))
            .unwrap_or_else(|e| {
                warn!(error = %e, "signature check could not run");
                false
            });
        if !signature_ok {
            return Some(FailureKind::SignatureInvalid);
        }

        if entry.sequence_number != position {
            return Some(FailureKind::SequenceGap);
        }

        None
    }
}

/// Result of replaying a snapshot: the report plus the chain value of every
/// entry that checked out, in store order.
struct Replay {
    report: VerificationReport,
    chain: Vec<String>,
}
