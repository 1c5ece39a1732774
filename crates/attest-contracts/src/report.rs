//! Verification report types.
//!
//! A tampered ledger is an expected, actionable outcome, so the verifier
//! returns these as data instead of raising errors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a verification run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// `prev_chain_value` or `chain_value` does not match the replayed chain.
    ChainBroken,
    /// The HMAC does not verify under the ledger key.
    SignatureInvalid,
    /// `sequence_number` is not the entry's position in the store.
    SequenceGap,
    /// The stored line does not decode as a signed entry.
    MalformedEntry,
    /// The store holds fewer entries than a trusted anchor records.
    Truncated,
    /// The store could not be read at all.
    StoreUnreadable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::ChainBroken => "chain broken",
            FailureKind::SignatureInvalid => "signature invalid",
            FailureKind::SequenceGap => "sequence gap",
            FailureKind::MalformedEntry => "malformed entry",
            FailureKind::Truncated => "truncated",
            FailureKind::StoreUnreadable => "store unreadable",
        };
        f.write_str(label)
    }
}

/// Outcome of one verification scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True only if every entry in the snapshot checked out.
    pub valid: bool,
    /// Number of entries fully validated before the scan stopped.
    pub checked_count: u64,
    /// Position of the first bad entry. `None` when valid or unreadable.
    pub failure_at: Option<u64>,
    /// Kind of the first failure. `None` when valid.
    pub reason: Option<FailureKind>,
}

impl VerificationReport {
    pub fn passed(checked_count: u64) -> Self {
        Self {
            valid: true,
            checked_count,
            failure_at: None,
            reason: None,
        }
    }

    /// A tamper finding at `position`; entries before it were valid.
    pub fn failed(position: u64, reason: FailureKind) -> Self {
        Self {
            valid: false,
            checked_count: position,
            failure_at: Some(position),
            reason: Some(reason),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            valid: false,
            checked_count: 0,
            failure_at: None,
            reason: Some(FailureKind::StoreUnreadable),
        }
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        match (self.valid, self.failure_at, self.reason) {
            (true, _, _) => format!("ledger valid ({} entries checked)", self.checked_count),
            (false, Some(at), Some(kind)) => format!(
                "ledger TAMPERED at sequence {}: {} ({} entries valid before it)",
                at, kind, self.checked_count
            ),
            (false, _, Some(kind)) => format!("ledger could not be verified: {}", kind),
            (false, _, None) => "ledger invalid".to_string(),
        }
    }
}
