//! The signed, chained unit that is actually persisted.

use serde::{Deserialize, Serialize};

use crate::{
    canonical::{to_canonical_bytes, to_canonical_string},
    error::AttestResult,
    record::AuditRecord,
};

/// A single line of the ledger.
///
/// `chain_value` binds this entry to its predecessor, so deleting or
/// reordering entries is detectable even when each signature is still
/// individually valid. `signature` is an HMAC over the canonical encoding of
/// every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEntry {
    /// Position in the store, starting at 0.
    pub sequence_number: u64,

    /// The event being recorded.
    pub record: AuditRecord,

    /// `chain_value` of the previous entry, or `GENESIS_CHAIN_VALUE` for
    /// sequence 0.
    pub prev_chain_value: String,

    /// Lowercase hex SHA-256 over `prev_chain_value` and the canonical record.
    pub chain_value: String,

    /// Lowercase hex HMAC-SHA256 over [`SigningInput`].
    pub signature: String,
}

impl SignedEntry {
    /// The `prev_chain_value` of the first entry in every store.
    ///
    /// 64 hex zeros, the same width as a real SHA-256 digest.
    pub const GENESIS_CHAIN_VALUE: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// The fields covered by `signature`.
    pub fn signing_input(&self) -> SigningInput<'_> {
        SigningInput {
            sequence_number: self.sequence_number,
            record: &self.record,
            prev_chain_value: &self.prev_chain_value,
            chain_value: &self.chain_value,
        }
    }

    /// Encode as one canonical JSON line (without the trailing newline).
    pub fn to_line(&self) -> AttestResult<String> {
        to_canonical_string(self)
    }

    /// Decode one stored line.
    pub fn from_line(line: &str) -> AttestResult<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Borrowed view of the signed portion of an entry.
///
/// Used both before the entry exists (at append time) and when re-checking a
/// stored entry, so the two paths always hash the same bytes.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SigningInput<'a> {
    pub sequence_number: u64,
    pub record: &'a AuditRecord,
    pub prev_chain_value: &'a str,
    pub chain_value: &'a str,
}

impl SigningInput<'_> {
    pub fn canonical_bytes(&self) -> AttestResult<Vec<u8>> {
        to_canonical_bytes(self)
    }
}

/// A compact commitment to the whole ledger at one point in time.
///
/// Recording an anchor outside the store (a ticket, a log line, a second
/// system) lets a later verification run detect entries removed from the
/// end of the store, which the chain alone cannot reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAnchor {
    /// Number of entries covered by the anchor.
    pub entry_count: u64,
    /// `chain_value` of the last covered entry, or `GENESIS_CHAIN_VALUE`.
    pub head_chain_value: String,
}
