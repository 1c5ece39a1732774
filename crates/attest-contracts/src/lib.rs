//! # attest-contracts
//!
//! Shared types for the attest audit ledger: the immutable [`record::AuditRecord`],
//! the persisted [`entry::SignedEntry`], the verifier's
//! [`report::VerificationReport`], the canonical JSON encoding both signing
//! and verification rely on, and the error taxonomy.
//!
//! No ledger logic lives in this crate, only data definitions.

pub mod canonical;
pub mod entry;
pub mod error;
pub mod record;
pub mod report;

pub use entry::{LedgerAnchor, SignedEntry, SigningInput};
pub use error::{AttestError, AttestResult};
pub use record::{AuditRecord, Payload};
pub use report::{FailureKind, VerificationReport};
