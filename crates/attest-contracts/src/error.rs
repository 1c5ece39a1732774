//! Error types for the attest ledger.
//!
//! Every fallible write-path or setup operation returns `AttestResult<T>`.
//! Verification findings are *not* errors: they are reported as
//! [`FailureKind`](crate::report::FailureKind) values inside a
//! [`VerificationReport`](crate::report::VerificationReport).

use thiserror::Error;

/// The unified error type for the attest crates.
#[derive(Debug, Error)]
pub enum AttestError {
    /// No usable signing key is available.
    ///
    /// Fatal at startup: the ledger refuses every write until a key is
    /// configured. There is no fallback key.
    #[error("missing key configuration: {reason}")]
    MissingKeyConfiguration { reason: String },

    /// The store rejected or failed a durable write.
    ///
    /// Safe to retry: the writer's sequence counter and head chain value were
    /// not advanced.
    #[error("persistence failure: {reason}")]
    PersistenceFailure { reason: String },

    /// The store could not be opened or read.
    #[error("store unreadable: {reason}")]
    StoreUnreadable { reason: String },

    /// The caller supplied an event that cannot be recorded.
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// A configuration document or key source is malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// Canonical encoding or decoding failed.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

/// Convenience alias used throughout the attest crates.
pub type AttestResult<T> = Result<T, AttestError>;

impl From<serde_json::Error> for AttestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
