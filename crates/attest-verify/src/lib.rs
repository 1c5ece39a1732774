//! # attest-verify
//!
//! Tamper-evidence verification for the attest audit ledger.
//!
//! [`engine::IntegrityVerifier`] replays a store snapshot, recomputing each
//! entry's chain value and signature, and returns a
//! [`VerificationReport`](attest_contracts::VerificationReport) naming the
//! first bad position. Tampering is reported as data, never as an error.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use attest_verify::IntegrityVerifier;
//!
//! let verifier = IntegrityVerifier::new(keys)?;
//! let report = verifier.verify(store.as_ref());
//! if !report.valid {
//!     eprintln!("{}", report.summary());
//! }
//! ```

pub mod engine;

pub use engine::IntegrityVerifier;

// ── Tests ─────────────────────────────────────────────────────────────────────
