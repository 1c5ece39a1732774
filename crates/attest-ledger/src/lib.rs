//! # attest-ledger
//!
//! Append-only, HMAC-signed, SHA-256 hash-chained audit ledger.
//!
//! ## Overview
//!
//! [`LedgerWriter::append`] stamps a record with the current time, links it
//! to the previous entry through its chain value, signs the result with the
//! key from [`attest_keys::KeyProvider`], and persists it through a
//! [`attest_core::LedgerStore`]. Two stores ship with the crate:
//!
//! - [`JsonlFileStore`]: the production store, one entry per line
//! - [`MemoryStore`]: tests and tooling
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use attest_ledger::{JsonlFileStore, LedgerWriter};
//!
//! let store = Arc::new(JsonlFileStore::open("var/audit.log")?);
//! let writer = LedgerWriter::open(store, keys)?;
//! writer.append("2fa.enabled", "user-1", payload)?;
//! ```

pub mod file;
pub mod memory;
pub mod query;
pub mod writer;

pub use file::JsonlFileStore;
pub use memory::MemoryStore;
pub use query::{query_entries, EntryQuery, DEFAULT_QUERY_LIMIT};
pub use writer::LedgerWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────
