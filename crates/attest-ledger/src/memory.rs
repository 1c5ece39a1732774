//! In-memory implementation of `LedgerStore`.
//!
//! `MemoryStore` keeps encoded lines in a `Vec` behind an `RwLock`. It backs
//! tests and short-lived tools. With the `test-hooks` feature (always on in
//! this crate's own tests) it also exposes hooks to rewrite or drop stored
//! lines and to fail appends, which is how tamper and outage scenarios are
//! exercised.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use attest_contracts::error::{AttestError, AttestResult};
use attest_core::traits::LedgerStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    lines: RwLock<Vec<String>>,
    fail_appends: AtomicBool,
    fail_after_write: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AttestResult<RwLockReadGuard<'_, Vec<String>>> {
        self.lines.read().map_err(|e| AttestError::StoreUnreadable {
            reason: format!("memory store lock poisoned: {}", e),
        })
    }

    fn write(&self) -> AttestResult<RwLockWriteGuard<'_, Vec<String>>> {
        self.lines.write().map_err(|e| AttestError::PersistenceFailure {
            reason: format!("memory store lock poisoned: {}", e),
        })
    }
}

// ── Fault and tamper hooks ────────────────────────────────────────────────────

#[cfg(any(test, feature = "test-hooks"))]
impl MemoryStore {
    /// When `fail` is true every subsequent append returns
    /// `PersistenceFailure` and stores nothing.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// When `fail` is true every subsequent append stores its line and then
    /// returns `PersistenceFailure`, like a file whose flush failed after the
    /// bytes landed and could not be rolled back.
    pub fn set_fail_after_write(&self, fail: bool) {
        self.fail_after_write.store(fail, Ordering::SeqCst);
    }

    /// Overwrite the line at `index` in place.
    pub fn replace_line(&self, index: usize, line: impl Into<String>) -> AttestResult<()> {
        let mut lines = self.write()?;
        let slot = lines.get_mut(index).ok_or_else(|| AttestError::PersistenceFailure {
            reason: format!("no line at index {}", index),
        })?;
        *slot = line.into();
        Ok(())
    }

    /// Remove the line at `index`, shifting later lines down.
    pub fn remove_line(&self, index: usize) -> AttestResult<String> {
        let mut lines = self.write()?;
        if index >= lines.len() {
            return Err(AttestError::PersistenceFailure {
                reason: format!("no line at index {}", index),
            });
        }
        Ok(lines.remove(index))
    }
}

// ── LedgerStore impl ──────────────────────────────────────────────────────────

impl LedgerStore for MemoryStore {
    fn append_line(&self, line: &str) -> AttestResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AttestError::PersistenceFailure {
                reason: "memory store is rejecting writes".to_string(),
            });
        }
        self.write()?.push(line.to_string());
        if self.fail_after_write.load(Ordering::SeqCst) {
            return Err(AttestError::PersistenceFailure {
                reason: "memory store failed after the line was stored".to_string(),
            });
        }
        Ok(())
    }

    fn read_lines(&self) -> AttestResult<Vec<String>> {
        Ok(self.read()?.clone())
    }

    fn len(&self) -> AttestResult<u64> {
        Ok(self.read()?.len() as u64)
    }
}
