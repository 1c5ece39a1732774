//! JSON Lines file implementation of `LedgerStore`.
//!
//! One canonical `SignedEntry` per line, `\n` terminated. Each append is a
//! single `write_all` on an append-mode handle followed by `sync_data`; if
//! either fails the file is truncated back to its previous length so no torn
//! line survives a failed append.
//!
//! Readers only see complete lines. Bytes after the final newline belong to
//! a write still in flight and are left out of the snapshot. Readers going
//! through the same writable store wait out an append and its rollback, so
//! a line that is about to be rolled back is never part of their snapshot.
//! Readers in another process get no such guarantee.
//!
//! [`JsonlFileStore::open_read_only`] is for verification and inspection: it
//! never creates, trims or writes the file.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use attest_contracts::error::{AttestError, AttestResult};
use attest_core::traits::LedgerStore;

/// Append-only ledger file.
#[derive(Debug)]
pub struct JsonlFileStore {
    path: PathBuf,
    /// Append handle; `None` for a read-only store.
    file: Option<Mutex<File>>,
}

// ── Opening ───────────────────────────────────────────────────────────────────

impl JsonlFileStore {
    /// Open (creating if needed) the ledger file at `path` for appending.
    ///
    /// Parent directories are created. A trailing fragment left by a crash
    /// mid-append is cut off so the next entry starts on a fresh line.
    pub fn open(path: impl AsRef<Path>) -> AttestResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| AttestError::StoreUnreadable {
                reason: format!("failed to create ledger directory '{}': {}", parent.display(), e),
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AttestError::StoreUnreadable {
                reason: format!("failed to open ledger file '{}': {}", path.display(), e),
            })?;

        let store = Self {
            path,
            file: Some(Mutex::new(file)),
        };
        store.drop_torn_tail()?;
        Ok(store)
    }

    /// Open an existing ledger file for reading only.
    ///
    /// A missing path is `StoreUnreadable`. An unterminated trailing fragment
    /// is left on disk and simply excluded from snapshots; it may be another
    /// process's append in flight.
    pub fn open_read_only(path: impl AsRef<Path>) -> AttestResult<Self> {
        let path = path.as_ref().to_path_buf();

        let metadata = std::fs::metadata(&path).map_err(|e| AttestError::StoreUnreadable {
            reason: format!("ledger file '{}' is not accessible: {}", path.display(), e),
        })?;
        if !metadata.is_file() {
            return Err(AttestError::StoreUnreadable {
                reason: format!("ledger path '{}' is not a regular file", path.display()),
            });
        }

        debug!(path = %path.display(), "ledger opened read-only");
        Ok(Self { path, file: None })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.file.is_none()
    }

    fn drop_torn_tail(&self) -> AttestResult<()> {
        let file = self.lock_file()?;
        let bytes = self.read_bytes()?;
        let complete = complete_prefix_len(&bytes);
        if complete == bytes.len() {
            return Ok(());
        }

        warn!(
            path = %self.path.display(),
            discarded_bytes = bytes.len() - complete,
            "discarding unterminated trailing ledger line"
        );
        file.set_len(complete as u64)
            .and_then(|_| file.sync_data())
            .map_err(|e| AttestError::PersistenceFailure {
                reason: format!("failed to trim torn ledger tail: {}", e),
            })
    }

    fn read_bytes(&self) -> AttestResult<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AttestError::StoreUnreadable {
                reason: format!("ledger file '{}' has disappeared", self.path.display()),
            }),
            Err(e) => Err(AttestError::StoreUnreadable {
                reason: format!("failed to read ledger file '{}': {}", self.path.display(), e),
            }),
        }
    }

    fn lock_file(&self) -> AttestResult<MutexGuard<'_, File>> {
        let file = self.file.as_ref().ok_or_else(|| AttestError::PersistenceFailure {
            reason: format!("ledger file '{}' was opened read-only", self.path.display()),
        })?;
        file.lock().map_err(|e| AttestError::PersistenceFailure {
            reason: format!("ledger file lock poisoned: {}", e),
        })
    }
}

// ── LedgerStore impl ──────────────────────────────────────────────────────────

impl LedgerStore for JsonlFileStore {
    fn append_line(&self, line: &str) -> AttestResult<()> {
        if line.contains('\n') {
            return Err(AttestError::PersistenceFailure {
                reason: "encoded entry contains a newline".to_string(),
            });
        }

        let mut file = self.lock_file()?;
        let len_before = file
            .metadata()
            .map_err(|e| AttestError::PersistenceFailure {
                reason: format!("failed to stat ledger file: {}", e),
            })?
            .len();

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let written = file.write_all(&buf).and_then(|_| file.sync_data());
        if let Err(e) = written {
            // If the rollback fails too, the line may stay on disk; the
            // writer detects that through `len` and stops appending.
            if let Err(trim) = file.set_len(len_before) {
                warn!(error = %trim, "failed to roll back partial ledger write");
            }
            return Err(AttestError::PersistenceFailure {
                reason: format!("failed to append to '{}': {}", self.path.display(), e),
            });
        }

        debug!(path = %self.path.display(), bytes = buf.len(), "ledger line appended");
        Ok(())
    }

    fn read_lines(&self) -> AttestResult<Vec<String>> {
        let _append_in_progress = match &self.file {
            Some(file) => Some(file.lock().map_err(|e| AttestError::StoreUnreadable {
                reason: format!("ledger file lock poisoned: {}", e),
            })?),
            None => None,
        };

        let bytes = self.read_bytes()?;
        let complete = &bytes[..complete_prefix_len(&bytes)];

        Ok(complete
            .split(|b| *b == b'\n')
            .filter(|raw| !raw.iter().all(u8::is_ascii_whitespace))
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect())
    }
}

/// Length of the prefix of `bytes` made of complete (`\n` terminated) lines.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rposition(|b| *b == b'\n')
        .map(|pos| pos + 1)
        .unwrap_or(0)
}
