//! Ledger configuration schema.
//!
//! A `LedgerConfig` is deserialized from TOML. Every field has a default,
//! so an empty document is valid. The signing secret itself never appears in
//! the document: `[key]` only says *where* to find it.
//!
//! Example:
//! ```toml
//! [store]
//! path = "var/audit.log"
//!
//! [key]
//! env = "AUDIT_HMAC_KEY"
//! file = "/run/secrets/audit_hmac_key"
//! min_len = 32
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use attest_contracts::error::{AttestError, AttestResult};

/// Default environment variable holding the HMAC key.
pub const DEFAULT_KEY_ENV: &str = "AUDIT_HMAC_KEY";

/// Default location of the JSON Lines ledger file.
pub const DEFAULT_STORE_PATH: &str = "var/audit.log";

/// Shortest key material accepted from configuration, in bytes.
pub const DEFAULT_MIN_KEY_LEN: usize = 16;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub key: KeyConfig,
}

impl LedgerConfig {
    /// Parse `s` as a TOML configuration document.
    ///
    /// Returns `AttestError::ConfigError` if the TOML is malformed or has
    /// fields this schema does not know (for example an inline secret).
    pub fn from_toml_str(s: &str) -> AttestResult<Self> {
        toml::from_str(s).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to parse ledger config TOML: {}", e),
        })
    }

    /// Read and parse the configuration file at `path`.
    pub fn from_file(path: &Path) -> AttestResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AttestError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Where the ledger lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the JSON Lines ledger file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Where the signing key comes from.
///
/// `file` is consulted first, then the `env` variable. Nothing else: there
/// is no built-in fallback key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    /// Environment variable holding the key.
    #[serde(default = "default_key_env")]
    pub env: String,

    /// Optional file holding the key. Trailing whitespace is ignored.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Minimum accepted key length in bytes.
    #[serde(default = "default_min_key_len")]
    pub min_len: usize,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            env: default_key_env(),
            file: None,
            min_len: default_min_key_len(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_key_env() -> String {
    DEFAULT_KEY_ENV.to_string()
}

fn default_min_key_len() -> usize {
    DEFAULT_MIN_KEY_LEN
}
