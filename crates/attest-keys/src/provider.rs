//! The process-wide signing key.
//!
//! A `KeyProvider` is built once by the application's composition root and
//! shared (via `Arc`) with the ledger writer and verifier. It starts
//! uninitialized; `initialize` sets the key exactly once and it is then
//! fixed for the life of the process.
//!
//! Loading from configuration tries the key file, then the environment
//! variable. If neither yields acceptable material the provider fails with
//! `MissingKeyConfiguration`. Well-known development placeholders are
//! treated as missing.

use std::fmt;
use std::sync::OnceLock;

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use attest_contracts::error::{AttestError, AttestResult};

use crate::config::KeyConfig;

/// Placeholder secrets that have shipped as "change me" defaults.
const KNOWN_PLACEHOLDER_KEYS: &[&str] = &[
    "dev-secret",
    "dev-secret-key-change-in-production",
    "dev-secret-change-in-production",
    "changeme",
];

#[derive(Zeroize, ZeroizeOnDrop)]
struct SigningKey(Vec<u8>);

/// Holder of the ledger's HMAC key.
pub struct KeyProvider {
    key: OnceLock<SigningKey>,
}

impl KeyProvider {
    /// Create a provider with no key. Every `current_key` call fails until
    /// `initialize` succeeds.
    pub fn new() -> Self {
        Self {
            key: OnceLock::new(),
        }
    }

    /// Create a provider already holding `material`.
    pub fn with_key(material: impl Into<Vec<u8>>) -> AttestResult<Self> {
        let provider = Self::new();
        provider.initialize(material)?;
        Ok(provider)
    }

    /// Load the key described by `config` from the process environment.
    pub fn from_config(config: &KeyConfig) -> AttestResult<Self> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    /// Load the key described by `config`, resolving environment variables
    /// through `lookup_env`.
    pub fn from_config_with<F>(config: &KeyConfig, lookup_env: F) -> AttestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (material, source) = match &config.file {
            Some(path) => {
                let mut bytes = std::fs::read(path).map_err(|e| {
                    AttestError::MissingKeyConfiguration {
                        reason: format!("cannot read key file '{}': {}", path.display(), e),
                    }
                })?;
                while bytes.last().is_some_and(|b| b.is_ascii_whitespace()) {
                    bytes.pop();
                }
                (bytes, format!("file {}", path.display()))
            }
            None => {
                let value = lookup_env(&config.env).ok_or_else(|| {
                    AttestError::MissingKeyConfiguration {
                        reason: format!("environment variable {} is not set", config.env),
                    }
                })?;
                (value.into_bytes(), format!("env {}", config.env))
            }
        };

        if material.len() < config.min_len {
            return Err(AttestError::MissingKeyConfiguration {
                reason: format!(
                    "key from {} is {} bytes, at least {} required",
                    source,
                    material.len(),
                    config.min_len
                ),
            });
        }

        let provider = Self::with_key(material)?;
        info!(
            source = %source,
            fingerprint = %provider.fingerprint()?,
            "audit signing key loaded"
        );
        Ok(provider)
    }

    /// Set the key. Fails if the material is empty, a known placeholder, or
    /// a key has already been set.
    pub fn initialize(&self, material: impl Into<Vec<u8>>) -> AttestResult<()> {
        let material = SigningKey(material.into());

        if material.0.is_empty() {
            return Err(AttestError::MissingKeyConfiguration {
                reason: "key material is empty".to_string(),
            });
        }
        if KNOWN_PLACEHOLDER_KEYS
            .iter()
            .any(|placeholder| placeholder.as_bytes() == material.0.as_slice())
        {
            return Err(AttestError::MissingKeyConfiguration {
                reason: "key material is a known development placeholder".to_string(),
            });
        }

        self.key.set(material).map_err(|_| AttestError::ConfigError {
            reason: "signing key is already initialized".to_string(),
        })?;
        debug!("key provider initialized");
        Ok(())
    }

    /// The raw key bytes.
    pub fn current_key(&self) -> AttestResult<&[u8]> {
        self.key
            .get()
            .map(|k| k.0.as_slice())
            .ok_or_else(|| AttestError::MissingKeyConfiguration {
                reason: "no signing key has been configured".to_string(),
            })
    }

    pub fn is_initialized(&self) -> bool {
        self.key.get().is_some()
    }

    /// Non-secret identifier of the key: first 8 bytes of its SHA-256, hex.
    pub fn fingerprint(&self) -> AttestResult<String> {
        let digest = Sha256::digest(self.current_key()?);
        Ok(hex::encode(&digest[..8]))
    }
}

impl Default for KeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyProvider")
            .field("initialized", &self.is_initialized())
            .field("fingerprint", &self.fingerprint().ok())
            .finish()
    }
}
