//! # attest-keys
//!
//! The Key Provider for the attest audit ledger, and the TOML configuration
//! that tells it where the key lives.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::{path::Path, sync::Arc};
//! use attest_keys::{KeyProvider, LedgerConfig};
//!
//! let config = LedgerConfig::from_file(Path::new("attest.toml"))?;
//! let keys = Arc::new(KeyProvider::from_config(&config.key)?);
//! ```
//!
//! The provider never falls back to a built-in key. A process without key
//! material cannot write to the ledger.

pub mod config;
pub mod provider;

pub use config::{KeyConfig, LedgerConfig, StoreConfig};
pub use provider::KeyProvider;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    use attest_contracts::AttestError;

    use crate::config::{DEFAULT_KEY_ENV, DEFAULT_MIN_KEY_LEN};
    use crate::{KeyConfig, KeyProvider, LedgerConfig};

    // ── Helpers ───────────────────────────────────────────────────────────────

    const GOOD_KEY: &str = "0123456789abcdef0123456789abcdef";

    /// Build an environment lookup closure over a fixed map so tests never
    /// touch the real process environment.
    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    // ── KeyProvider lifecycle ─────────────────────────────────────────────────

    #[test]
    fn uninitialized_provider_reports_missing_key() {
        let keys = KeyProvider::new();
        assert!(!keys.is_initialized());
        let err = keys.current_key().unwrap_err();
        assert!(matches!(err, AttestError::MissingKeyConfiguration { .. }));
    }

    #[test]
    fn initialize_sets_key_once() {
        let keys = KeyProvider::new();
        keys.initialize(GOOD_KEY).unwrap();
        assert_eq!(keys.current_key().unwrap(), GOOD_KEY.as_bytes());

        let err = keys.initialize("a-different-key-000000").unwrap_err();
        assert!(matches!(err, AttestError::ConfigError { .. }));
        assert_eq!(keys.current_key().unwrap(), GOOD_KEY.as_bytes());
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = KeyProvider::with_key(Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, AttestError::MissingKeyConfiguration { .. }));
    }

    #[test]
    fn placeholder_key_is_rejected() {
        for placeholder in ["dev-secret", "dev-secret-key-change-in-production"] {
            let err = KeyProvider::with_key(placeholder).unwrap_err();
            assert!(
                err.to_string().contains("placeholder"),
                "placeholder {placeholder} must be refused, got: {err}"
            );
        }
    }

    #[test]
    fn fingerprint_is_stable_and_not_the_key() {
        let a = KeyProvider::with_key(GOOD_KEY).unwrap();
        let b = KeyProvider::with_key(GOOD_KEY).unwrap();
        let fp = a.fingerprint().unwrap();
        assert_eq!(fp, b.fingerprint().unwrap());
        assert_eq!(fp.len(), 16);
        assert!(!fp.contains(GOOD_KEY));

        let debug = format!("{:?}", a);
        assert!(!debug.contains(GOOD_KEY));
        assert!(debug.contains(&fp));
    }

    // ── Loading from configuration ────────────────────────────────────────────

    #[test]
    fn loads_key_from_environment() {
        let config = KeyConfig::default();
        let keys =
            KeyProvider::from_config_with(&config, env_of(&[(DEFAULT_KEY_ENV, GOOD_KEY)])).unwrap();
        assert_eq!(keys.current_key().unwrap(), GOOD_KEY.as_bytes());
    }

    #[test]
    fn missing_environment_variable_fails_fast() {
        let err = KeyProvider::from_config_with(&KeyConfig::default(), env_of(&[])).unwrap_err();
        match err {
            AttestError::MissingKeyConfiguration { reason } => {
                assert!(reason.contains(DEFAULT_KEY_ENV), "got: {reason}");
            }
            other => panic!("expected MissingKeyConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn short_key_is_rejected() {
        let err = KeyProvider::from_config_with(
            &KeyConfig::default(),
            env_of(&[(DEFAULT_KEY_ENV, "short")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains(&DEFAULT_MIN_KEY_LEN.to_string()));
    }

    #[test]
    fn key_file_takes_precedence_and_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", GOOD_KEY).unwrap();

        let config = KeyConfig {
            file: Some(file.path().to_path_buf()),
            ..KeyConfig::default()
        };
        let keys = KeyProvider::from_config_with(
            &config,
            env_of(&[(DEFAULT_KEY_ENV, "env-key-should-not-be-used")]),
        )
        .unwrap();
        assert_eq!(keys.current_key().unwrap(), GOOD_KEY.as_bytes());
    }

    #[test]
    fn unreadable_key_file_is_missing_configuration() {
        let config = KeyConfig {
            file: Some(PathBuf::from("/nonexistent/attest/key")),
            ..KeyConfig::default()
        };
        let err = KeyProvider::from_config_with(&config, env_of(&[])).unwrap_err();
        assert!(matches!(err, AttestError::MissingKeyConfiguration { .. }));
    }

    // ── LedgerConfig ──────────────────────────────────────────────────────────

    #[test]
    fn empty_config_uses_defaults() {
        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.key.env, DEFAULT_KEY_ENV);
        assert_eq!(config.store.path, PathBuf::from("var/audit.log"));
    }

    #[test]
    fn config_overrides_are_applied() {
        let toml = r#"
            [store]
            path = "/srv/ledger/audit.jsonl"

            [key]
            env = "LEDGER_KEY"
            min_len = 32
        "#;
        let config = LedgerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/srv/ledger/audit.jsonl"));
        assert_eq!(config.key.env, "LEDGER_KEY");
        assert_eq!(config.key.min_len, 32);
        assert_eq!(config.key.file, None);
    }

    #[test]
    fn inline_secret_in_config_is_rejected() {
        let toml = r#"
            [key]
            secret = "do-not-put-keys-here"
        "#;
        let err = LedgerConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, AttestError::ConfigError { .. }));
    }

    #[test]
    fn config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\npath = \"ledger.log\"").unwrap();
        let config = LedgerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.store.path, PathBuf::from("ledger.log"));
    }
}
