//! # attest-core
//!
//! The trusted primitives of the attest audit ledger:
//!
//! - [`traits::LedgerStore`] and [`traits::Clock`], the seams the writer and
//!   verifier are built on
//! - [`chain`], the SHA-256 chain value and HMAC-SHA256 signature
//!   computations shared by the append and verification paths

pub mod chain;
pub mod traits;

pub use chain::{chain_value, sign, signature_matches};
pub use traits::{Clock, LedgerStore, SystemClock};

#[cfg(test)]
mod tests {
    use serde_json::json;

    use attest_contracts::{AuditRecord, Payload, SignedEntry, SigningInput};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    const KEY: &[u8] = b"unit-test-key-0123456789abcdef";

    fn record(actor: &str) -> AuditRecord {
        let mut payload = Payload::new();
        payload.insert("method".to_string(), json!("totp"));
        AuditRecord::new(1_700_000_000, "2fa.enabled", actor, payload).unwrap()
    }

    // ── Chain value ──────────────────────────────────────────────────────────

    #[test]
    fn chain_value_is_hex_sha256() {
        let value = chain_value(SignedEntry::GENESIS_CHAIN_VALUE, &record("user-1")).unwrap();
        assert_eq!(value.len(), 64);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn chain_value_depends_on_predecessor_and_record() {
        let genesis = SignedEntry::GENESIS_CHAIN_VALUE;
        let base = chain_value(genesis, &record("user-1")).unwrap();

        assert_eq!(base, chain_value(genesis, &record("user-1")).unwrap());
        assert_ne!(base, chain_value(genesis, &record("user-2")).unwrap());
        assert_ne!(base, chain_value(&"f".repeat(64), &record("user-1")).unwrap());
    }

    // ── Signatures ───────────────────────────────────────────────────────────

    #[test]
    fn signature_verifies_under_same_key_only() {
        let rec = record("user-1");
        let chain = chain_value(SignedEntry::GENESIS_CHAIN_VALUE, &rec).unwrap();
        let input = SigningInput {
            sequence_number: 0,
            record: &rec,
            prev_chain_value: SignedEntry::GENESIS_CHAIN_VALUE,
            chain_value: &chain,
        };

        let sig = sign(KEY, &input).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(signature_matches(KEY, &input, &sig).unwrap());
        assert!(!signature_matches(b"another-key-entirely-000000", &input, &sig).unwrap());
    }

    #[test]
    fn signature_covers_sequence_number() {
        let rec = record("user-1");
        let chain = chain_value(SignedEntry::GENESIS_CHAIN_VALUE, &rec).unwrap();
        let mut input = SigningInput {
            sequence_number: 0,
            record: &rec,
            prev_chain_value: SignedEntry::GENESIS_CHAIN_VALUE,
            chain_value: &chain,
        };
        let sig = sign(KEY, &input).unwrap();

        input.sequence_number = 1;
        assert!(!signature_matches(KEY, &input, &sig).unwrap());
    }

    #[test]
    fn non_hex_signature_is_a_mismatch_not_an_error() {
        let rec = record("user-1");
        let input = SigningInput {
            sequence_number: 0,
            record: &rec,
            prev_chain_value: SignedEntry::GENESIS_CHAIN_VALUE,
            chain_value: SignedEntry::GENESIS_CHAIN_VALUE,
        };
        assert!(!signature_matches(KEY, &input, "zz-not-hex").unwrap());
    }

    #[test]
    fn empty_key_is_rejected() {
        let rec = record("user-1");
        let input = SigningInput {
            sequence_number: 0,
            record: &rec,
            prev_chain_value: SignedEntry::GENESIS_CHAIN_VALUE,
            chain_value: SignedEntry::GENESIS_CHAIN_VALUE,
        };
        assert!(sign(&[], &input).is_err());
    }
}
