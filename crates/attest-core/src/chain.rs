//! Chain and signature primitives.
//!
//! Chain value input layout (bytes, in order):
//!   1. prev_chain_value as UTF-8 bytes (64 ASCII hex chars)
//!   2. canonical JSON of the record
//!
//! Signature input is the canonical JSON of [`SigningInput`], i.e.
//! `{chain_value, prev_chain_value, record, sequence_number}`.
//!
//! Both writer and verifier call these functions, so the bytes hashed at
//! append time and at verification time cannot drift apart.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use attest_contracts::{
    canonical::to_canonical_bytes,
    entry::SigningInput,
    error::{AttestError, AttestResult},
    record::AuditRecord,
};

type HmacSha256 = Hmac<Sha256>;

/// Compute the chain value binding `record` to `prev_chain_value`.
///
/// Returns a lowercase 64-character hex string.
pub fn chain_value(prev_chain_value: &str, record: &AuditRecord) -> AttestResult<String> {
    let record_bytes = to_canonical_bytes(record)?;

    let mut hasher = Sha256::new();
    hasher.update(prev_chain_value.as_bytes());
    hasher.update(&record_bytes);

    Ok(hex::encode(hasher.finalize()))
}

/// HMAC-SHA256 of the canonical signing input, as lowercase hex.
pub fn sign(key: &[u8], input: &SigningInput<'_>) -> AttestResult<String> {
    let mut mac = new_mac(key)?;
    mac.update(&input.canonical_bytes()?);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature_hex` against the signing input in constant time.
///
/// A signature that is not valid hex is simply a mismatch.
pub fn signature_matches(
    key: &[u8],
    input: &SigningInput<'_>,
    signature_hex: &str,
) -> AttestResult<bool> {
    let Ok(signature) = hex::decode(signature_hex) else {
        return Ok(false);
    };

    let mut mac = new_mac(key)?;
    mac.update(&input.canonical_bytes()?);
    Ok(mac.verify_slice(&signature).is_ok())
}

fn new_mac(key: &[u8]) -> AttestResult<HmacSha256> {
    if key.is_empty() {
        return Err(AttestError::MissingKeyConfiguration {
            reason: "signing key is empty".to_string(),
        });
    }
    HmacSha256::new_from_slice(key).map_err(|e| AttestError::MissingKeyConfiguration {
        reason: format!("signing key rejected: {}", e),
    })
}
