use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const KEY: &str = "cli-test-key-0123456789abcdef0123";

/// Run attest against the ledger at `store` with the test key configured.
fn attest(store: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("attest");
    cmd.env("AUDIT_HMAC_KEY", KEY).arg("--store").arg(store);
    cmd
}

fn append(store: &Path, event_type: &str, actor: &str, payload: &str) {
    attest(store)
        .args(["append", "--event-type", event_type, "--actor", actor, "--payload", payload])
        .assert()
        .success();
}

// ─── Append and verify ───────────────────────────────────────────

#[test]
fn append_then_verify_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");

    append(&store, "2fa.enabled", "user-1", r#"{"method":"totp"}"#);
    append(&store, "2fa.verify.success", "user-1", r#"{"method":"backup_code"}"#);

    attest(&store)
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("ledger valid (2 entries checked)"));
}

#[test]
fn verify_json_reports_tampering_with_exit_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");
    append(&store, "escrow.hold", "user-1", "{}");
    append(&store, "escrow.released", "user-2", "{}");

    let raw = std::fs::read_to_string(&store).unwrap();
    std::fs::write(&store, raw.replace("user-2", "user-3")).unwrap();

    attest(&store)
        .args(["verify", "--json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""failure_at": 1"#))
        .stdout(predicate::str::contains("ChainBroken"));
}

// ─── Key configuration ───────────────────────────────────────────

#[test]
fn append_without_key_fails_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");

    cargo_bin_cmd!("attest")
        .env_remove("AUDIT_HMAC_KEY")
        .arg("--store")
        .arg(&store)
        .args(["append", "--event-type", "2fa.enabled", "--actor", "user-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing key configuration"));

    assert!(!store.exists());
}

#[test]
fn placeholder_key_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");

    cargo_bin_cmd!("attest")
        .env("AUDIT_HMAC_KEY", "dev-secret-key-change-in-production")
        .arg("--store")
        .arg(&store)
        .args(["append", "--event-type", "2fa.enabled", "--actor", "user-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("placeholder"));
}

// ─── List and anchor ─────────────────────────────────────────────

#[test]
fn list_filters_by_actor() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");
    append(&store, "2fa.enabled", "user-1", "{}");
    append(&store, "2fa.enabled", "user-2", "{}");

    attest(&store)
        .args(["list", "--actor", "user-2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user-2"))
        .stdout(predicate::str::contains("user-1").not());
}

#[test]
fn anchor_detects_truncated_tail() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");
    append(&store, "gdpr.erasure.requested", "user-1", "{}");
    append(&store, "gdpr.erasure.issued", "dpo", "{}");

    let output = attest(&store).arg("anchor").output().unwrap();
    let anchor: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let head = anchor["head_chain_value"].as_str().unwrap().to_string();

    let raw = std::fs::read_to_string(&store).unwrap();
    let first_line = raw.lines().next().unwrap();
    std::fs::write(&store, format!("{first_line}\n")).unwrap();

    attest(&store)
        .args(["verify", "--anchor-count", "2", "--anchor-head", &head])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("truncated"));
}

#[test]
fn malformed_payload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");

    attest(&store)
        .args(["append", "--event-type", "2fa.enabled", "--actor", "user-1", "--payload", "[1,2]"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--payload must be a JSON object"));
}

// ─── Missing ledger ──────────────────────────────────────────────

#[test]
fn verify_of_missing_store_is_unreadable_and_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("typo").join("audit.log");

    attest(&store)
        .arg("verify")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("store unreadable"));

    assert!(!store.exists());
    assert!(!dir.path().join("typo").exists());
}

#[test]
fn list_of_missing_store_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("audit.log");

    attest(&store)
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("store unreadable"));

    assert!(!store.exists());
}
