//! attest: operator CLI for the tamper-evident audit ledger.
//!
//! Appends events, verifies the chain, lists entries and prints anchors for
//! the JSON Lines ledger configured in a TOML file (or the defaults).
//! The HMAC key is read from the environment variable or key file named in
//! the configuration; there is no default key.
//!
//! Usage:
//!   attest append --event-type 2fa.enabled --actor user-1 --payload '{"method":"totp"}'
//!   attest verify --json
//!   attest list --actor user-1 --limit 20
//!   attest anchor

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use attest_contracts::{
    AttestError, AttestResult, FailureKind, LedgerAnchor, Payload, VerificationReport,
};
use attest_keys::{KeyProvider, LedgerConfig};
use attest_ledger::{query_entries, EntryQuery, JsonlFileStore, LedgerWriter, DEFAULT_QUERY_LIMIT};
use attest_verify::IntegrityVerifier;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Tamper-evident audit ledger tool.
#[derive(Parser)]
#[command(
    name = "attest",
    about = "Append to and verify the HMAC-signed, hash-chained audit ledger",
    long_about = "Appends security events to the audit ledger and verifies its integrity.\n\
                  The signing key is taken from the environment variable or key file named\n\
                  in the configuration (default: $AUDIT_HMAC_KEY)."
)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger file, overriding `[store] path` from the configuration.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append one event and print the signed entry.
    Append {
        /// Event class, e.g. `2fa.enabled` or `escrow.released`.
        #[arg(long)]
        event_type: String,
        /// Principal responsible for the action.
        #[arg(long)]
        actor: String,
        /// Event details as a JSON object.
        #[arg(long, default_value = "{}")]
        payload: String,
    },
    /// Verify the whole ledger. Exits 2 when tampering is found, 1 when the
    /// ledger cannot be read.
    Verify(VerifyArgs),
    /// List entries, newest first.
    List {
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        event_type: Option<String>,
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Print the current anchor (entry count and head chain value).
    Anchor,
}

#[derive(Args)]
struct VerifyArgs {
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Entry count of a previously recorded anchor.
    #[arg(long, requires = "anchor_head")]
    anchor_count: Option<u64>,

    /// Head chain value of a previously recorded anchor.
    #[arg(long, requires = "anchor_count")]
    anchor_head: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("attest error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> AttestResult<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(path) = cli.store {
        config.store.path = path;
    }
    debug!(store = %config.store.path.display(), "using ledger");

    match cli.command {
        Command::Append {
            event_type,
            actor,
            payload,
        } => run_append(&config, &event_type, &actor, &payload),
        Command::Verify(args) => run_verify(&config, &args),
        Command::List {
            actor,
            event_type,
            limit,
            offset,
        } => run_list(
            &config,
            &EntryQuery {
                actor_id: actor,
                event_type,
                limit,
                offset,
            },
        ),
        Command::Anchor => run_anchor(&config),
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn run_append(
    config: &LedgerConfig,
    event_type: &str,
    actor: &str,
    payload: &str,
) -> AttestResult<ExitCode> {
    let payload: Payload = serde_json::from_str(payload).map_err(|e| AttestError::InvalidRecord {
        reason: format!("--payload must be a JSON object: {}", e),
    })?;

    // Fail on a missing key before the store is created.
    let keys = Arc::new(KeyProvider::from_config(&config.key)?);
    let store = Arc::new(JsonlFileStore::open(&config.store.path)?);
    let writer = LedgerWriter::open(store, keys)?;

    let entry = writer.append(event_type, actor, payload)?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(ExitCode::SUCCESS)
}

fn run_verify(config: &LedgerConfig, args: &VerifyArgs) -> AttestResult<ExitCode> {
    let keys = Arc::new(KeyProvider::from_config(&config.key)?);
    let verifier = IntegrityVerifier::new(keys)?;

    let report = match JsonlFileStore::open_read_only(&config.store.path) {
        Err(e) => {
            warn!(error = %e, "ledger store unreadable");
            VerificationReport::unreadable()
        }
        Ok(store) => match (args.anchor_count, &args.anchor_head) {
            (Some(entry_count), Some(head)) => verifier.verify_against_anchor(
                &store,
                &LedgerAnchor {
                    entry_count,
                    head_chain_value: head.clone(),
                },
            ),
            _ => verifier.verify(&store),
        },
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }

    Ok(match (report.valid, report.reason) {
        (true, _) => ExitCode::SUCCESS,
        (false, Some(FailureKind::StoreUnreadable)) => ExitCode::from(1),
        (false, _) => ExitCode::from(2),
    })
}

fn run_list(config: &LedgerConfig, query: &EntryQuery) -> AttestResult<ExitCode> {
    let store = JsonlFileStore::open_read_only(&config.store.path)?;
    for entry in query_entries(&store, query)? {
        println!("{}", serde_json::to_string(&entry)?);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_anchor(config: &LedgerConfig) -> AttestResult<ExitCode> {
    let store = Arc::new(JsonlFileStore::open_read_only(&config.store.path)?);
    // Reading the tail needs no key.
    let writer = LedgerWriter::open(store, Arc::new(KeyProvider::new()))?;
    println!("{}", serde_json::to_string_pretty(&writer.anchor()?)?);
    Ok(ExitCode::SUCCESS)
}
