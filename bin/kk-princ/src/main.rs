//! Kerberos principal module.
//!
//! One-shot: read declarative parameters, issue a single `kadmin.local`
//! operation for the desired state, and print one JSON result object
//! (`changed`/`failed`/`msg`) on stdout. Only usable on a host with the KDC
//! database and the admin tool installed.
//!
//! stdout is reserved for the result object; logs go to stderr
//! (`RUST_LOG`/`LOG_FORMAT` as usual). The process exits non-zero when the
//! result is a failure so shell callers can chain on it.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use kk_common::config::ModuleConfig;
use kk_common::{DesiredState, ModuleReport, Principal, ReconcileRequest};
use kk_reconcile::reconcile;
use kk_store::KadminStore;
use tracing::debug;

/// Reconcile a Kerberos principal against the local KDC database.
#[derive(Parser, Debug)]
#[command(name = "kk-princ")]
#[command(about = "Create, remove, or re-key a Kerberos principal via kadmin.local")]
struct Args {
    /// Desired state of the principal: present, absent, or change
    #[arg(long, default_value = "present")]
    state: DesiredState,

    /// Short name of the principal to create or remove
    #[arg(long)]
    name: String,

    /// Optional instance qualifier, appended as /instance
    #[arg(long)]
    instance: Option<String>,

    /// Optional realm, appended as @realm (defaults to the database realm)
    #[arg(long)]
    realm: Option<String>,

    /// Principal password; omitted or empty means a backend-generated random key
    #[arg(long)]
    password: Option<String>,

    /// Principal attributes, comma separated, passed through on create only
    #[arg(long)]
    attributes: Option<String>,

    /// Path of the admin tool (overrides config and KRBKIT_KADMIN_PATH)
    #[arg(long)]
    kadmin_path: Option<String>,

    /// Deadline for the tool invocation, in seconds (overrides config)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Explicit config file instead of the standard search paths
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    kk_common::logging::init_logging("kk-princ");

    let args = Args::parse();

    let report = match run(args).await {
        Ok(report) => report,
        // Harness errors (unreadable config and the like) still produce the
        // one structured result object the caller is waiting for.
        Err(error) => ModuleReport::failure(format!("{error:#}")),
    };

    println!("{}", report.to_json());

    if report.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(args: Args) -> Result<ModuleReport> {
    let mut config = ModuleConfig::load_from(args.config.as_deref())?;
    if let Some(path) = args.kadmin_path {
        config.kadmin.path = path;
    }
    if let Some(secs) = args.timeout_secs {
        config.kadmin.timeout_secs = secs;
    }

    debug!(tool = %config.kadmin.path, timeout_secs = config.kadmin.timeout_secs, "Resolved kadmin settings");

    let request = ReconcileRequest::new(
        Principal::from_parts(args.name, args.instance, args.realm),
        args.state,
    )
    .with_password(args.password)
    .with_attributes(args.attributes);

    let store = KadminStore::new(&config.kadmin);
    Ok(reconcile(&request, &store).await)
}
