//! Cluster-manager local-user module.
//!
//! One-shot: create a local user through the cluster-manager REST API and
//! print one JSON result object (`changed`/`failed`/`msg`) on stdout. This
//! backend only supports creation; asking for any other state is reported as
//! a failure rather than silently skipped.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use kk_common::config::ModuleConfig;
use kk_common::{DesiredState, ModuleReport, Principal, ReconcileRequest};
use kk_reconcile::reconcile;
use kk_store::{CmRole, CmStore};
use tracing::debug;

/// Reconcile a local user against the cluster-manager API.
#[derive(Parser, Debug)]
#[command(name = "kk-cm-user")]
#[command(about = "Create a cluster-manager local user over its REST API")]
struct Args {
    /// Desired state; this backend only supports present
    #[arg(long, default_value = "present")]
    state: DesiredState,

    /// Name of the user to create
    #[arg(long)]
    name: String,

    /// Login password for the new user (the API has no random-key notion)
    #[arg(long)]
    password: String,

    /// Role granted to the user: admin or user
    #[arg(long, default_value = "user")]
    role: CmRole,

    /// Cluster-manager base URL, scheme included (overrides config)
    #[arg(long)]
    url: Option<String>,

    /// API login (overrides config)
    #[arg(long)]
    username: Option<String>,

    /// API password (overrides config)
    #[arg(long)]
    api_password: Option<String>,

    /// REST API version segment (overrides config)
    #[arg(long)]
    api_version: Option<u32>,

    /// Deadline for the API request, in seconds (overrides config)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Explicit config file instead of the standard search paths
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    kk_common::logging::init_logging("kk-cm-user");

    let args = Args::parse();

    let report = match run(args).await {
        Ok(report) => report,
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
    if args.state != DesiredState::Present {
        bail!(
            "state '{}' is not supported by the cluster-manager backend; only 'present' is",
            args.state
        );
    }

    let mut config = ModuleConfig::load_from(args.config.as_deref())?;
    if let Some(url) = args.url {
        config.cluster_manager.url = url;
    }
    if let Some(username) = args.username {
        config.cluster_manager.username = username;
    }
    if let Some(password) = args.api_password {
        config.cluster_manager.password = password;
    }
    if let Some(version) = args.api_version {
        config.cluster_manager.api_version = version;
    }
    if let Some(secs) = args.timeout_secs {
        config.cluster_manager.timeout_secs = secs;
    }

    if config.cluster_manager.url.is_empty() {
        bail!("cluster-manager URL is not configured (use --url, KRBKIT_CM_URL, or the [cluster_manager] config section)");
    }

    debug!(
        url = %config.cluster_manager.url,
        api_version = config.cluster_manager.api_version,
        "Resolved cluster-manager settings"
    );

    let request = ReconcileRequest::new(Principal::new(args.name), DesiredState::Present)
        .with_password(Some(args.password));

    let store = CmStore::new(&config.cluster_manager, args.role)?;
    Ok(reconcile(&request, &store).await)
}
