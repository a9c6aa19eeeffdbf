//! Reconcile command
//!
//! Usage: routesync reconcile --desired <FILE> [--state <FILE>] [--dry-run]
//!        [--strict] [--output text|json]
//!
//! With `--dry-run` the plan is computed against the stored baseline and
//! "applied" to a simulated table; neither the host nor the baseline file
//! is touched.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use routesync_core::diff::{render_human_summary, route_set_digest, DuplicatePolicy};
use routesync_core::{DiffResult, MemoryStore, NormalizedRoute, OperationFailure, RouteStore};
use routesync_engine::{
    DryRunManager, IpCommandManager, ReconcileError, ReconcileReport, Reconciler,
};
use routesync_store::FileStore;
use serde::Serialize;

use crate::commands::{cancel_on_ctrl_c, print_json, read_routes, OutputFormat, EXIT_PARTIAL};
use crate::config::Settings;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Desired full route set (JSON array)
    #[arg(long)]
    pub desired: PathBuf,

    /// Baseline file
    #[arg(long, env = "ROUTESYNC_STATE")]
    pub state: Option<PathBuf>,

    /// Compute and print the plan without changing the host or the baseline
    #[arg(long)]
    pub dry_run: bool,

    /// Fail when a set lists the same route twice
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Serialize)]
struct FailureView {
    op: String,
    route: NormalizedRoute,
    error: String,
}

impl From<&OperationFailure> for FailureView {
    fn from(failure: &OperationFailure) -> Self {
        Self {
            op: failure.op.to_string(),
            route: failure.route.clone(),
            error: failure.error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ReconcileView<'a> {
    reconcile_id: &'a str,
    dry_run: bool,
    converged: bool,
    diff: &'a DiffResult,
    applied: &'a [NormalizedRoute],
    applied_digest: String,
    failures: Vec<FailureView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    save_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    operations: Vec<String>,
}

/// Execute reconcile command
pub async fn execute(args: ReconcileArgs, settings: &Settings) -> Result<ExitCode> {
    let desired = read_routes(&args.desired)?;
    let file_store = FileStore::new(&settings.state_path);

    let policy = if settings.strict_duplicates {
        DuplicatePolicy::Reject
    } else {
        DuplicatePolicy::LastWins
    };

    let mut dry_run = None;
    let builder = if args.dry_run {
        let baseline = file_store.load()?;
        let manager = Arc::new(DryRunManager::with_routes(&baseline)?);
        dry_run = Some(manager.clone());
        Reconciler::builder()
            .manager(manager)
            .store(Arc::new(MemoryStore::with_routes(baseline)))
    } else {
        Reconciler::builder()
            .manager(Arc::new(IpCommandManager::new(&settings.ip_path)))
            .store(Arc::new(file_store))
    };
    let reconciler = builder.duplicate_policy(policy).build();

    let cancel = cancel_on_ctrl_c();
    let result = reconciler.reconcile(&desired, &cancel).await;
    let operations = dry_run.map(|m| m.operations()).unwrap_or_default();

    match result {
        Ok(report) => {
            render(args.output, args.dry_run, &report, &[], None, operations)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ReconcileError::Partial(partial)) => {
            let save_error = partial.save_error.as_ref().map(|e| e.to_string());
            render(
                args.output,
                args.dry_run,
                &partial.report,
                &partial.failures,
                save_error,
                operations,
            )?;
            eprintln!("Error: {}", partial);
            Ok(ExitCode::from(EXIT_PARTIAL))
        }
        Err(err) => Err(err.into()),
    }
}

fn render(
    output: OutputFormat,
    dry_run: bool,
    report: &ReconcileReport,
    failures: &[OperationFailure],
    save_error: Option<String>,
    operations: Vec<String>,
) -> Result<()> {
    match output {
        OutputFormat::Json => print_json(&ReconcileView {
            reconcile_id: report.reconcile_id.as_str(),
            dry_run,
            converged: failures.is_empty() && save_error.is_none(),
            diff: &report.diff,
            applied: &report.applied,
            applied_digest: route_set_digest(&report.applied),
            failures: failures.iter().map(FailureView::from).collect(),
            save_error,
            operations,
        }),
        OutputFormat::Text => {
            if dry_run {
                println!("dry run: host and baseline left unchanged");
            }
            print!("{}", render_human_summary(&report.diff));
            println!(
                "applied {} route(s) (digest {})",
                report.applied.len(),
                route_set_digest(&report.applied)
            );
            Ok(())
        }
    }
}
