//! Diff command
//!
//! Usage: routesync diff --old <FILE> --new <FILE> [--strict] [--output text|json]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use routesync_core::diff::{diff_routes_with, render_human_summary, DuplicatePolicy};

use crate::commands::{print_json, read_routes, OutputFormat};
use crate::config::Settings;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Baseline route set (JSON array)
    #[arg(long)]
    pub old: PathBuf,

    /// Desired route set (JSON array)
    #[arg(long)]
    pub new: PathBuf,

    /// Fail when a set lists the same route twice
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Execute diff command
pub fn execute(args: DiffArgs, settings: &Settings) -> Result<ExitCode> {
    let old = read_routes(&args.old)?;
    let new = read_routes(&args.new)?;
    let policy = if settings.strict_duplicates {
        DuplicatePolicy::Reject
    } else {
        DuplicatePolicy::LastWins
    };

    let diff = diff_routes_with(&old, &new, policy)?;
    match args.output {
        OutputFormat::Text => print!("{}", render_human_summary(&diff)),
        OutputFormat::Json => print_json(&diff)?,
    }
    Ok(ExitCode::SUCCESS)
}
