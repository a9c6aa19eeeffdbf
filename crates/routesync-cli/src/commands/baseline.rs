//! Baseline commands
//!
//! Usage: routesync baseline show|clear [--state <FILE>]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Subcommand};
use routesync_core::diff::route_set_digest;
use routesync_core::{NormalizedRoute, RouteStore};
use routesync_store::FileStore;

use crate::commands::{print_json, OutputFormat};
use crate::config::Settings;

#[derive(Debug, Args)]
pub struct BaselineArgs {
    #[command(subcommand)]
    pub command: BaselineCommand,
}

impl BaselineArgs {
    pub fn state(&self) -> Option<&PathBuf> {
        match &self.command {
            BaselineCommand::Show(args) => args.state.as_ref(),
            BaselineCommand::Clear(args) => args.state.as_ref(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum BaselineCommand {
    /// Print the stored baseline
    Show(ShowArgs),
    /// Delete the stored baseline so the next reconcile starts from empty
    Clear(ClearArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Baseline file
    #[arg(long, env = "ROUTESYNC_STATE")]
    pub state: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Baseline file
    #[arg(long, env = "ROUTESYNC_STATE")]
    pub state: Option<PathBuf>,
}

/// Execute baseline command
pub fn execute(args: BaselineArgs, settings: &Settings) -> Result<ExitCode> {
    let store = FileStore::new(&settings.state_path);
    match args.command {
        BaselineCommand::Show(show) => execute_show(&store, show.output),
        BaselineCommand::Clear(_) => {
            store.clear()?;
            println!("Cleared baseline {}", store.path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn execute_show(store: &FileStore, output: OutputFormat) -> Result<ExitCode> {
    let routes = store
        .load()?
        .into_iter()
        .map(NormalizedRoute::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    match output {
        OutputFormat::Json => print_json(&routes)?,
        OutputFormat::Text => {
            for route in &routes {
                println!("{}", route);
            }
            println!(
                "{} route(s) in {} (digest {})",
                routes.len(),
                store.path().display(),
                route_set_digest(&routes)
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
