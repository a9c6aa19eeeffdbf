//! routesync CLI
//!
//! Command-line interface for route reconciliation

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod config;

use config::{CliConfig, Overrides, Settings};

#[derive(Debug, Parser)]
#[command(name = "routesync")]
#[command(about = "routesync - converge the host routing table onto a declared route set", long_about = None)]
struct Cli {
    /// TOML config file (default: /etc/routesync/routesync.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Logging profile: development, production or test
    #[arg(long, global = true, env = "ROUTESYNC_LOG")]
    log_profile: Option<String>,

    /// Path to the `ip` binary
    #[arg(long, global = true, env = "ROUTESYNC_IP")]
    ip: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply a desired full route set and record the result as the baseline
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Show the plan between two route set files
    Diff(commands::diff::DiffArgs),
    /// List routes currently installed on the host
    List(commands::list::ListArgs),
    /// Inspect or reset the stored baseline
    Baseline(commands::baseline::BaselineArgs),
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let (state_path, strict_duplicates) = match &self.command {
            Commands::Reconcile(args) => (args.state.clone(), args.strict),
            Commands::Diff(args) => (None, args.strict),
            Commands::Baseline(args) => (args.state().cloned(), false),
            Commands::List(_) => (None, false),
        };
        Overrides {
            state_path,
            ip_path: self.ip.clone(),
            log_profile: self.log_profile.clone(),
            strict_duplicates,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(commands::EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let file = CliConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(file, cli.overrides())?;
    routesync_core::logging_facility::init(settings.log_profile);

    match cli.command {
        Commands::Reconcile(args) => commands::reconcile::execute(args, &settings).await,
        Commands::Diff(args) => commands::diff::execute(args, &settings),
        Commands::List(args) => commands::list::execute(args, &settings).await,
        Commands::Baseline(args) => commands::baseline::execute(args, &settings),
    }
}
