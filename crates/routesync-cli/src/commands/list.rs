//! List command
//!
//! Usage: routesync list [--output text|json]

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use routesync_core::{NormalizedRoute, RouteManager};
use routesync_engine::IpCommandManager;

use crate::commands::{cancel_on_ctrl_c, print_json, OutputFormat};
use crate::config::Settings;

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Execute list command
pub async fn execute(args: ListArgs, settings: &Settings) -> Result<ExitCode> {
    let manager = IpCommandManager::new(&settings.ip_path);
    let routes = manager.list(&cancel_on_ctrl_c()).await?;

    match args.output {
        OutputFormat::Json => print_json(&routes)?,
        OutputFormat::Text => {
            for route in routes {
                match NormalizedRoute::try_from(route) {
                    Ok(route) => println!("{}", route),
                    Err(e) => tracing::debug!(error = %e, "Skipping unprintable route"),
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
