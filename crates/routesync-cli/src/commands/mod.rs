//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use routesync_core::Route;
use tokio_util::sync::CancellationToken;

pub mod baseline;
pub mod diff;
pub mod list;
pub mod reconcile;

pub const EXIT_ERROR: u8 = 1;
pub const EXIT_PARTIAL: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Read a JSON array of routes from `path`
pub fn read_routes(path: &Path) -> Result<Vec<Route>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading routes from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing routes in {}", path.display()))
}

/// A token cancelled on Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling remaining operations");
            trigger.cancel();
        }
    });
    token
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
