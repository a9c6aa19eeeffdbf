//! `RouteManager` backends.

pub mod dry_run;
pub mod ip_command;

pub use dry_run::DryRunManager;
pub use ip_command::IpCommandManager;
