//! CLI configuration file
//!
//! An optional TOML file supplies defaults for settings that flags and
//! environment variables did not set:
//!
//! ```toml
//! state_path = "/var/lib/routesync/routes.json"
//! ip_path = "/usr/sbin/ip"
//! log_profile = "production"
//! strict_duplicates = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use routesync_core::logging_facility::Profile;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/routesync/routesync.toml";
pub const DEFAULT_STATE_PATH: &str = "/var/lib/routesync/routes.json";
pub const DEFAULT_IP_PATH: &str = "ip";

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    pub state_path: Option<PathBuf>,
    pub ip_path: Option<PathBuf>,
    pub log_profile: Option<String>,
    pub strict_duplicates: Option<bool>,
}

impl CliConfig {
    /// Read `explicit` if given (it must exist), else the default path if it
    /// exists, else an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Effective settings after applying flag/env > file > default precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub state_path: PathBuf,
    pub ip_path: PathBuf,
    pub log_profile: Profile,
    pub strict_duplicates: bool,
}

/// Values that came from flags or the environment (clap merges the two)
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub state_path: Option<PathBuf>,
    pub ip_path: Option<PathBuf>,
    pub log_profile: Option<String>,
    pub strict_duplicates: bool,
}

impl Settings {
    pub fn resolve(file: CliConfig, overrides: Overrides) -> Result<Self> {
        let profile_name = overrides.log_profile.or(file.log_profile);
        let log_profile = match profile_name {
            Some(name) => name
                .parse::<Profile>()
                .map_err(|e| anyhow::anyhow!(e))
                .context("invalid log profile")?,
            None => Profile::Development,
        };

        Ok(Self {
            state_path: overrides
                .state_path
                .or(file.state_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH)),
            ip_path: overrides
                .ip_path
                .or(file.ip_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IP_PATH)),
            log_profile,
            strict_duplicates: overrides.strict_duplicates
                || file.strict_duplicates.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_set() {
        let s = Settings::resolve(CliConfig::default(), Overrides::default()).unwrap();
        assert_eq!(s.state_path, PathBuf::from(DEFAULT_STATE_PATH));
        assert_eq!(s.ip_path, PathBuf::from(DEFAULT_IP_PATH));
        assert_eq!(s.log_profile, Profile::Development);
        assert!(!s.strict_duplicates);
    }

    #[test]
    fn test_file_values_apply() {
        let file = CliConfig::parse(
            r#"
            state_path = "/tmp/state.json"
            log_profile = "prod"
            strict_duplicates = true
            "#,
        )
        .unwrap();
        let s = Settings::resolve(file, Overrides::default()).unwrap();
        assert_eq!(s.state_path, PathBuf::from("/tmp/state.json"));
        assert_eq!(s.log_profile, Profile::Production);
        assert!(s.strict_duplicates);
    }

    #[test]
    fn test_overrides_beat_file() {
        let file = CliConfig {
            state_path: Some(PathBuf::from("/from/file.json")),
            ip_path: Some(PathBuf::from("/sbin/ip")),
            ..CliConfig::default()
        };
        let overrides = Overrides {
            state_path: Some(PathBuf::from("/from/flag.json")),
            ..Overrides::default()
        };
        let s = Settings::resolve(file, overrides).unwrap();
        assert_eq!(s.state_path, PathBuf::from("/from/flag.json"));
        assert_eq!(s.ip_path, PathBuf::from("/sbin/ip"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(CliConfig::parse("state = \"x\"").is_err());
    }

    #[test]
    fn test_bad_profile_rejected() {
        let overrides = Overrides {
            log_profile: Some("verbose".to_string()),
            ..Overrides::default()
        };
        assert!(Settings::resolve(CliConfig::default(), overrides).is_err());
    }
}
