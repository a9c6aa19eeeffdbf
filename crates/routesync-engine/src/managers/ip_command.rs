//! iproute2 backend.
//!
//! Lists routes with `ip -j route show table all` (once per address family),
//! installs them with `ip route replace` and removes them with
//! `ip route del`. Every invocation is killed if `cancel` fires first.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use routesync_core::errors::{ManagerError, ValidationError};
use routesync_core::model::Classification;
use routesync_core::{Route, RouteManager};
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_IP_PATH: &str = "ip";

const TABLE_DEFAULT: i64 = 253;
const TABLE_MAIN: i64 = 254;
const TABLE_LOCAL: i64 = 255;

/// `RouteManager` that shells out to the `ip` binary
#[derive(Debug, Clone)]
pub struct IpCommandManager {
    ip_path: PathBuf,
}

impl Default for IpCommandManager {
    fn default() -> Self {
        Self::new(DEFAULT_IP_PATH)
    }
}

impl IpCommandManager {
    pub fn new(ip_path: impl Into<PathBuf>) -> Self {
        Self {
            ip_path: ip_path.into(),
        }
    }

    async fn run(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<String, ManagerError> {
        let program = self.ip_path.display().to_string();
        let mut command = Command::new(&self.ip_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %program, args = ?args, "Running ip");

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ManagerError::Cancelled),
            output = command.output() => output.map_err(|e| ManagerError::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            })?,
        };

        if !output.status.success() {
            return Err(ManagerError::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn list_family(
        &self,
        family: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Route>, ManagerError> {
        let mut args = vec!["-j".to_string()];
        if let Some(flag) = family {
            args.push(flag.to_string());
        }
        args.extend(["route", "show", "table", "all"].map(String::from));
        let stdout = self.run(&args, cancel).await?;
        parse_route_listing(&stdout)
    }
}

#[async_trait]
impl RouteManager for IpCommandManager {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Route>, ManagerError> {
        let mut routes = self.list_family(None, cancel).await?;
        routes.extend(self.list_family(Some("-6"), cancel).await?);
        Ok(routes)
    }

    async fn add(&self, route: &Route, cancel: &CancellationToken) -> Result<(), ManagerError> {
        let args = route_command("replace", route)?;
        self.run(&args, cancel).await.map(|_| ())
    }

    async fn delete(&self, route: &Route, cancel: &CancellationToken) -> Result<(), ManagerError> {
        let args = route_command("del", route)?;
        match self.run(&args, cancel).await {
            Ok(_) => Ok(()),
            Err(ManagerError::CommandFailed { stderr, .. }) if is_not_found(&stderr) => {
                tracing::debug!(route = ?route, "Route already absent");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// `ip` arguments for `ip [-6] route <verb> ...`.
///
/// # Errors
///
/// Returns `ManagerError::Validation` when the route does not normalize or
/// carries a scope/type/protocol `ip` would not accept.
pub fn route_command(verb: &str, route: &Route) -> Result<Vec<String>, ManagerError> {
    let route = route.normalize()?;
    let class = Classification::of(&route)?;

    let mut args = Vec::new();
    if is_ipv6(&route) {
        args.push("-6".to_string());
    }
    args.push("route".to_string());
    args.push(verb.to_string());

    if !class.route_type.is_unicast() {
        args.push(class.route_type.to_string());
    }
    args.push(route.destination.clone());

    let mut push = |flag: &str, value: String| {
        args.push(flag.to_string());
        args.push(value);
    };
    if !route.gateway.is_empty() {
        push("via", route.gateway.clone());
    }
    if !route.device.is_empty() {
        push("dev", route.device.clone());
    }
    if route.table != 0 {
        push("table", route.table.to_string());
    }
    if route.metric != 0 {
        push("metric", route.metric.to_string());
    }
    if !route.source.is_empty() {
        push("src", route.source.clone());
    }
    if let Some(scope) = class.scope {
        push("scope", scope.to_string());
    }
    if let Some(protocol) = class.protocol {
        push("proto", protocol.to_string());
    }
    Ok(args)
}

fn is_ipv6(route: &Route) -> bool {
    if route.is_default() {
        route.gateway.contains(':') || route.source.contains(':')
    } else {
        route.destination.contains(':')
    }
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("no such process") || lower.contains("not found")
}

/// One element of `ip -j route show` output
#[derive(Debug, Deserialize)]
struct IpRouteEntry {
    #[serde(default)]
    dst: String,
    gateway: Option<String>,
    dev: Option<String>,
    table: Option<serde_json::Value>,
    metric: Option<u64>,
    prefsrc: Option<String>,
    scope: Option<String>,
    #[serde(rename = "type")]
    route_type: Option<String>,
    protocol: Option<String>,
}

/// Parse `ip -j route show` output into normalized routes.
///
/// Entries that cannot be expressed as a `Route` (unknown table names,
/// malformed prefixes) are skipped.
///
/// # Errors
///
/// Returns `ManagerError::Parse` when the output is not a JSON array.
pub fn parse_route_listing(stdout: &str) -> Result<Vec<Route>, ManagerError> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<IpRouteEntry> =
        serde_json::from_str(stdout).map_err(|e| ManagerError::Parse {
            reason: e.to_string(),
        })?;

    let mut routes = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry_to_route(&entry) {
            Ok(route) => routes.push(route),
            Err(err) => {
                tracing::debug!(
                    dst = %entry.dst,
                    error = %err,
                    "Skipping unrecognized route entry"
                );
            }
        }
    }
    Ok(routes)
}

fn entry_to_route(entry: &IpRouteEntry) -> Result<Route, ValidationError> {
    let mut dst = entry.dst.trim().to_string();
    if !dst.is_empty() && dst != "default" && !dst.contains('/') {
        // host routes are printed without a prefix length
        dst.push_str(if dst.contains(':') { "/128" } else { "/32" });
    }

    let table = match &entry.table {
        None => 0,
        Some(value) => match table_id(value)? {
            TABLE_MAIN => 0,
            id => id,
        },
    };

    let scope = match entry.scope.as_deref() {
        Some("global") | Some("universe") | None => String::new(),
        Some(other) => other.to_string(),
    };
    let route_type = match entry.route_type.as_deref() {
        Some("unicast") | None => String::new(),
        Some(other) => other.to_string(),
    };

    let route = Route {
        destination: dst,
        gateway: entry.gateway.clone().unwrap_or_default(),
        device: entry.dev.clone().unwrap_or_default(),
        table,
        metric: entry.metric.map_or(0, |m| i64::try_from(m).unwrap_or(i64::MAX)),
        source: entry.prefsrc.clone().unwrap_or_default(),
        scope,
        route_type,
        protocol: entry.protocol.clone().unwrap_or_default(),
    };
    Ok(route.normalize()?.into_route())
}

fn table_id(value: &serde_json::Value) -> Result<i64, ValidationError> {
    let unsupported = || ValidationError::UnsupportedValue {
        field: "table",
        value: value.to_string(),
    };
    match value {
        serde_json::Value::Number(n) => n.as_i64().ok_or_else(unsupported),
        serde_json::Value::String(name) => match name.as_str() {
            "main" => Ok(TABLE_MAIN),
            "local" => Ok(TABLE_LOCAL),
            "default" => Ok(TABLE_DEFAULT),
            other => other.parse::<i64>().map_err(|_| unsupported()),
        },
        _ => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_command_full_route() {
        let route = Route::new("10.0.0.1/24")
            .with_gateway("192.168.1.1")
            .with_device("eth0")
            .with_table(100)
            .with_metric(20)
            .with_source("192.168.1.5")
            .with_scope("LINK")
            .with_protocol("static");
        let args = route_command("replace", &route).unwrap();
        assert_eq!(
            args.join(" "),
            "route replace 10.0.0.0/24 via 192.168.1.1 dev eth0 table 100 metric 20 src 192.168.1.5 scope link proto static"
        );
    }

    #[test]
    fn test_route_command_type_and_family() {
        let route = Route::new("2001:db8::/32").with_type("blackhole");
        let args = route_command("del", &route).unwrap();
        assert_eq!(args.join(" "), "-6 route del blackhole 2001:db8::/32");

        let route = Route::new("default").with_gateway("fe80::1");
        let args = route_command("replace", &route).unwrap();
        assert_eq!(args.join(" "), "-6 route replace default via fe80::1");
    }

    #[test]
    fn test_route_command_rejects_unknown_vocabulary() {
        let route = Route::new("default").with_scope("galaxy");
        let err = route_command("replace", &route).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Validation(ValidationError::UnsupportedValue { field: "scope", .. })
        ));
    }

    #[test]
    fn test_parse_route_listing() {
        let stdout = r#"[
            {"dst":"default","gateway":"10.0.0.1","dev":"eth0","protocol":"dhcp","prefsrc":"10.0.0.5","metric":100,"flags":[]},
            {"dst":"10.0.0.0/24","dev":"eth0","protocol":"kernel","scope":"link","prefsrc":"10.0.0.5","flags":[]},
            {"type":"local","dst":"10.0.0.5","table":"local","dev":"eth0","protocol":"kernel","scope":"host","prefsrc":"10.0.0.5","flags":[]},
            {"dst":"192.168.7.0/24","gateway":"10.0.0.9","dev":"eth0","table":"100","flags":[]},
            {"dst":"172.16.0.0/12","dev":"wg0","table":"custom","flags":[]}
        ]"#;
        let routes = parse_route_listing(stdout).unwrap();
        assert_eq!(routes.len(), 4);

        assert_eq!(routes[0].destination, "default");
        assert_eq!(routes[0].metric, 100);
        assert_eq!(routes[0].source, "10.0.0.5");
        assert_eq!(routes[0].table, 0);

        assert_eq!(routes[1].scope, "link");
        assert_eq!(routes[2].destination, "10.0.0.5/32");
        assert_eq!(routes[2].table, TABLE_LOCAL);
        assert_eq!(routes[2].route_type, "local");
        assert_eq!(routes[3].table, 100);
    }

    #[test]
    fn test_parse_main_table_reported_as_unspecified() {
        let routes =
            parse_route_listing(r#"[{"dst":"10.1.0.0/16","dev":"eth1","table":"main"}]"#).unwrap();
        assert_eq!(routes[0].table, 0);
        let declared = Route::new("10.1.0.0/16").with_device("eth1");
        assert_eq!(routes[0].key().unwrap(), declared.key().unwrap());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_route_listing("Error: garbage"),
            Err(ManagerError::Parse { .. })
        ));
        assert!(parse_route_listing("").unwrap().is_empty());
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found("RTNETLINK answers: No such process"));
        assert!(!is_not_found("RTNETLINK answers: File exists"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let manager = IpCommandManager::new("/nonexistent/routesync-test-ip");
        let err = manager
            .add(&Route::new("10.0.0.0/8"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ManagerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_token_issues_nothing() {
        let manager = IpCommandManager::new("/nonexistent/routesync-test-ip");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = manager.list(&cancel).await.unwrap_err();
        assert_eq!(err, ManagerError::Cancelled);
    }
}
