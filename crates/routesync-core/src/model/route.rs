//! Route descriptor, normalization and identity key.

use std::fmt;
use std::net::IpAddr;
use std::ops::Deref;

use ipnet::{IpNet, Ipv4Net};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Destination sentinel for the default route
pub const DEFAULT_DESTINATION: &str = "default";

/// A routing table entry in a mostly `ip route` compatible form.
///
/// - `destination` is required: `"default"` or a CIDR prefix
///   (`10.0.0.0/24`, `2001:db8::/64`).
/// - `gateway` and `source` are optional IP addresses.
/// - `table` and `metric` are optional; 0 means unspecified.
/// - `scope`, `route_type` and `protocol` are classification strings; see
///   [`crate::model::vocab`] for the recognized values.
///
/// Empty strings and zero integers mean "not set". The JSON field names
/// (`dst`, `gateway`, `device`, `table`, `metric`, `src`, `scope`, `type`,
/// `proto`) are part of the persisted baseline format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "dst", default)]
    pub destination: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gateway: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub table: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub metric: i64,
    #[serde(rename = "src", default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub route_type: String,
    #[serde(rename = "proto", default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Route {
    /// Create a route to `destination` with every other field unset
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }

    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_table(mut self, table: i64) -> Self {
        self.table = table;
        self
    }

    pub fn with_metric(mut self, metric: i64) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_type(mut self, route_type: impl Into<String>) -> Self {
        self.route_type = route_type.into();
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Canonicalize every field so that equal routes compare equal.
    ///
    /// Strings are trimmed; destination, scope, type and protocol are
    /// lower-cased; the destination prefix is reduced to its network address
    /// and addresses are rewritten in canonical form. Device names keep their
    /// case. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the destination is missing or not a
    /// CIDR prefix, if gateway or source is not an IP address, or if table or
    /// metric is negative.
    pub fn normalize(&self) -> Result<NormalizedRoute, ValidationError> {
        let destination = self.destination.trim().to_lowercase();
        if destination.is_empty() {
            return Err(ValidationError::MissingDestination);
        }
        let destination = if destination == DEFAULT_DESTINATION {
            destination
        } else {
            canonical_prefix(&destination)?
        };

        let gateway = canonical_addr(self.gateway.trim()).ok_or_else(|| {
            ValidationError::InvalidGateway {
                value: self.gateway.trim().to_string(),
            }
        })?;
        let source = canonical_addr(self.source.trim()).ok_or_else(|| {
            ValidationError::InvalidSource {
                value: self.source.trim().to_string(),
            }
        })?;

        if self.table < 0 {
            return Err(ValidationError::NegativeTable { value: self.table });
        }
        if self.metric < 0 {
            return Err(ValidationError::NegativeMetric { value: self.metric });
        }

        Ok(NormalizedRoute(Route {
            destination,
            gateway,
            device: self.device.trim().to_string(),
            table: self.table,
            metric: self.metric,
            source,
            scope: self.scope.trim().to_lowercase(),
            route_type: self.route_type.trim().to_lowercase(),
            protocol: self.protocol.trim().to_lowercase(),
        }))
    }

    /// Identity key of this route after normalization.
    ///
    /// # Errors
    ///
    /// Returns the `ValidationError` produced by [`Route::normalize`].
    pub fn key(&self) -> Result<RouteKey, ValidationError> {
        self.normalize().map(|n| n.key())
    }

    /// Whether this is the default route (before normalization)
    pub fn is_default(&self) -> bool {
        self.destination.trim().eq_ignore_ascii_case(DEFAULT_DESTINATION)
    }
}

fn canonical_prefix(value: &str) -> Result<String, ValidationError> {
    let net: IpNet = value
        .parse()
        .map_err(|e: ipnet::AddrParseError| ValidationError::InvalidDestination {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    let net = net.trunc();
    Ok(match net {
        IpNet::V6(v6) if v6.prefix_len() >= IPV4_MAPPED_PREFIX_LEN => {
            match v6.network().to_ipv4_mapped() {
                Some(v4) => Ipv4Net::new(v4, v6.prefix_len() - IPV4_MAPPED_PREFIX_LEN)
                    .map(|v4| v4.to_string())
                    .unwrap_or_else(|_| net.to_string()),
                None => net.to_string(),
            }
        }
        _ => net.to_string(),
    })
}

/// `::ffff:0:0/96`; longer prefixes inside it are IPv4 prefixes in disguise
const IPV4_MAPPED_PREFIX_LEN: u8 = 96;

/// `Some("")` for an empty input, `None` when the input is not an address.
fn canonical_addr(value: &str) -> Option<String> {
    if value.is_empty() {
        return Some(String::new());
    }
    value
        .parse::<IpAddr>()
        .ok()
        .map(|ip| ip.to_canonical().to_string())
}

/// A route whose fields are known to be canonical.
///
/// Only obtainable through [`Route::normalize`] (or deserialization, which
/// normalizes), so its identity key can be computed without failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Route", into = "Route")]
pub struct NormalizedRoute(Route);

impl NormalizedRoute {
    /// Deterministic identity string built from all nine normalized fields.
    ///
    /// Two routes are the same set element exactly when their keys are equal.
    pub fn key(&self) -> RouteKey {
        let r = &self.0;
        RouteKey(format!(
            "dst={}|gw={}|dev={}|table={}|metric={}|src={}|scope={}|type={}|proto={}",
            r.destination,
            r.gateway,
            r.device,
            r.table,
            r.metric,
            r.source,
            r.scope,
            r.route_type,
            r.protocol,
        ))
    }

    pub fn as_route(&self) -> &Route {
        &self.0
    }

    pub fn into_route(self) -> Route {
        self.0
    }
}

impl Deref for NormalizedRoute {
    type Target = Route;

    fn deref(&self) -> &Route {
        &self.0
    }
}

impl TryFrom<Route> for NormalizedRoute {
    type Error = ValidationError;

    fn try_from(route: Route) -> Result<Self, Self::Error> {
        route.normalize()
    }
}

impl From<NormalizedRoute> for Route {
    fn from(route: NormalizedRoute) -> Self {
        route.0
    }
}

impl fmt::Display for NormalizedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.0;
        f.write_str(&r.destination)?;
        if !r.gateway.is_empty() {
            write!(f, " via {}", r.gateway)?;
        }
        if !r.device.is_empty() {
            write!(f, " dev {}", r.device)?;
        }
        if r.table != 0 {
            write!(f, " table {}", r.table)?;
        }
        if r.metric != 0 {
            write!(f, " metric {}", r.metric)?;
        }
        if !r.source.is_empty() {
            write!(f, " src {}", r.source)?;
        }
        if !r.scope.is_empty() {
            write!(f, " scope {}", r.scope)?;
        }
        if !r.route_type.is_empty() {
            write!(f, " type {}", r.route_type)?;
        }
        if !r.protocol.is_empty() {
            write!(f, " proto {}", r.protocol)?;
        }
        Ok(())
    }
}

/// Identity key of a normalized route
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(String);

impl RouteKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RouteKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
