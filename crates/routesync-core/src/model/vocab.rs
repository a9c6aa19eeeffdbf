//! Recognized vocabularies for the route classification strings.
//!
//! Normalization only lower-cases `scope`, `type` and `proto`; these enums
//! are for adapters that must hand a concrete value to the OS.

use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::model::route::Route;

/// Route scope (`ip route ... scope <scope>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Site,
    Link,
    Host,
    Nowhere,
}

impl FromStr for Scope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" | "universe" => Ok(Scope::Global),
            "site" => Ok(Scope::Site),
            "link" => Ok(Scope::Link),
            "host" => Ok(Scope::Host),
            "nowhere" => Ok(Scope::Nowhere),
            _ => Err(unsupported("scope", s)),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Global => "global",
            Scope::Site => "site",
            Scope::Link => "link",
            Scope::Host => "host",
            Scope::Nowhere => "nowhere",
        })
    }
}

/// Route type; unicast when unspecified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteType {
    #[default]
    Unicast,
    Blackhole,
    Unreachable,
    Prohibit,
}

impl FromStr for RouteType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unicast" => Ok(RouteType::Unicast),
            "blackhole" => Ok(RouteType::Blackhole),
            "unreachable" => Ok(RouteType::Unreachable),
            "prohibit" => Ok(RouteType::Prohibit),
            _ => Err(unsupported("type", s)),
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteType::Unicast => "unicast",
            RouteType::Blackhole => "blackhole",
            RouteType::Unreachable => "unreachable",
            RouteType::Prohibit => "prohibit",
        })
    }
}

impl RouteType {
    /// Non-unicast types are spelled out before the prefix in `ip route`
    pub fn is_unicast(&self) -> bool {
        matches!(self, RouteType::Unicast)
    }
}

/// Origin of a route (`proto`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Kernel,
    Boot,
    Static,
    Dhcp,
    /// A raw rtnetlink protocol number
    Code(u8),
}

impl Protocol {
    /// Numeric rtnetlink protocol id
    pub fn code(&self) -> u8 {
        match self {
            Protocol::Kernel => 2,
            Protocol::Boot => 3,
            Protocol::Static => 4,
            Protocol::Dhcp => 16,
            Protocol::Code(c) => *c,
        }
    }

    /// Name for known ids, the number otherwise
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => Protocol::Kernel,
            3 => Protocol::Boot,
            4 => Protocol::Static,
            16 => Protocol::Dhcp,
            other => Protocol::Code(other),
        }
    }
}

impl FromStr for Protocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        if let Ok(code) = value.parse::<u8>() {
            return Ok(Protocol::from_code(code));
        }
        match value.as_str() {
            "kernel" => Ok(Protocol::Kernel),
            "boot" => Ok(Protocol::Boot),
            "static" => Ok(Protocol::Static),
            "dhcp" => Ok(Protocol::Dhcp),
            _ => Err(unsupported("proto", s)),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Kernel => f.write_str("kernel"),
            Protocol::Boot => f.write_str("boot"),
            Protocol::Static => f.write_str("static"),
            Protocol::Dhcp => f.write_str("dhcp"),
            Protocol::Code(c) => write!(f, "{}", c),
        }
    }
}

fn unsupported(field: &'static str, value: &str) -> ValidationError {
    ValidationError::UnsupportedValue {
        field,
        value: value.trim().to_string(),
    }
}

/// The typed classification of a route; unset strings map to `None`
/// (type defaults to unicast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub scope: Option<Scope>,
    pub route_type: RouteType,
    pub protocol: Option<Protocol>,
}

impl Classification {
    /// Parse the classification strings of `route` against the vocabularies.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnsupportedValue` for any value outside the
    /// recognized sets.
    pub fn of(route: &Route) -> Result<Self, ValidationError> {
        let scope = non_empty(&route.scope)
            .map(str::parse::<Scope>)
            .transpose()?;
        let route_type = non_empty(&route.route_type)
            .map(str::parse::<RouteType>)
            .transpose()?
            .unwrap_or_default();
        let protocol = non_empty(&route.protocol)
            .map(str::parse::<Protocol>)
            .transpose()?;
        Ok(Self {
            scope,
            route_type,
            protocol,
        })
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
