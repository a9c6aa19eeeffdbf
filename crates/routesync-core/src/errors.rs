use std::fmt;

use thiserror::Error;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, log filtering and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsErrorKind {
    /// A required collaborator (manager or store) was not bound
    Configuration,
    /// A route field is malformed
    Validation,
    /// A manager add/delete failed
    Apply,
    /// An apply operation was aborted by cancellation
    Cancelled,
    /// Loading or saving the baseline failed
    Persistence,

    // Adapters
    Io,
    Serialization,
    Unsupported,

    // Internal
    Internal,
}

impl RsErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            RsErrorKind::Configuration => "ERR_CONFIGURATION",
            RsErrorKind::Validation => "ERR_VALIDATION",
            RsErrorKind::Apply => "ERR_APPLY",
            RsErrorKind::Cancelled => "ERR_CANCELLED",
            RsErrorKind::Persistence => "ERR_PERSISTENCE",
            RsErrorKind::Io => "ERR_IO",
            RsErrorKind::Serialization => "ERR_SERIALIZATION",
            RsErrorKind::Unsupported => "ERR_UNSUPPORTED",
            RsErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Typed errors from every layer convert into `RsError` so that logging and
/// reporting see a single shape: a kind, an optional operation, the route key
/// the failure concerns, and a message.
#[derive(Debug, Clone)]
pub struct RsError {
    kind: RsErrorKind,
    op: Option<String>,
    route_key: Option<String>,
    message: String,
}

impl RsError {
    /// Create a new error with the specified kind
    pub fn new(kind: RsErrorKind) -> Self {
        Self {
            kind,
            op: None,
            route_key: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the identity key of the route involved
    pub fn with_route_key(mut self, key: impl Into<String>) -> Self {
        self.route_key = Some(key.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> RsErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn route_key(&self) -> Option<&str> {
        self.route_key.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.route_key {
            write!(f, " (route: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for RsError {}

// ========== End Error Facility ==========

/// Which input of a diff a route came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSetSide {
    Old,
    Desired,
}

impl fmt::Display for RouteSetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSetSide::Old => f.write_str("old_routes"),
            RouteSetSide::Desired => f.write_str("desired_routes"),
        }
    }
}

/// A route field is malformed, or a route set is inconsistent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route.dst is required")]
    MissingDestination,

    #[error("invalid route.dst {value:?}: {reason}")]
    InvalidDestination { value: String, reason: String },

    #[error("invalid route.gateway {value:?}")]
    InvalidGateway { value: String },

    #[error("invalid route.src {value:?}")]
    InvalidSource { value: String },

    #[error("route.table must be >= 0, got {value}")]
    NegativeTable { value: i64 },

    #[error("route.metric must be >= 0, got {value}")]
    NegativeMetric { value: i64 },

    /// A classification string outside the recognized vocabulary
    #[error("unsupported route.{field} {value:?}")]
    UnsupportedValue { field: &'static str, value: String },

    /// Wraps a failure with the position of the offending route
    #[error("{side}[{index}]: {source}")]
    AtIndex {
        side: RouteSetSide,
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    /// Two entries of one input set share an identity key (strict mode only)
    #[error("{side}[{first}] and {side}[{second}] are the same route: {key}")]
    DuplicateRoute {
        side: RouteSetSide,
        first: usize,
        second: usize,
        key: String,
    },
}

impl ValidationError {
    /// Attach the input side and index of the route that failed
    pub fn at(self, side: RouteSetSide, index: usize) -> Self {
        ValidationError::AtIndex {
            side,
            index,
            source: Box::new(self),
        }
    }
}

/// Failure reported by a `RouteManager`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// The operation was aborted because the cancellation token fired
    #[error("operation cancelled")]
    Cancelled,

    /// The route does not exist; deletions treat this as success
    #[error("route not found")]
    RouteNotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to run {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("failed to parse route listing: {reason}")]
    Parse { reason: String },

    #[error("unsupported: {reason}")]
    Unsupported { reason: String },

    #[error("{reason}")]
    Backend { reason: String },
}

impl ManagerError {
    pub fn backend(reason: impl Into<String>) -> Self {
        ManagerError::Backend {
            reason: reason.into(),
        }
    }
}

/// Failure reported by a `RouteStore`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store path is empty")]
    EmptyPath,

    #[error("{op} {path}: {reason}")]
    Io {
        op: &'static str,
        path: String,
        reason: String,
    },

    #[error("corrupt baseline {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("routes[{index}]: {source}")]
    InvalidRoute {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("{reason}")]
    Backend { reason: String },
}

impl StoreError {
    pub fn backend(reason: impl Into<String>) -> Self {
        StoreError::Backend {
            reason: reason.into(),
        }
    }
}

impl From<ValidationError> for RsError {
    fn from(err: ValidationError) -> Self {
        RsError::new(RsErrorKind::Validation)
            .with_op("normalize")
            .with_message(err.to_string())
    }
}

impl From<ManagerError> for RsError {
    fn from(err: ManagerError) -> Self {
        let kind = match &err {
            ManagerError::Cancelled => RsErrorKind::Cancelled,
            ManagerError::Validation(_) => RsErrorKind::Validation,
            ManagerError::Spawn { .. } => RsErrorKind::Io,
            ManagerError::Parse { .. } => RsErrorKind::Serialization,
            ManagerError::Unsupported { .. } => RsErrorKind::Unsupported,
            ManagerError::RouteNotFound
            | ManagerError::CommandFailed { .. }
            | ManagerError::Backend { .. } => RsErrorKind::Apply,
        };
        RsError::new(kind).with_message(err.to_string())
    }
}

impl From<StoreError> for RsError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::Io { .. } => RsErrorKind::Io,
            StoreError::Corrupt { .. } => RsErrorKind::Serialization,
            StoreError::InvalidRoute { .. } => RsErrorKind::Validation,
            StoreError::EmptyPath | StoreError::Backend { .. } => RsErrorKind::Persistence,
        };
        RsError::new(kind).with_message(err.to_string())
    }
}
