//! Route domain model.

pub mod route;
pub mod vocab;

pub use route::{NormalizedRoute, Route, RouteKey, DEFAULT_DESTINATION};
pub use vocab::{Classification, Protocol, RouteType, Scope};
