//! Route set diff engine.
//!
//! Compares a baseline route set with a desired full route set and produces
//! the add/delete plan that converges one into the other.
//!
//! ## Entry point
//!
//! ```
//! use routesync_core::diff::{diff_routes, render_human_summary};
//! use routesync_core::Route;
//!
//! let old = vec![Route::new("default").with_gateway("10.0.0.1")];
//! let new = vec![Route::new("default").with_gateway("10.0.0.254")];
//! let diff = diff_routes(&old, &new).unwrap();
//! assert_eq!(diff.to_del.len(), 1);
//! assert_eq!(diff.to_add.len(), 1);
//! println!("{}", render_human_summary(&diff));
//! ```
//!
//! ## Guarantees
//!
//! - **Full-key identity**: routes are compared by their identity key only;
//!   any attribute change shows up as one deletion plus one addition.
//! - **Determinism**: every output sequence is sorted by key, independent of
//!   input order.
//! - **All or nothing**: a malformed route in either input fails the whole
//!   call; no partial plan is returned.

pub mod digest;
pub mod engine;
pub mod human_summary;
pub mod model;

pub use digest::route_set_digest;
pub use engine::{diff_routes, diff_routes_with};
pub use human_summary::render_human_summary;
pub use model::{DiffCounts, DiffResult, DuplicatePolicy};
