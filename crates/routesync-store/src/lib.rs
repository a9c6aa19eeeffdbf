//! routesync store - on-disk baseline persistence
//!
//! Provides:
//! - `FileStore`: the route baseline as a JSON document
//! - Atomic temp-then-rename writes so a crash never leaves a partial file

pub mod atomic;
pub mod errors;
pub mod file_store;

// Re-export key types
pub use file_store::FileStore;
