//! Correlation types for tracking a reconciliation run
//!
//! Every reconcile invocation gets a fresh [`ReconcileId`] so that the
//! phase transitions and per-route operations it logs can be grouped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReconcileId(String);

impl ReconcileId {
    /// Generate a new ReconcileId using UUIDv7 (time ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for ReconcileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReconcileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_id_generation() {
        let id1 = ReconcileId::new();
        let id2 = ReconcileId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_reconcile_id_display() {
        let id = ReconcileId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_serialization() {
        let id = ReconcileId::from_string("run-1".to_string());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"run-1\"");
        let back: ReconcileId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
