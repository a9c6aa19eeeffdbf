//! Content digest of a route set.

use sha2::{Digest, Sha256};

use crate::model::{NormalizedRoute, RouteKey};

/// SHA-256 (hex) over the sorted identity keys, one per line.
///
/// Order-independent: two sets with the same members have the same digest.
/// The empty set hashes the empty string.
pub fn route_set_digest(routes: &[NormalizedRoute]) -> String {
    let mut keys: Vec<RouteKey> = routes.iter().map(NormalizedRoute::key).collect();
    keys.sort();
    keys.dedup();

    let mut hasher = Sha256::new();
    for key in &keys {
        hasher.update(key.as_str().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Route;

    fn norm(dst: &str) -> NormalizedRoute {
        Route::new(dst).normalize().unwrap()
    }

    #[test]
    fn test_digest_is_order_independent() {
        let a = vec![norm("10.0.0.0/8"), norm("default")];
        let b = vec![norm("default"), norm("10.0.0.0/8")];
        assert_eq!(route_set_digest(&a), route_set_digest(&b));
        assert_eq!(route_set_digest(&a).len(), 64);
    }

    #[test]
    fn test_digest_empty_set() {
        assert_eq!(
            route_set_digest(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_changes_with_members() {
        let a = vec![norm("default")];
        let b = vec![norm("default"), norm("10.0.0.0/8")];
        assert_ne!(route_set_digest(&a), route_set_digest(&b));
    }
}
