//! Route set diff computation.
//!
//! The core entry point is [`diff_routes`], a symmetric difference of two
//! sets keyed by [`RouteKey`].

use std::collections::BTreeMap;

use crate::diff::model::{DiffResult, DuplicatePolicy};
use crate::errors::{RouteSetSide, ValidationError};
use crate::model::{NormalizedRoute, Route, RouteKey};

/// Compute the plan that turns `old_routes` into `desired_routes`.
///
/// Duplicate keys inside one input are resolved last-wins; see
/// [`diff_routes_with`] for strict handling.
///
/// # Errors
///
/// Returns `ValidationError::AtIndex` naming the input and position of the
/// first route that fails normalization.
pub fn diff_routes(
    old_routes: &[Route],
    desired_routes: &[Route],
) -> Result<DiffResult, ValidationError> {
    diff_routes_with(old_routes, desired_routes, DuplicatePolicy::LastWins)
}

/// Compute the plan with an explicit duplicate-key policy.
///
/// # Errors
///
/// - `AtIndex`: a route in either input failed normalization
/// - `DuplicateRoute`: two routes of one input share a key under
///   `DuplicatePolicy::Reject`
pub fn diff_routes_with(
    old_routes: &[Route],
    desired_routes: &[Route],
    policy: DuplicatePolicy,
) -> Result<DiffResult, ValidationError> {
    let old_map = index_routes(RouteSetSide::Old, old_routes, policy)?;
    let new_map = index_routes(RouteSetSide::Desired, desired_routes, policy)?;

    let mut result = DiffResult::default();

    // BTreeMap iteration is ordered by key, so every output comes out sorted.
    for (key, (_, route)) in &old_map {
        if new_map.contains_key(key) {
            result.unchanged.push(route.clone());
        } else {
            result.to_del.push(route.clone());
        }
    }
    for (key, (_, route)) in new_map {
        if !old_map.contains_key(&key) {
            result.to_add.push(route);
        }
    }

    Ok(result)
}

/// Normalize every route and map it by key, remembering its input index.
fn index_routes(
    side: RouteSetSide,
    routes: &[Route],
    policy: DuplicatePolicy,
) -> Result<BTreeMap<RouteKey, (usize, NormalizedRoute)>, ValidationError> {
    let mut map = BTreeMap::new();
    for (index, route) in routes.iter().enumerate() {
        let normalized = route.normalize().map_err(|e| e.at(side, index))?;
        let key = normalized.key();

        if policy == DuplicatePolicy::Reject {
            if let Some((first, _)) = map.get(&key) {
                return Err(ValidationError::DuplicateRoute {
                    side,
                    first: *first,
                    second: index,
                    key: key.into_string(),
                });
            }
        }
        map.insert(key, (index, normalized));
    }
    Ok(map)
}
