//! Human-readable summary renderer for route diffs.

use crate::diff::model::DiffResult;

/// Render a plain-text summary of a [`DiffResult`].
///
/// Deletions are listed before additions, mirroring the order in which a
/// reconcile applies them. Informational only.
pub fn render_human_summary(diff: &DiffResult) -> String {
    let mut out = String::new();

    for route in &diff.to_del {
        out.push_str(&format!("- del {}\n", route.key()));
    }
    for route in &diff.to_add {
        out.push_str(&format!("+ add {}\n", route.key()));
    }

    let counts = diff.counts();
    if diff.is_empty() {
        out.push_str(&format!("no changes ({} unchanged)\n", counts.unchanged));
    } else {
        out.push_str(&format!(
            "{} to delete, {} to add, {} unchanged\n",
            counts.to_del, counts.to_add, counts.unchanged
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_routes;
    use crate::model::Route;

    #[test]
    fn test_summary_lists_deletes_first() {
        let old = vec![Route::new("default").with_gateway("10.0.0.1")];
        let new = vec![Route::new("192.168.2.0/24").with_gateway("10.0.0.2")];
        let diff = diff_routes(&old, &new).unwrap();

        let summary = render_human_summary(&diff);
        let del = summary.find("- del dst=default").unwrap();
        let add = summary.find("+ add dst=192.168.2.0/24").unwrap();
        assert!(del < add);
        assert!(summary.ends_with("1 to delete, 1 to add, 0 unchanged\n"));
    }

    #[test]
    fn test_summary_no_changes() {
        let routes = vec![Route::new("default")];
        let diff = diff_routes(&routes, &routes).unwrap();
        assert_eq!(render_human_summary(&diff), "no changes (1 unchanged)\n");
    }
}
