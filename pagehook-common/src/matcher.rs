//! Positional argument matching
//!
//! Gates conditional callables on the runtime values they would receive.

use serde_json::Value;

/// Check `values` against positional `checks`.
///
/// - an array check passes when the value strictly equals one of its elements
/// - a null check imposes no constraint when `skip_null` is true, otherwise
///   the value must itself be null
/// - any other check must strictly equal the value
/// - values beyond the last check are unconstrained
/// - a check beyond the last value is compared against null
///
/// Equality is `serde_json::Value` equality: `1` never matches `"1"` and an
/// integer never matches a float.
///
/// # Example
///
/// ```rust
/// use pagehook_common::args_match;
/// use serde_json::json;
///
/// let values = [json!("options-page"), json!(3)];
/// assert!(args_match(&values, &[json!(["options-page", "post"])], true));
/// assert!(args_match(&values, &[json!(null), json!(3)], true));
/// assert!(!args_match(&values, &[json!(null), json!("3")], true));
/// ```
pub fn args_match(values: &[Value], checks: &[Value], skip_null: bool) -> bool {
    checks.iter().enumerate().all(|(index, check)| {
        let value = values.get(index).unwrap_or(&Value::Null);
        check_passes(value, check, skip_null)
    })
}

fn check_passes(value: &Value, check: &Value, skip_null: bool) -> bool {
    match check {
        Value::Null => skip_null || value.is_null(),
        Value::Array(allowed) => allowed.iter().any(|candidate| candidate == value),
        other => other == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_checks_always_match() {
        assert!(args_match(&[json!(1), json!("a")], &[], true));
        assert!(args_match(&[], &[], false));
    }

    #[test]
    fn test_set_membership() {
        let checks = [json!(["a", "b"])];
        assert!(args_match(&[json!("b")], &checks, true));
        assert!(!args_match(&[json!("c")], &checks, true));
    }

    #[test]
    fn test_strict_comparison_no_coercion() {
        assert!(!args_match(&[json!(1)], &[json!("1")], true));
        assert!(!args_match(&[json!(1)], &[json!(1.0)], true));
        assert!(!args_match(&[json!(0)], &[json!(false)], true));
        assert!(args_match(&[json!(true)], &[json!(true)], true));
    }

    #[test]
    fn test_null_check_skip_semantics() {
        assert!(args_match(&[json!("anything")], &[json!(null)], true));
        assert!(!args_match(&[json!("anything")], &[json!(null)], false));
        assert!(args_match(&[json!(null)], &[json!(null)], false));
    }

    #[test]
    fn test_missing_value_compared_as_null() {
        assert!(args_match(&[], &[json!(null)], false));
        assert!(!args_match(&[], &[json!("x")], true));
    }

    #[test]
    fn test_first_failure_fails_all() {
        let checks = [json!("x"), json!(null), json!(["y"])];
        assert!(args_match(&[json!("x"), json!(5), json!("y")], &checks, true));
        assert!(!args_match(&[json!("z"), json!(5), json!("y")], &checks, true));
    }
}
