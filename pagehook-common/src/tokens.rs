//! Token substitution for declarative data
//!
//! Hook declarations and other static structures carry placeholder tokens
//! such as `{HOOK}` or `{OPT}` that are only known at runtime. This module
//! walks a [`Value`] and swaps the tokens out.
//!
//! Supports:
//! - textual replacement when the replacement is a string or a number
//! - whole-value replacement when the replacement is anything else (bool,
//!   null, array, object) and the string contains the token
//! - optional substitution inside object keys (textual replacements only)

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::trace;

/// Ordered token table: token string to replacement value.
///
/// Tokens are applied in insertion order.
pub type Tokens = IndexMap<String, Value>;

/// Substitute `tokens` throughout `data`.
///
/// Returns a new value; `data` is never modified. Empty data or an empty
/// token table returns a copy of `data`.
///
/// # Example
///
/// ```rust
/// use pagehook_common::{substitute_tokens, Tokens};
/// use serde_json::json;
///
/// let mut tokens = Tokens::new();
/// tokens.insert("{HOOK}".to_string(), json!("toplevel_page_opts"));
/// tokens.insert("{ENABLED}".to_string(), json!(false));
///
/// let data = json!({"trigger": "load-{HOOK}", "enabled": "{ENABLED}"});
/// let out = substitute_tokens(&data, &tokens, false);
///
/// assert_eq!(out["trigger"], "load-toplevel_page_opts");
/// assert_eq!(out["enabled"], false);
/// ```
pub fn substitute_tokens(data: &Value, tokens: &Tokens, substitute_in_keys: bool) -> Value {
    if tokens.is_empty() || crate::value::is_empty_value(data) {
        return data.clone();
    }
    substitute_value(data, tokens, substitute_in_keys)
}

fn substitute_value(data: &Value, tokens: &Tokens, in_keys: bool) -> Value {
    match data {
        Value::String(s) => substitute_string(s, tokens),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| substitute_value(item, tokens, in_keys))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                let key = if in_keys {
                    substitute_key(key, tokens)
                } else {
                    key.clone()
                };
                out.insert(key, substitute_value(value, tokens, in_keys));
            }
            Value::Object(out)
        }
        // Numbers, booleans, null carry no tokens
        other => other.clone(),
    }
}

fn substitute_string(s: &str, tokens: &Tokens) -> Value {
    let mut current = s.to_string();

    for (token, replacement) in tokens {
        if token.is_empty() || !current.contains(token.as_str()) {
            continue;
        }
        match textual(replacement) {
            Some(text) => {
                trace!("Token substitution: {} -> {}", token, text);
                current = current.replace(token.as_str(), &text);
            }
            None => {
                trace!("Token {} replaces the whole value", token);
                return replacement.clone();
            }
        }
    }

    Value::String(current)
}

fn substitute_key(key: &str, tokens: &Tokens) -> String {
    let mut current = key.to_string();
    for (token, replacement) in tokens {
        if token.is_empty() || !current.contains(token.as_str()) {
            continue;
        }
        if let Some(text) = textual(replacement) {
            current = current.replace(token.as_str(), &text);
        }
    }
    current
}

fn textual(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(pairs: &[(&str, Value)]) -> Tokens {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_no_match_returns_equal_structure() {
        let data = json!({"a": "plain", "b": [1, "two", {"c": "three"}], "d": null});
        let t = tokens(&[("{X}", json!("y"))]);
        assert_eq!(substitute_tokens(&data, &t, true), data);
    }

    #[test]
    fn test_textual_replacement_all_occurrences() {
        let t = tokens(&[("{P}", json!("opts"))]);
        let out = substitute_tokens(&json!("{P}-{P}"), &t, false);
        assert_eq!(out, json!("opts-opts"));
    }

    #[test]
    fn test_number_replacement_is_textual() {
        let t = tokens(&[("{N}", json!(11))]);
        let out = substitute_tokens(&json!({"priority": "{N}"}), &t, false);
        assert_eq!(out["priority"], json!("11"));
    }

    #[test]
    fn test_non_scalar_replaces_whole_value() {
        let t = tokens(&[("{LIST}", json!(["a", "b"]))]);
        let out = substitute_tokens(&json!({"v": "prefix {LIST}"}), &t, false);
        assert_eq!(out["v"], json!(["a", "b"]));
    }

    #[test]
    fn test_bool_replaces_whole_value() {
        let t = tokens(&[("{ON}", json!(true))]);
        let out = substitute_tokens(&json!(["{ON}"]), &t, false);
        assert_eq!(out, json!([true]));
    }

    #[test]
    fn test_keys_only_when_requested() {
        let t = tokens(&[("{K}", json!("key"))]);
        let data = json!({"{K}_a": "{K}"});
        assert_eq!(substitute_tokens(&data, &t, false), json!({"{K}_a": "key"}));
        assert_eq!(substitute_tokens(&data, &t, true), json!({"key_a": "key"}));
    }

    #[test]
    fn test_keys_ignore_non_textual_replacement() {
        let t = tokens(&[("{K}", json!({"x": 1}))]);
        let out = substitute_tokens(&json!({"{K}": 1}), &t, true);
        assert_eq!(out, json!({"{K}": 1}));
    }

    #[test]
    fn test_empty_inputs_unchanged() {
        let t = tokens(&[("{K}", json!("v"))]);
        assert_eq!(substitute_tokens(&json!([]), &t, false), json!([]));
        assert_eq!(
            substitute_tokens(&json!("{K}"), &Tokens::new(), false),
            json!("{K}")
        );
    }

    #[test]
    fn test_tokens_apply_in_order() {
        let t = tokens(&[("{A}", json!("{B}")), ("{B}", json!("done"))]);
        assert_eq!(substitute_tokens(&json!("{A}"), &t, false), json!("done"));
    }
}
