//! Strict recursive merge
//!
//! Lets a partial settings overlay (caller overrides, transform-hook output,
//! configuration defaults) update a base object without introducing keys the
//! base does not know and without replacing a value with one of another kind.

use serde_json::{Map, Value};
use tracing::trace;

use crate::value::ValueKind;

/// Merge `overlay` onto `base` under strict typing rules.
///
/// For each key in `overlay`:
/// - absent from `base` and `allow_new_keys` is false: dropped
/// - `base` holds null: the overlay value is taken, whatever its kind
/// - `base` holds a value of a different kind: the base value is kept
/// - both hold objects: merged recursively under the same rules
/// - otherwise the overlay value is taken
///
/// When either side is not an object the kind rule is applied to the whole
/// value. Neither input is modified.
///
/// # Example
///
/// ```rust
/// use pagehook_common::merge_strict;
/// use serde_json::json;
///
/// let base = json!({"title": "Options", "position": null, "columns": 1});
/// let overlay = json!({"title": 5, "position": 20, "extra": true});
///
/// let merged = merge_strict(&base, &overlay, false);
/// assert_eq!(merged, json!({"title": "Options", "position": 20, "columns": 1}));
/// ```
pub fn merge_strict(base: &Value, overlay: &Value, allow_new_keys: bool) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_maps(base_map, overlay_map, allow_new_keys))
        }
        _ => merge_scalar(base, overlay),
    }
}

fn merge_maps(
    base: &Map<String, Value>,
    overlay: &Map<String, Value>,
    allow_new_keys: bool,
) -> Map<String, Value> {
    let mut merged = base.clone();

    for (key, incoming) in overlay {
        match base.get(key) {
            None => {
                if allow_new_keys {
                    merged.insert(key.clone(), incoming.clone());
                } else {
                    trace!("merge_strict: dropping unknown key '{}'", key);
                }
            }
            Some(existing) => {
                let value = merge_strict(existing, incoming, allow_new_keys);
                merged.insert(key.clone(), value);
            }
        }
    }

    merged
}

fn merge_scalar(base: &Value, overlay: &Value) -> Value {
    if base.is_null() || ValueKind::of(base) == ValueKind::of(overlay) {
        overlay.clone()
    } else {
        trace!(
            "merge_strict: keeping {} base value over {} overlay",
            ValueKind::of(base),
            ValueKind::of(overlay)
        );
        base.clone()
    }
}
