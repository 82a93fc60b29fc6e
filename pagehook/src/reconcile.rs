//! Shared-property reconciliation
//!
//! Derives one [`SharedConfig`] from every unit attached to a page:
//!
//! 1. per property, the last unit declaring a qualifying value wins, else
//!    the fallback (configured defaults merged over the static ones)
//! 2. `title` and `menu_title` pass through the `"pageTitle"` and
//!    `"menuTitle"` transforms
//! 3. caller overrides are merged strictly and checked against the
//!    per-property allow-lists
//! 4. the whole map passes through `"sharedProperties"`; a changed result is
//!    merged back under the same rules

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use pagehook_common::{merge_strict, Pretty, VoidCall};
use pagehook_hooks::EventBus;

use crate::settings::{normalize_columns, static_fallbacks, PropertyDef, SharedConfig, PROPERTIES};
use crate::unit::{Unit, CONTEXT_SIDE};

pub const SHARED_PROPERTIES_FILTER: &str = "sharedProperties";
pub const PAGE_TITLE_FILTER: &str = "pageTitle";
pub const MENU_TITLE_FILTER: &str = "menuTitle";

/// Reconcile the shared settings of `units` (in attachment order).
///
/// `defaults` overrides the static fallbacks; `overrides` is applied after
/// unit values. Transforms receive `page_id` as context.
pub fn reconcile_units<B>(
    page_id: &str,
    units: &[Arc<dyn Unit>],
    defaults: &Map<String, Value>,
    bus: &B,
    overrides: Option<&Map<String, Value>>,
) -> SharedConfig
where
    B: EventBus + ?Sized,
{
    let any_side = units.iter().any(|unit| unit.context() == CONTEXT_SIDE);
    let context = [Value::String(page_id.to_string())];

    let mut fallbacks = static_fallbacks();
    if let Some(first) = units.first() {
        fallbacks.insert("title".to_string(), Value::String(first.title().to_string()));
    }
    let fallbacks = merge_into(&fallbacks, &Value::Object(defaults.clone()));

    let mut display: Option<VoidCall> = None;
    let mut map = Map::with_capacity(PROPERTIES.len());

    for def in PROPERTIES {
        let value = match def.key {
            "display_cb" => {
                display = units.iter().rev().find_map(|unit| unit.display_callback());
                Value::Bool(display.is_some())
            }
            "title" => {
                let title = last_declared(units, def).unwrap_or_else(|| fallback(&fallbacks, def));
                bus.apply_transform(PAGE_TITLE_FILTER, title, &context)
            }
            "menu_title" => {
                let menu_title = last_declared(units, def).unwrap_or_else(|| {
                    match fallbacks.get("menu_title") {
                        Some(Value::String(s)) if !s.is_empty() => Value::String(s.clone()),
                        _ => map.get("title").cloned().unwrap_or(Value::Null),
                    }
                });
                bus.apply_transform(MENU_TITLE_FILTER, menu_title, &context)
            }
            _ => last_declared(units, def).unwrap_or_else(|| fallback(&fallbacks, def)),
        };
        map.insert(def.key.to_string(), value);
    }

    let columns = normalize_columns(map.get("page_columns").unwrap_or(&Value::Null), any_side);
    map.insert("page_columns".to_string(), Value::from(columns));

    if let Some(overrides) = overrides.filter(|o| !o.is_empty()) {
        trace!("Applying overrides to '{}'{}", page_id, Pretty(overrides));
        map = apply_overlay(&map, &Value::Object(overrides.clone()), &mut display);
    }

    let filtered = bus.apply_transform(
        SHARED_PROPERTIES_FILTER,
        Value::Object(map.clone()),
        &context,
    );
    if filtered.as_object() != Some(&map) {
        debug!("'{}' changed shared properties of '{}'", SHARED_PROPERTIES_FILTER, page_id);
        map = apply_overlay(&map, &filtered, &mut display);
    }

    let config = SharedConfig::from_map(&map, display, any_side);
    debug!("Reconciled shared settings for '{}'{}", page_id, Pretty(&config));
    config
}

/// Last non-null unit value for `def`; `""` only counts where allowed.
fn last_declared(units: &[Arc<dyn Unit>], def: &PropertyDef) -> Option<Value> {
    units
        .iter()
        .filter_map(|unit| unit.setting(def.key))
        .filter(|value| match value {
            Value::Null => false,
            Value::String(s) if s.is_empty() => def.empty_string_ok,
            _ => true,
        })
        .last()
}

fn fallback(fallbacks: &Map<String, Value>, def: &PropertyDef) -> Value {
    fallbacks.get(def.key).cloned().unwrap_or(Value::Null)
}

fn merge_into(base: &Map<String, Value>, overlay: &Value) -> Map<String, Value> {
    match merge_strict(&Value::Object(base.clone()), overlay, false) {
        Value::Object(map) => map,
        _ => base.clone(),
    }
}

/// Merge `overlay` strictly and revert any property whose new value is of a
/// kind its allow-list rejects. `display_cb` only accepts `false`, which
/// clears the callback.
fn apply_overlay(
    reconciled: &Map<String, Value>,
    overlay: &Value,
    display: &mut Option<VoidCall>,
) -> Map<String, Value> {
    let mut merged = merge_into(reconciled, overlay);

    for def in PROPERTIES {
        let Some(value) = merged.get(def.key) else {
            continue;
        };
        let allowed = if def.key == "display_cb" {
            *value == Value::Bool(false)
        } else {
            def.allow.iter().any(|kind| kind.matches(value))
        };
        if !allowed {
            trace!("Override of '{}' rejected by allow-list", def.key);
            let original = reconciled.get(def.key).cloned().unwrap_or(Value::Null);
            merged.insert(def.key.to_string(), original);
        }
    }

    if merged.get("display_cb") == Some(&Value::Bool(false)) {
        *display = None;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PageFormat, ResetMode};
    use crate::unit::MemoryUnit;
    use pagehook_common::void_call;
    use pagehook_hooks::MemoryBus;
    use serde_json::json;

    fn unit(id: &str, settings: &[(&str, Value)]) -> Arc<dyn Unit> {
        let mut builder = MemoryUnit::builder(id).title(format!("{} title", id));
        for (key, value) in settings {
            builder = builder.setting(key, value.clone()).unwrap();
        }
        Arc::new(builder.build())
    }

    fn reconcile(units: &[Arc<dyn Unit>], overrides: Option<Value>) -> SharedConfig {
        let overrides = overrides.and_then(|v| v.as_object().cloned());
        reconcile_units("opts", units, &Map::new(), &MemoryBus::new(), overrides.as_ref())
    }

    #[test]
    fn test_no_units_uses_fallbacks() {
        let config = reconcile(&[], None);
        assert_eq!(config.capability, "manage_options");
        assert_eq!(config.title, "");
        assert_eq!(config.menu_title, "");
        assert_eq!(config.page_columns, 1);
    }

    #[test]
    fn test_last_declared_value_wins() {
        let units = [
            unit("u1", &[("capability", json!("edit_posts"))]),
            unit("u2", &[("capability", json!("manage_network"))]),
            unit("u3", &[("capability", json!(null))]),
        ];
        assert_eq!(reconcile(&units, None).capability, "manage_network");
    }

    #[test]
    fn test_empty_string_only_where_allowed() {
        let units = [
            unit("u1", &[("icon", json!("dashicons-admin")), ("save_button", json!("Apply"))]),
            unit("u2", &[("icon", json!("")), ("save_button", json!(""))]),
        ];
        let config = reconcile(&units, None);
        assert_eq!(config.icon, "dashicons-admin");
        assert_eq!(config.save_button, "");
    }

    #[test]
    fn test_title_fallbacks() {
        let units = [unit("u1", &[]), unit("u2", &[])];
        let config = reconcile(&units, None);
        assert_eq!(config.title, "u1 title");
        assert_eq!(config.menu_title, "u1 title");

        let units = [unit("u1", &[("title", json!("Page")), ("menu_title", json!("Menu"))])];
        let config = reconcile(&units, None);
        assert_eq!(config.title, "Page");
        assert_eq!(config.menu_title, "Menu");
    }

    #[test]
    fn test_column_detection() {
        let side: Arc<dyn Unit> = Arc::new(MemoryUnit::builder("side").context("side").build());
        assert_eq!(reconcile(&[unit("u1", &[]), side.clone()], None).page_columns, 2);
        assert_eq!(reconcile(&[unit("u1", &[])], None).page_columns, 1);

        let fixed = unit("u2", &[("page_columns", json!(1))]);
        assert_eq!(reconcile(&[side, fixed], None).page_columns, 1);
    }

    #[test]
    fn test_title_transforms() {
        let mut bus = MemoryBus::new();
        bus.register_transform(
            PAGE_TITLE_FILTER,
            Arc::new(|v: Value, _: &[Value]| json!(format!("{}!", v.as_str().unwrap_or_default()))),
            10,
            1,
        );
        bus.register_transform(
            MENU_TITLE_FILTER,
            Arc::new(|v: Value, ctx: &[Value]| {
                json!(format!("{} [{}]", v.as_str().unwrap_or_default(), ctx[0].as_str().unwrap_or_default()))
            }),
            10,
            2,
        );
        let config = reconcile_units("opts", &[unit("u1", &[])], &Map::new(), &bus, None);
        assert_eq!(config.title, "u1 title!");
        assert_eq!(config.menu_title, "u1 title! [opts]");
    }

    #[test]
    fn test_overrides_respect_kinds_and_allow_lists() {
        let config = reconcile(
            &[unit("u1", &[])],
            Some(json!({
                "capability": 5,
                "position": "top",
                "page_format": "post-like",
                "hide_menu": true,
                "bogus": 1,
            })),
        );
        assert_eq!(config.capability, "manage_options");
        assert!(config.position.is_none());
        assert_eq!(config.page_format, PageFormat::PostLike);
        assert!(config.hide_menu);
    }

    #[test]
    fn test_override_position_number() {
        let config = reconcile(&[unit("u1", &[])], Some(json!({"position": 3})));
        assert_eq!(config.position.map(|n| n.to_string()), Some("3".to_string()));
    }

    #[test]
    fn test_display_cb_override_only_clears() {
        let with_cb: Arc<dyn Unit> = Arc::new(
            MemoryUnit::builder("u1")
                .display_callback(void_call(|_, _| Some("custom".to_string())))
                .build(),
        );
        assert!(reconcile(&[with_cb.clone()], None).display_cb.is_some());
        assert!(reconcile(&[with_cb.clone()], Some(json!({"display_cb": "x"}))).display_cb.is_some());
        assert!(reconcile(&[with_cb], Some(json!({"display_cb": false}))).display_cb.is_none());

        let without: Arc<dyn Unit> = Arc::new(MemoryUnit::builder("u2").build());
        assert!(reconcile(&[without], Some(json!({"display_cb": true}))).display_cb.is_none());
    }

    #[test]
    fn test_configured_defaults_replace_fallbacks() {
        let defaults = json!({"capability": "edit_posts", "reset_mode": "erase", "icon": 4});
        let config = reconcile_units(
            "opts",
            &[unit("u1", &[])],
            defaults.as_object().unwrap(),
            &MemoryBus::new(),
            None,
        );
        assert_eq!(config.capability, "edit_posts");
        assert_eq!(config.reset_mode, ResetMode::Erase);
        assert_eq!(config.icon, "");
    }

    #[test]
    fn test_shared_properties_filter_merged_strictly() {
        let mut bus = MemoryBus::new();
        bus.register_transform(
            SHARED_PROPERTIES_FILTER,
            Arc::new(|mut v: Value, _: &[Value]| {
                v["icon"] = json!("dashicons-filter");
                v["load_default_assets"] = json!("no");
                v["injected"] = json!(true);
                v
            }),
            10,
            1,
        );
        let config = reconcile_units("opts", &[unit("u1", &[])], &Map::new(), &bus, None);
        assert_eq!(config.icon, "dashicons-filter");
        assert!(config.load_default_assets);
        assert!(config.get("injected").is_err());
    }
}
