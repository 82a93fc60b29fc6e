//! Shared page settings
//!
//! Every unit attached to a page may declare values for the same set of
//! page-level properties. [`PROPERTIES`] lists them with their fallback and
//! the value kinds an override may use; [`SharedConfig`] is the typed result
//! of reconciling them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};

use pagehook_common::{PageHookError, Result, ValueKind, VoidCall};

/// One reconcilable page property.
#[derive(Debug, Clone, Copy)]
pub struct PropertyDef {
    pub key: &'static str,
    /// Whether `""` from a unit counts as a declared value
    pub empty_string_ok: bool,
    /// Kinds an override may set
    pub allow: &'static [ValueKind],
}

const fn prop(key: &'static str, empty_string_ok: bool, allow: &'static [ValueKind]) -> PropertyDef {
    PropertyDef {
        key,
        empty_string_ok,
        allow,
    }
}

const STRING: &[ValueKind] = &[ValueKind::String];
const BOOL: &[ValueKind] = &[ValueKind::Bool];

/// The property table, in reconciliation order.
pub const PROPERTIES: &[PropertyDef] = &[
    prop("capability", false, STRING),
    prop("load_default_assets", false, BOOL),
    prop("display_cb", false, BOOL),
    prop("icon", false, STRING),
    prop("parent_slug", false, STRING),
    prop("page_columns", false, &[ValueKind::String, ValueKind::Number]),
    prop("page_format", false, STRING),
    prop("title", false, STRING),
    prop("menu_title", false, STRING),
    prop("position", false, &[ValueKind::Number, ValueKind::Null]),
    prop("reset_button", true, STRING),
    prop("save_button", true, STRING),
    prop("reset_mode", false, STRING),
    prop("hide_menu", false, BOOL),
    prop("menu_first_sub", false, STRING),
];

pub fn property(key: &str) -> Option<&'static PropertyDef> {
    PROPERTIES.iter().find(|def| def.key == key)
}

pub fn is_known_property(key: &str) -> bool {
    property(key).is_some()
}

/// Static fallbacks. `title` and `menu_title` are placeholders here; their
/// real fallbacks depend on the attached units.
pub(crate) fn static_fallbacks() -> Map<String, Value> {
    [
        ("capability", json!("manage_options")),
        ("load_default_assets", json!(true)),
        ("display_cb", json!(false)),
        ("icon", json!("")),
        ("parent_slug", json!("")),
        ("page_columns", json!("auto")),
        ("page_format", json!("simple")),
        ("title", json!("")),
        ("menu_title", json!("")),
        ("position", Value::Null),
        ("reset_button", json!("")),
        ("save_button", json!("Save")),
        ("reset_mode", json!("default")),
        ("hide_menu", json!(false)),
        ("menu_first_sub", json!("")),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageFormat {
    #[default]
    Simple,
    PostLike,
}

impl PageFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "post-like" => Self::PostLike,
            _ => Self::Simple,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    /// Reset fields to their declared defaults
    #[default]
    Default,
    /// Reset fields to empty values
    Erase,
}

impl ResetMode {
    pub fn parse(s: &str) -> Self {
        match s {
            "erase" => Self::Erase,
            _ => Self::Default,
        }
    }
}

/// Normalize a raw column setting: `"auto"` follows the units' layout,
/// `2`/`"2"` is two columns, anything else one.
pub fn normalize_columns(raw: &Value, any_side_context: bool) -> u8 {
    match raw {
        Value::String(s) if s == "auto" => {
            if any_side_context {
                2
            } else {
                1
            }
        }
        Value::String(s) if s == "2" => 2,
        Value::Number(n) if n.as_f64() == Some(2.0) => 2,
        _ => 1,
    }
}

/// Canonical settings of a page.
#[derive(Clone, Serialize)]
pub struct SharedConfig {
    pub capability: String,
    pub load_default_assets: bool,
    /// Custom page render callback replacing the renderer
    #[serde(skip)]
    pub display_cb: Option<VoidCall>,
    pub icon: String,
    pub parent_slug: String,
    pub page_columns: u8,
    pub page_format: PageFormat,
    pub title: String,
    pub menu_title: String,
    pub position: Option<Number>,
    pub reset_button: String,
    pub save_button: String,
    pub reset_mode: ResetMode,
    pub hide_menu: bool,
    pub menu_first_sub: String,
}

impl SharedConfig {
    /// Build the typed config from a reconciled property map.
    ///
    /// Values of an unexpected kind fall back to the static defaults.
    pub(crate) fn from_map(
        map: &Map<String, Value>,
        display_cb: Option<VoidCall>,
        any_side_context: bool,
    ) -> Self {
        let text = |key: &str, fallback: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        let flag = |key: &str, fallback: bool| {
            map.get(key)
                .and_then(Value::as_bool)
                .unwrap_or(fallback)
        };

        Self {
            capability: text("capability", "manage_options"),
            load_default_assets: flag("load_default_assets", true),
            display_cb,
            icon: text("icon", ""),
            parent_slug: text("parent_slug", ""),
            page_columns: normalize_columns(
                map.get("page_columns").unwrap_or(&Value::Null),
                any_side_context,
            ),
            page_format: PageFormat::parse(&text("page_format", "simple")),
            title: text("title", ""),
            menu_title: text("menu_title", ""),
            position: match map.get("position") {
                Some(Value::Number(n)) => Some(n.clone()),
                _ => None,
            },
            reset_button: text("reset_button", ""),
            save_button: text("save_button", "Save"),
            reset_mode: ResetMode::parse(&text("reset_mode", "default")),
            hide_menu: flag("hide_menu", false),
            menu_first_sub: text("menu_first_sub", ""),
        }
    }

    /// Read a property by name.
    ///
    /// `display_cb` reads as a bool telling whether a callback is set.
    pub fn get(&self, key: &str) -> Result<Value> {
        if !is_known_property(key) {
            return Err(PageHookError::UnknownProperty(key.to_string()));
        }
        if key == "display_cb" {
            return Ok(Value::Bool(self.display_cb.is_some()));
        }
        let value = serde_json::to_value(self)?;
        Ok(value.get(key).cloned().unwrap_or(Value::Null))
    }

    /// Property map in table order, with `display_cb` as a bool.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        PROPERTIES
            .iter()
            .map(|def| Ok((def.key.to_string(), self.get(def.key)?)))
            .collect()
    }
}

impl fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConfig")
            .field("capability", &self.capability)
            .field("load_default_assets", &self.load_default_assets)
            .field("display_cb", &self.display_cb.as_ref().map(|_| ".."))
            .field("icon", &self.icon)
            .field("parent_slug", &self.parent_slug)
            .field("page_columns", &self.page_columns)
            .field("page_format", &self.page_format)
            .field("title", &self.title)
            .field("menu_title", &self.menu_title)
            .field("position", &self.position)
            .field("reset_button", &self.reset_button)
            .field("save_button", &self.save_button)
            .field("reset_mode", &self.reset_mode)
            .field("hide_menu", &self.hide_menu)
            .field("menu_first_sub", &self.menu_first_sub)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SharedConfig {
        SharedConfig::from_map(&static_fallbacks(), None, false)
    }

    #[test]
    fn test_table_and_fallbacks_agree() {
        let fallbacks = static_fallbacks();
        assert_eq!(fallbacks.len(), PROPERTIES.len());
        for def in PROPERTIES {
            assert!(fallbacks.contains_key(def.key), "no fallback for {}", def.key);
        }
    }

    #[test]
    fn test_fallback_config() {
        let config = defaults();
        assert_eq!(config.capability, "manage_options");
        assert!(config.load_default_assets);
        assert_eq!(config.page_columns, 1);
        assert_eq!(config.page_format, PageFormat::Simple);
        assert_eq!(config.save_button, "Save");
        assert_eq!(config.reset_mode, ResetMode::Default);
        assert!(config.position.is_none());
    }

    #[test]
    fn test_columns() {
        assert_eq!(normalize_columns(&json!("auto"), true), 2);
        assert_eq!(normalize_columns(&json!("auto"), false), 1);
        assert_eq!(normalize_columns(&json!(2), false), 2);
        assert_eq!(normalize_columns(&json!("2"), false), 2);
        assert_eq!(normalize_columns(&json!(3), true), 1);
        assert_eq!(normalize_columns(&json!(null), true), 1);
    }

    #[test]
    fn test_get_by_name() {
        let config = defaults();
        assert_eq!(config.get("capability").unwrap(), json!("manage_options"));
        assert_eq!(config.get("page_format").unwrap(), json!("simple"));
        assert_eq!(config.get("position").unwrap(), json!(null));
        assert_eq!(config.get("display_cb").unwrap(), json!(false));
    }

    #[test]
    fn test_get_unknown_property_is_error() {
        let err = defaults().get("colour").unwrap_err();
        assert!(matches!(err, PageHookError::UnknownProperty(ref k) if k == "colour"));
    }

    #[test]
    fn test_to_map_round_trips_through_from_map() {
        let mut map = static_fallbacks();
        map.insert("page_format".into(), json!("post-like"));
        map.insert("position".into(), json!(25));
        map.insert("page_columns".into(), json!(2));
        let config = SharedConfig::from_map(&map, None, false);

        let again = SharedConfig::from_map(&config.to_map().unwrap(), None, false);
        assert_eq!(again.page_format, PageFormat::PostLike);
        assert_eq!(again.position, Some(Number::from(25)));
        assert_eq!(again.page_columns, 2);
    }
}
