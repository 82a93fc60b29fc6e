//! Engine configuration values

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};

/// Host-facing names and defaults the page engine runs with.
///
/// Every field has a default, so a partial file or a handful of environment
/// variables is enough to override one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Host trigger on which menus are built (default registration trigger
    /// for pages and hook specs)
    pub registration_trigger: String,
    /// Host trigger on which settings are registered
    pub init_trigger: String,
    /// Surface type a unit must declare before the save pipeline touches it
    pub page_category: String,
    /// Submission key prefix of per-unit anti-forgery tokens
    pub token_prefix: String,
    /// Default stylesheet handle
    pub style_asset: String,
    /// Form script handle for simple pages
    pub script_asset: String,
    /// Script handle for collapsible content boxes on post-like pages
    pub postbox_asset: String,
    /// Overrides for shared-property fallbacks, keyed by property name
    pub defaults: Map<String, Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registration_trigger: "adminMenu".to_string(),
            init_trigger: "adminInit".to_string(),
            page_category: "options-page".to_string(),
            token_prefix: "token_".to_string(),
            style_asset: "pagehook-styles".to_string(),
            script_asset: "pagehook-form".to_string(),
            postbox_asset: "postbox".to_string(),
            defaults: Map::new(),
        }
    }
}

impl EngineConfig {
    /// Check values that would leave the engine unable to register anything.
    pub fn validate(&self) -> ConfigResult<()> {
        let required = [
            ("registration_trigger", &self.registration_trigger),
            ("init_trigger", &self.init_trigger),
            ("page_category", &self.page_category),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid_value(key, "must not be empty"));
            }
        }
        Ok(())
    }

    /// Submission key holding the anti-forgery token for `unit_id`.
    pub fn token_key(&self, unit_id: &str) -> String {
        format!("{}{}", self.token_prefix, unit_id)
    }
}
