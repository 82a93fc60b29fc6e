//! Configuration provider using Figment for pagehook

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, info, trace};

use pagehook_common::Pretty;

use crate::config::EngineConfig;
use crate::error::{ConfigError, ConfigResult};

/// Prefix of environment variables read by [`ConfigProvider`].
pub const ENV_PREFIX: &str = "PAGEHOOK_";

/// Configuration provider using figment
///
/// Sources are merged in precedence order (later sources override earlier ones):
/// 1. [`EngineConfig::default`]
/// 2. An optional configuration file (TOML, YAML or JSON by extension)
/// 3. `PAGEHOOK_` environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    file: Option<PathBuf>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also read `path`; it must exist when [`ConfigProvider::load`] runs.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Load and validate the engine configuration.
    pub fn load(&self) -> ConfigResult<EngineConfig> {
        debug!("Loading engine configuration");

        let config: EngineConfig = self.build_figment()?.extract()?;
        config.validate()?;

        info!("Loaded engine configuration{}", Pretty(&config));
        Ok(config)
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(EngineConfig::default()));

        if let Some(path) = &self.file {
            figment = figment.merge(self.load_config_file(path)?);
        }

        trace!("Merging {}* environment variables", ENV_PREFIX);
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    fn load_config_file(&self, path: &Path) -> ConfigResult<Figment> {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        trace!("Loading config file: {}", path.display());

        match extension.as_str() {
            "toml" => Ok(Figment::from(Toml::file(path))),
            "yaml" | "yml" => Ok(Figment::from(Yaml::file(path))),
            "json" => Ok(Figment::from(Json::file(path))),
            other => Err(ConfigError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}
