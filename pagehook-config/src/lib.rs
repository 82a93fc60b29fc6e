//! # pagehook Config
//!
//! Configuration for the page engine, loaded with figment from defaults, an
//! optional file and `PAGEHOOK_` environment variables.
//!
//! ```rust
//! use pagehook_config::{ConfigProvider, EngineConfig};
//!
//! let config = ConfigProvider::new().load().unwrap_or_default();
//! assert!(!config.registration_trigger.is_empty());
//! # let _ = EngineConfig::default();
//! ```

pub mod config;
pub mod error;
pub mod provider;

pub use config::EngineConfig;
pub use error::{ConfigError, ConfigResult};
pub use provider::{ConfigProvider, ENV_PREFIX};
