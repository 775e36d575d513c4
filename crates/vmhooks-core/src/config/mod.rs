//! Application configuration schemas.
//!
//! Deserialized from an optional TOML file via the `config` crate, then
//! overlaid with `VMHOOKS_`-prefixed environment variables. Every field has
//! a default so an empty source still produces a usable configuration.

pub mod hooks;
pub mod logging;
pub mod sidecar;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::hooks::{DEFAULT_SOCKET_DIR, HooksConfig};
pub use self::logging::LoggingConfig;
pub use self::sidecar::SidecarConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
pub struct AppConfig {
    /// Manager-side discovery and callback settings.
    #[serde(default)]
    #[validate(nested)]
    pub hooks: HooksConfig,
    /// Plugin-side socket settings.
    #[serde(default)]
    pub sidecar: SidecarConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file (optional) and the environment.
    ///
    /// Environment variables use the `VMHOOKS_` prefix and `__` between
    /// sections, e.g. `VMHOOKS_HOOKS__EXPECTED_SIDECARS=2`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("VMHOOKS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }
}
