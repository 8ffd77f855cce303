//! Layered configuration loading.

use config::{Config, Environment, File};
use loom_core::{ConfigError, EngineConfig};
use std::path::Path;
use tracing::info;

/// Prefix of environment overrides, e.g. `LOOM__COLOR_THRESHOLD=3.5` or
/// `LOOM__LAYOUT__ALIGN_EPSILON=0.05`.
pub const ENV_PREFIX: &str = "LOOM";

/// Load an [`EngineConfig`] from a file with environment overrides on top.
///
/// The file format (TOML, JSON, YAML) follows the extension. The result is
/// not validated; [`EngineConfig::vocabulary`] does that when an engine is
/// built from it.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let load_error = |err: config::ConfigError| ConfigError::Load {
        path: path.display().to_string(),
        reason: err.to_string(),
    };

    info!(path = %path.display(), "loading configuration");

    Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
        .build()
        .map_err(load_error)?
        .try_deserialize::<EngineConfig>()
        .map_err(load_error)
}
