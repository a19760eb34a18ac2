//! Configuration module for Notch Capsule.
//!
//! The configuration is read once at startup; there is no hot reload. The file
//! supports JSONC format (JSON with comments). Both single-line (`//`) and
//! multi-line (`/* */`) comments are allowed.
//!
//! Loading never fails: a missing file yields the defaults, and a file that
//! cannot be read, parsed or validated is replaced by the defaults entirely,
//! with a warning.

pub mod types;

use std::path::PathBuf;
use std::sync::OnceLock;

pub use types::{
    AnimationConfig, CapsuleConfig, ConfigError, DeveloperConfig, DimensionsConfig, HoverConfig,
    WindowConfig, config_paths, load_config as load_config_default, load_config_from_path,
};

/// Global configuration instance, loaded once at startup.
static CONFIG: OnceLock<CapsuleConfig> = OnceLock::new();

/// Path to the currently loaded configuration file.
static CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Custom config path override (set via CLI --config flag).
static CUSTOM_CONFIG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Sets a custom configuration file path to use instead of the default search paths.
///
/// This must be called before `init()` or `get_config()` to take effect.
///
/// Returns `true` if the path was set, `false` if a path was already set.
pub fn set_custom_config_path(path: PathBuf) -> bool { CUSTOM_CONFIG_PATH.set(path).is_ok() }

/// Resolves the configuration from `custom` or the default search paths.
///
/// Returns the configuration together with the file it came from, if any.
#[must_use]
pub fn resolve(custom: Option<&PathBuf>) -> (CapsuleConfig, Option<PathBuf>) {
    let result = custom.map_or_else(load_config_default, |path| load_config_from_path(path));

    match result {
        Ok((config, path)) => {
            tracing::info!(path = %path.display(), "loaded configuration");
            (config, Some(path))
        }
        Err(ConfigError::NotFound) => {
            tracing::debug!("no configuration file found, using defaults");
            (CapsuleConfig::default(), None)
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
            (CapsuleConfig::default(), None)
        }
    }
}

fn load_or_default() -> CapsuleConfig {
    let (config, path) = resolve(CUSTOM_CONFIG_PATH.get());
    if let Some(path) = path {
        let _ = CONFIG_PATH.set(path);
    }
    config
}

/// Initializes and returns the global configuration instance.
///
/// Idempotent: later calls return the same instance.
pub fn init() -> &'static CapsuleConfig { CONFIG.get_or_init(load_or_default) }

/// Returns the global configuration instance, initializing it if necessary.
///
/// Prefer [`init`] at command startup so load warnings are logged up front.
pub fn get_config() -> &'static CapsuleConfig { CONFIG.get_or_init(load_or_default) }

/// Returns the path to the loaded configuration file, if any.
pub fn get_config_path() -> Option<&'static PathBuf> { CONFIG_PATH.get() }
