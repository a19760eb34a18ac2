//! Configuration types for Notch Capsule.
//!
//! Every value may be written either plainly or in the described form used by
//! `notch-config.json`:
//!
//! ```jsonc
//! {
//!   "hover": {
//!     "expand_delay_ms": 250,
//!     "collapse_delay_ms": { "value": 150, "description": "Delay before collapsing" }
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Described values
// ============================================================================

/// A configuration value, optionally wrapped with a description.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
#[allow(dead_code)]
enum Described<T> {
    /// The value on its own.
    Plain(T),
    /// The value with a human-readable description.
    Described {
        value: T,
        #[serde(default)]
        description: Option<String>,
    },
}

/// Deserializes a value written in either form.
fn described<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Described::deserialize(deserializer)? {
        Described::Plain(value) | Described::Described { value, .. } => value,
    })
}

// ============================================================================
// Sections
// ============================================================================

/// Animation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnimationConfig {
    /// Duration in seconds for the expand animation.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub expand_duration: f64,

    /// Duration in seconds for the collapse animation.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub collapse_duration: f64,

    /// Cubic bezier control points for the native expand animation.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<[f64; 4]>")]
    pub expand_timing: [f64; 4],

    /// Cubic bezier control points for the native collapse animation.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<[f64; 4]>")]
    pub collapse_timing: [f64; 4],
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            expand_duration: 0.50,
            collapse_duration: 0.35,
            expand_timing: [0.16, 1.0, 0.3, 1.0],
            collapse_timing: [0.25, 0.1, 0.25, 1.0],
        }
    }
}

impl AnimationConfig {
    #[must_use]
    pub fn expand_duration(&self) -> Duration {
        seconds_or(self.expand_duration, Self::default().expand_duration)
    }

    #[must_use]
    pub fn collapse_duration(&self) -> Duration {
        seconds_or(self.collapse_duration, Self::default().collapse_duration)
    }
}

fn seconds_or(value: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(value)
        .or_else(|_| Duration::try_from_secs_f64(fallback))
        .unwrap_or_default()
}

/// Capsule sizes in logical points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DimensionsConfig {
    /// Corner radius in points.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub corner_radius: f64,

    /// Width when collapsed.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub collapsed_width: f64,

    /// Height when collapsed.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub collapsed_height: f64,

    /// Width when expanded.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub expanded_width: f64,

    /// Height when expanded.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub expanded_height: f64,
}

impl Default for DimensionsConfig {
    fn default() -> Self {
        Self {
            corner_radius: 12.0,
            collapsed_width: 460.0,
            collapsed_height: 50.0,
            expanded_width: 700.0,
            expanded_height: 200.0,
        }
    }
}

/// Hover detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HoverConfig {
    /// Hover zone width when collapsed.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub collapsed_zone_width: f64,

    /// Hover zone height when collapsed.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub collapsed_zone_height: f64,

    /// Hover zone width when expanded.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub expanded_zone_width: f64,

    /// Hover zone height when expanded.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub expanded_zone_height: f64,

    /// Milliseconds to wait before expanding.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<u64>")]
    pub expand_delay_ms: u64,

    /// Milliseconds to wait before collapsing.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<u64>")]
    pub collapse_delay_ms: u64,

    /// Pointer polling interval in milliseconds.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<u64>")]
    pub poll_interval_ms: u64,

    /// Extra pixels around the expanded panel still counted as inside.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<f64>")]
    pub slop: f64,
}

impl Default for HoverConfig {
    fn default() -> Self {
        let dimensions = DimensionsConfig::default();
        Self {
            collapsed_zone_width: dimensions.collapsed_width,
            collapsed_zone_height: dimensions.collapsed_height,
            expanded_zone_width: dimensions.expanded_width,
            expanded_zone_height: dimensions.expanded_height,
            expand_delay_ms: 250,
            collapse_delay_ms: 150,
            poll_interval_ms: 50,
            slop: 4.0,
        }
    }
}

impl HoverConfig {
    #[must_use]
    pub const fn expand_delay(&self) -> Duration { Duration::from_millis(self.expand_delay_ms) }

    #[must_use]
    pub const fn collapse_delay(&self) -> Duration { Duration::from_millis(self.collapse_delay_ms) }

    #[must_use]
    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms.max(1)) }
}

/// Window placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WindowConfig {
    /// Window level offset above the main menu.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<i32>")]
    pub level_offset: i32,
}

impl Default for WindowConfig {
    fn default() -> Self { Self { level_offset: 3 } }
}

/// Developer switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DeveloperConfig {
    /// Keep the capsule expanded regardless of hover.
    #[serde(deserialize_with = "described")]
    #[schemars(with = "Described<bool>")]
    pub force_expanded: bool,
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CapsuleConfig {
    /// Optional JSON schema reference for editor support.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub animation: AnimationConfig,
    pub dimensions: DimensionsConfig,
    pub hover: HoverConfig,
    pub window: WindowConfig,
    pub developer: DeveloperConfig,
}

impl CapsuleConfig {
    /// Checks the values the controller relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("animation.expand_duration", self.animation.expand_duration),
            ("animation.collapse_duration", self.animation.collapse_duration),
            ("dimensions.collapsed_width", self.dimensions.collapsed_width),
            ("dimensions.collapsed_height", self.dimensions.collapsed_height),
            ("dimensions.expanded_width", self.dimensions.expanded_width),
            ("dimensions.expanded_height", self.dimensions.expanded_height),
            ("hover.collapsed_zone_width", self.hover.collapsed_zone_width),
            ("hover.collapsed_zone_height", self.hover.collapsed_zone_height),
            ("hover.expanded_zone_width", self.hover.expanded_zone_width),
            ("hover.expanded_zone_height", self.hover.expanded_zone_height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a positive number")));
            }
        }

        let non_negative = [
            ("dimensions.corner_radius", self.dimensions.corner_radius),
            ("hover.slop", self.hover.slop),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must not be negative")));
            }
        }

        let timings = [
            ("animation.expand_timing", self.animation.expand_timing),
            ("animation.collapse_timing", self.animation.collapse_timing),
        ];
        for (name, points) in timings {
            if points.iter().any(|point| !point.is_finite()) {
                return Err(ConfigError::Invalid(format!("{name} must contain finite numbers")));
            }
        }

        let dims = &self.dimensions;
        if dims.expanded_width < dims.collapsed_width || dims.expanded_height < dims.collapsed_height {
            return Err(ConfigError::Invalid(
                "expanded dimensions must not be smaller than collapsed dimensions".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur when loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/notch-capsule/config.jsonc, \
         the platform config directory, or ./notch-config.json"
    )]
    NotFound,

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The configuration parsed but holds unusable values.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Loading
// ============================================================================

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Application directory name inside config roots.
const APP_DIR: &str = "notch-capsule";

/// File name used next to the working directory during development.
const LOCAL_CONFIG_FILE: &str = "notch-config.json";

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/notch-capsule/config.jsonc` or `config.json`
/// 2. `~/.config/notch-capsule/config.jsonc` or `config.json`
/// 3. the platform config directory (`~/Library/Application Support` on macOS)
/// 4. `./notch-config.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        roots.push(PathBuf::from(xdg_config).join(APP_DIR));
    }
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".config").join(APP_DIR));
    }
    if let Some(config_dir) = dirs::config_dir() {
        roots.push(config_dir.join(APP_DIR));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for root in roots {
        for filename in CONFIG_FILE_NAMES {
            let path = root.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(LOCAL_CONFIG_FILE));
    }

    paths
}

/// Loads and validates the configuration at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config_from_path(path: &Path) -> Result<(CapsuleConfig, PathBuf), ConfigError> {
    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let config: CapsuleConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok((config, path.to_path_buf()))
}

/// Loads the configuration from the first existing file in [`config_paths`].
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists, or the
/// error of the first file found.
pub fn load_config() -> Result<(CapsuleConfig, PathBuf), ConfigError> {
    config_paths()
        .into_iter()
        .find(|path| path.exists())
        .map_or(Err(ConfigError::NotFound), |path| load_config_from_path(&path))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = CapsuleConfig::default();
        assert!((config.animation.expand_duration - 0.5).abs() < f64::EPSILON);
        assert!((config.animation.collapse_duration - 0.35).abs() < f64::EPSILON);
        assert!((config.dimensions.collapsed_width - 460.0).abs() < f64::EPSILON);
        assert!((config.hover.expanded_zone_height - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.hover.expand_delay_ms, 250);
        assert_eq!(config.hover.collapse_delay_ms, 150);
        assert_eq!(config.window.level_offset, 3);
        assert!(!config.developer.force_expanded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_plain_and_described_values() {
        let json = r#"{
            "animation": {
                "expand_duration": { "value": 0.28, "description": "Expand" },
                "collapse_timing": [0.2, 0.0, 0.2, 1.0]
            },
            "hover": {
                "expand_delay_ms": 300,
                "collapse_delay_ms": { "value": 100 }
            },
            "developer": { "force_expanded": { "value": true, "description": "Pin" } }
        }"#;

        let config: CapsuleConfig = serde_json::from_str(json).unwrap();
        assert!((config.animation.expand_duration - 0.28).abs() < f64::EPSILON);
        assert_eq!(config.animation.collapse_timing, [0.2, 0.0, 0.2, 1.0]);
        assert_eq!(config.hover.expand_delay_ms, 300);
        assert_eq!(config.hover.collapse_delay_ms, 100);
        assert!(config.developer.force_expanded);
        // Untouched values keep their defaults
        assert!((config.dimensions.expanded_width - 700.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_jsonc_from_path() {
        let file = write_config(
            r#"{
                // Narrow capsule
                "dimensions": { "collapsed_width": 240 },
                /* slower hover */
                "hover": { "expand_delay_ms": 400 }
            }"#,
        );

        let (config, path) = load_config_from_path(file.path()).unwrap();
        assert_eq!(path, file.path());
        assert!((config.dimensions.collapsed_width - 240.0).abs() < f64::EPSILON);
        assert_eq!(config.hover.expand_delay(), Duration::from_millis(400));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let file = write_config("{ \"hover\": ");
        assert!(matches!(load_config_from_path(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let file = write_config(r#"{ "dimensions": { "expanded_width": 100 } }"#);
        assert!(matches!(load_config_from_path(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from_path(&dir.path().join("missing.jsonc"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_duration() {
        let mut config = CapsuleConfig::default();
        config.animation.collapse_duration = 0.0;
        assert!(config.validate().is_err());

        config.animation.collapse_duration = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_slop() {
        let mut config = CapsuleConfig::default();
        config.hover.slop = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations_fall_back_when_unusable() {
        let mut animation = AnimationConfig::default();
        animation.expand_duration = -3.0;
        assert_eq!(animation.expand_duration(), Duration::from_millis(500));
        assert!((animation.collapse_duration().as_secs_f64() - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_config_paths_end_with_local_file() {
        let paths = config_paths();
        assert!(paths.last().is_some_and(|path| path.ends_with(LOCAL_CONFIG_FILE)));
    }

    #[test]
    fn test_schema_mentions_sections() {
        let schema = schemars::schema_for!(CapsuleConfig);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("expand_delay_ms"));
        assert!(json.contains("force_expanded"));
    }
}
