//! Widget configuration module.
//!
//! Handles loading, validating, and merging `config.toml` files. Stock
//! defaults are the base layer; each config file given on the command line is
//! merged on top, in order, so later files override earlier ones.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! catalog = "catalog.toml"      # Catalog file (omit for the built-in catalog)
//!
//! [timing]
//! generation_delay_ms = 2000    # Simulated round trip of the image service
//! settle_delay_ms = 300         # Skeleton fade-out before the image is shown
//!
//! [images]
//! width = 1200                  # Width stamped onto every displayed image
//! height = 675                  # Height stamped onto every displayed image
//!
//! [announcer]
//! clear_after_ms = 3000         # How long an announcement stays in the live region
//!
//! [picker]
//! per_page = 3                  # Thumbnails per picker page
//!
//! [selector]
//! seed = 42                     # Fixed RNG seed (omit for a random seed)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [timing]
//! generation_delay_ms = 500
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::Dimensions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Widget configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WidgetConfig {
    /// Catalog file replacing the built-in catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    /// Pipeline stage delays.
    pub timing: TimingConfig,
    /// Dimensions applied to displayed images.
    pub images: ImagesConfig,
    /// Live region behaviour.
    pub announcer: AnnouncerConfig,
    /// Catalog picker layout.
    pub picker: PickerConfig,
    /// Random selection settings.
    pub selector: SelectorConfig,
}

impl WidgetConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.width == 0 || self.images.height == 0 {
            return Err(ConfigError::Validation(
                "images.width and images.height must be non-zero".into(),
            ));
        }
        if self.picker.per_page == 0 {
            return Err(ConfigError::Validation(
                "picker.per_page must be at least 1".into(),
            ));
        }
        if self.announcer.clear_after_ms == 0 {
            return Err(ConfigError::Validation(
                "announcer.clear_after_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Delay before the generated image is committed to the history.
    pub generation_delay_ms: u64,
    /// Further delay before the skeleton is hidden and success announced.
    pub settle_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            generation_delay_ms: 2000,
            settle_delay_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        let dims = Dimensions::default();
        Self {
            width: dims.width,
            height: dims.height,
        }
    }
}

impl ImagesConfig {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnouncerConfig {
    /// Milliseconds an announcement stays readable before the region clears.
    pub clear_after_ms: u64,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            clear_after_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PickerConfig {
    pub per_page: usize,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self { per_page: 3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorConfig {
    /// Fixed RNG seed. When absent, every run draws a fresh seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(WidgetConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read one config file as a raw TOML value.
///
/// A relative `catalog` path is resolved against the file's directory so a
/// config and its catalog can travel together.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut value: toml::Value = toml::from_str(&content)?;
    if let Some(toml::Value::String(catalog)) = value.get_mut("catalog") {
        let catalog_path = Path::new(catalog.as_str());
        if catalog_path.is_relative() {
            if let Some(dir) = path.parent() {
                let resolved = dir.join(catalog_path).to_string_lossy().into_owned();
                *catalog = resolved;
            }
        }
    }
    Ok(value)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<WidgetConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: WidgetConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given files, later files overriding earlier ones.
///
/// With no files this is the validated stock config.
pub fn load_config(paths: &[PathBuf]) -> Result<WidgetConfig, ConfigError> {
    let overlays = paths
        .iter()
        .map(|p| load_raw_config(p))
        .collect::<Result<Vec<_>, _>>()?;
    resolve_config(stock_defaults_value(), overlays)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Visual Blocks Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Several files can be passed with repeated --config flags; each one only
# needs the keys it wants to override. Unknown keys will cause an error.

# Catalog file replacing the built-in catalog. Relative paths are resolved
# against the directory of this config file.
# catalog = "catalog.toml"

# ---------------------------------------------------------------------------
# Generation pipeline timing
# ---------------------------------------------------------------------------
[timing]
# Delay before a generated image joins the history (simulated round trip).
generation_delay_ms = 2000
# Further delay before the loading skeleton is hidden.
settle_delay_ms = 300

# ---------------------------------------------------------------------------
# Displayed image dimensions
# ---------------------------------------------------------------------------
[images]
width = 1200
height = 675

# ---------------------------------------------------------------------------
# Screen reader live region
# ---------------------------------------------------------------------------
[announcer]
# Milliseconds before an announcement is cleared.
clear_after_ms = 3000

# ---------------------------------------------------------------------------
# Catalog picker
# ---------------------------------------------------------------------------
[picker]
# Thumbnails shown per page.
per_page = 3

# ---------------------------------------------------------------------------
# Random selection
# ---------------------------------------------------------------------------
[selector]
# Fixed seed for reproducible sessions. Omit for a random seed.
# seed = 42
"##
}
