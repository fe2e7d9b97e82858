//! Upscaler options.
//!
//! [`Options`] carries every construction parameter of
//! [`Waifu2x`](crate::Waifu2x). It can be built in code, or loaded from a
//! TOML file whose values are merged over the stock defaults:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! gpu_id = 0              # Vulkan device ordinal, -1 for CPU
//! scale = 2               # 1 or 2
//! noise = 0               # -1 (off) to 3
//! tile_size = 0           # 0 = auto from GPU heap budget
//! model = "models-cunet"  # family name or model directory
//! tta_mode = false
//! num_threads = 1
//! # models_dir = "/usr/share/waifu2x/models"
//!
//! # [model_files]
//! # param = "/path/to/noise0_scale2.0x_model.param"
//! # bin = "/path/to/noise0_scale2.0x_model.bin"
//! ```
//!
//! Unknown keys are rejected to catch typos early. Values are validated
//! after merging; `tta_mode` must be a TOML boolean.

use crate::engine::Device;
use crate::error::Waifu2xError;
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
    #[error("{0}")]
    Invalid(#[from] Waifu2xError),
}

/// Construction options for the upscaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// GPU ordinal, or `-1` for the CPU path.
    pub gpu_id: i32,
    /// Output magnification: 1 or 2.
    pub scale: u32,
    /// Denoise level -1..=3. `-1` disables denoising and forces scale 2.
    pub noise: i32,
    /// Tile size override. `0` or negative selects it from the heap budget.
    pub tile_size: i32,
    /// Model family name or path to a model directory.
    pub model: String,
    /// Test-time augmentation.
    pub tta_mode: bool,
    /// Engine worker threads, at least 1.
    pub num_threads: u32,
    /// Directory holding model families. Defaults to `models/` next to the
    /// executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_dir: Option<PathBuf>,
    /// Explicit model file pair, bypassing name-based lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_files: Option<ModelFiles>,
}

/// Explicit `.param` / `.bin` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelFiles {
    pub param: PathBuf,
    pub bin: PathBuf,
}

pub const DEFAULT_MODEL: &str = "models-cunet";

impl Default for Options {
    fn default() -> Self {
        Self {
            gpu_id: 0,
            scale: 2,
            noise: 0,
            tile_size: 0,
            model: DEFAULT_MODEL.to_string(),
            tta_mode: false,
            num_threads: 1,
            models_dir: None,
            model_files: None,
        }
    }
}

impl Options {
    /// Check every scalar against its contract. Touches nothing outside
    /// `self`.
    pub fn validate(&self) -> Result<(), Waifu2xError> {
        if !matches!(self.scale, 1 | 2) {
            return Err(Waifu2xError::InvalidArgument(format!(
                "scale must be 1 or 2, got {}",
                self.scale
            )));
        }
        if !(-1..=3).contains(&self.noise) {
            return Err(Waifu2xError::InvalidArgument(format!(
                "noise must be in [-1, 3], got {}",
                self.noise
            )));
        }
        if self.num_threads < 1 {
            return Err(Waifu2xError::InvalidArgument(
                "num_threads must be an integer >= 1".into(),
            ));
        }
        if Device::from_selector(self.gpu_id).is_none() {
            return Err(Waifu2xError::InvalidArgument(format!(
                "gpu_id must be -1 (CPU) or a GPU ordinal >= 0, got {}",
                self.gpu_id
            )));
        }
        Ok(())
    }

    /// Execution device. Only meaningful after [`validate`](Self::validate).
    pub fn device(&self) -> Device {
        Device::from_selector(self.gpu_id).unwrap_or(Device::Cpu)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default options as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Options::default()).expect("default options must serialize")
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

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_options(overlay: Option<toml::Value>) -> Result<Options, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let options: Options = merged.try_into()?;
    options.validate()?;
    Ok(options)
}

/// Load options from a TOML file.
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_options(Some(value))
}

/// Returns a fully-commented stock config file with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# waifu2x Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# Vulkan GPU ordinal. -1 runs the (much slower) CPU path.
gpu_id = 0

# Output magnification: 1 (denoise only) or 2.
scale = 2

# Denoise level: -1 (off), 0, 1, 2 or 3.
# -1 only ships a 2x model, so it always upscales 2x regardless of `scale`.
noise = 0

# Tile size in pixels. 0 picks one from the GPU heap budget.
# Smaller tiles use less VRAM.
tile_size = 0

# Model family name (models-cunet, models-upconv_7_anime_style_art_rgb,
# models-upconv_7_photo) or a path to a model directory.
model = "models-cunet"

# Test-time augmentation: 8x slower, slightly better quality.
tta_mode = false

# Engine worker threads.
num_threads = 1

# Directory holding the model families.
# Omit to use models/ next to the executable.
# models_dir = "/usr/share/waifu2x/models"

# Load an explicit .param/.bin pair instead of looking one up by
# noise and scale. `model` still selects padding and tile heuristics.
# [model_files]
# param = "/path/to/noise0_scale2.0x_model.param"
# bin = "/path/to/noise0_scale2.0x_model.bin"
"##
}
