//! Harness configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file at all) is a valid configuration.

use crate::HarnessError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Directory receiving one timestamped subdirectory per block run
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Ambient seed of every random draw
    #[serde(default)]
    pub seed: u64,

    /// Earlier runs of a block kept when a new run starts
    #[serde(default)]
    pub keep_previous_runs: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Validation run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Largest accepted difference for complex and float outputs
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Directory holding the outputs dumped by the native suite
    #[serde(default)]
    pub replay_dir: Option<PathBuf>,
}

fn default_output_root() -> PathBuf {
    PathBuf::from("testvector_outputs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tolerance() -> f32 {
    1e-4
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            seed: 0,
            keep_previous_runs: 0,
            log_level: default_log_level(),
            validation: ValidationConfig::default(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { tolerance: default_tolerance(), replay_dir: None }
    }
}

impl HarnessConfig {
    pub fn from_toml(text: &str) -> Result<Self, HarnessError> {
        let config: Self = toml::from_str(text).map_err(|e| HarnessError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Read the file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, HarnessError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn check(&self) -> Result<(), HarnessError> {
        if !(self.validation.tolerance >= 0.0 && self.validation.tolerance.is_finite()) {
            return Err(HarnessError::Config(format!("invalid tolerance {}", self.validation.tolerance)));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(HarnessError::Config("empty output_root".to_string()));
        }
        Ok(())
    }
}
