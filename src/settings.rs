use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};
use crate::filter::DEFAULT_DISCOUNT_STEP;

pub const DEFAULT_DATA_FILE: &str = "ecommerce_dataset.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default = "default_discount_step")]
    pub discount_step: f64,
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

fn default_discount_step() -> f64 {
    DEFAULT_DISCOUNT_STEP
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            discount_step: default_discount_step(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dealscope")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Parse a settings file. Missing keys take their defaults.
pub fn read_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let mut settings: Settings =
        serde_json::from_str(&content).map_err(|e| DashError::Settings(e.to_string()))?;
    if !(settings.discount_step.is_finite() && settings.discount_step > 0.0) {
        settings.discount_step = default_discount_step();
    }
    Ok(settings)
}

/// Settings from the config directory, or defaults when the file is absent
/// or unreadable.
pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    match read_settings(&path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring settings file");
            Settings::default()
        }
    }
}

/// The CSV to load: `--file` wins over the configured `data_file`.
pub fn resolve_data_file(settings: &Settings, file_override: Option<&str>) -> PathBuf {
    PathBuf::from(file_override.unwrap_or(&settings.data_file))
}
