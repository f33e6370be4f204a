//! Viewer configuration
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Lookup order: explicit path, then the path in
//! `COUNCIL_VIEW_CONFIG`, then built-in defaults.
//!
//! ```toml
//! [chart]
//! width = 1400
//! embed_png = false
//!
//! [thresholds]
//! good = 1.25
//! fair = 1.5
//!
//! [export]
//! default_filename = "council-report"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::display::Thresholds;
use crate::report::filename::sanitize_stem;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "COUNCIL_VIEW_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Chart geometry and label placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Total image width in pixels (both panels)
    pub width: u32,
    pub height: u32,
    pub font_size: f64,
    /// Labels whose vertical centers are closer than this collide
    pub label_gap_px: f64,
    /// Vertical step between the three stagger levels
    pub stagger_px: f64,
    /// Rasterize to PNG for embedding; SVG is embedded otherwise
    pub embed_png: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 520,
            font_size: 11.0,
            label_gap_px: 12.0,
            stagger_px: 12.0,
            embed_png: true,
        }
    }
}

/// Report export naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Used when the conversation has no usable title
    pub default_filename: String,
    /// Cap on the filename stem, in characters
    pub max_filename_len: usize,
    pub extension: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_filename: "council-report".to_string(),
            max_filename_len: 80,
            extension: "md".to_string(),
        }
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub chart: ChartConfig,
    pub thresholds: Thresholds,
    pub export: ExportConfig,
}

impl ViewConfig {
    /// Parse and validate a TOML document
    pub fn from_toml(source: &str, path: &Path) -> ConfigResult<Self> {
        let config: ViewConfig = toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file that must exist
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config = Self::from_toml(&source, path)?;
        debug!(path = %path.display(), "Loaded view config");
        Ok(config)
    }

    /// Resolve the configuration: explicit path, then `COUNCIL_VIEW_CONFIG`,
    /// then defaults
    pub fn resolve(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => {
                let path = PathBuf::from(path);
                if path.exists() {
                    Self::load(&path)
                } else {
                    debug!(path = %path.display(), "Config file from {CONFIG_ENV} not found; using defaults");
                    Ok(Self::default())
                }
            }
            _ => {
                debug!("No view config given; using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let Thresholds { good, fair } = self.thresholds;
        if !(good.is_finite() && fair.is_finite()) || good < 1.0 || fair < good {
            return Err(ConfigError::Invalid(format!(
                "thresholds must satisfy 1 <= good <= fair (got good={good}, fair={fair})"
            )));
        }
        if self.chart.width < 200 || self.chart.height < 120 {
            return Err(ConfigError::Invalid(format!(
                "chart must be at least 200x120 (got {}x{})",
                self.chart.width, self.chart.height
            )));
        }
        if self.chart.font_size.is_nan() || self.chart.font_size <= 0.0 {
            return Err(ConfigError::Invalid("chart.font_size must be positive".into()));
        }
        if self.export.max_filename_len == 0 || self.export.default_filename.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "export needs a default filename and a non-zero length cap".into(),
            ));
        }
        if sanitize_stem(&self.export.default_filename, self.export.max_filename_len).is_empty() {
            return Err(ConfigError::Invalid(format!(
                "export.default_filename {:?} has no filename-safe characters",
                self.export.default_filename
            )));
        }
        Ok(())
    }
}
