//! Studio configuration, read from JSON.
//!
//! Every field has a default, so `{}` is a complete configuration.
//!
//! ```json
//! {
//!   "font_path": "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
//!   "preview": { "max_width": 400, "max_height": 300 },
//!   "brand": { "left": "Eagle Eye", "right": "Contracting" },
//!   "labels": { "before": "BEFORE", "after": "AFTER" },
//!   "output_name": "eagle-eye-generated.png"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compose::{Compositor, DEFAULT_EXPORT_NAME};
use crate::layout::{Brand, LabelWords};
use crate::preview::PreviewBounds;
use crate::text::load_renderer;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let bounds = PreviewBounds::default();
        Self {
            max_width: bounds.max_width,
            max_height: bounds.max_height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub left: String,
    pub right: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        let Brand { left, right } = Brand::default();
        Self { left, right }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub before: String,
    pub after: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let LabelWords { before, after } = LabelWords::default();
        Self { before, after }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Bold font for labels and captions. Falls back to well-known system fonts.
    pub font_path: Option<PathBuf>,
    pub preview: PreviewConfig,
    pub brand: BrandConfig,
    pub labels: LabelConfig,
    /// Suggested file name for exports.
    pub output_name: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            preview: PreviewConfig::default(),
            brand: BrandConfig::default(),
            labels: LabelConfig::default(),
            output_name: DEFAULT_EXPORT_NAME.to_string(),
        }
    }
}

impl StudioConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(ConfigError::Invalid("preview bounds must be non-zero"));
        }
        if self.output_name.trim().is_empty() {
            return Err(ConfigError::Invalid("output_name must not be empty"));
        }
        Ok(())
    }

    pub fn preview_bounds(&self) -> PreviewBounds {
        PreviewBounds::new(self.preview.max_width, self.preview.max_height)
    }

    pub fn brand(&self) -> Brand {
        Brand {
            left: self.brand.left.clone(),
            right: self.brand.right.clone(),
        }
    }

    pub fn label_words(&self) -> LabelWords {
        LabelWords {
            before: self.labels.before.clone(),
            after: self.labels.after.clone(),
        }
    }

    /// Compositor with this config's font, words, and the bundled logo.
    pub fn compositor(&self) -> Compositor {
        Compositor::new(load_renderer(self.font_path.as_deref()))
            .bundled_logo()
            .brand(self.brand())
            .label_words(self.label_words())
    }
}
