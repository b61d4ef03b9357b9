use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Characters the primary OCR pass is restricted to.
pub const DEFAULT_CHAR_WHITELIST: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!@#$%^&*()_+-=[]{}|;:,.<>?/~` ";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for the whole extraction pipeline. Every field has a default, so an
/// empty TOML document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessSettings,
    pub codes: CodeSettings,
    pub ocr: OcrSettings,
    pub pipeline: RunSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessSettings {
    /// Gaussian sigma before binarization (5×5 kernel equivalent).
    pub blur_sigma: f32,
    /// Neighborhood radius for adaptive thresholding (radius 5 = 11×11 block).
    pub adaptive_block_radius: u32,
    /// Subtracted from the local weighted mean to form the threshold.
    pub adaptive_offset: i32,
    pub close_radius: u8,
    pub denoise_radius: u32,
    /// Images with either side below this are upscaled before OCR.
    pub min_text_dimension: u32,
    pub clahe_clip_limit: f32,
    pub clahe_grid: u32,
    /// Gaussian sigma for the code path (3×3 kernel equivalent).
    pub code_blur_sigma: f32,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            adaptive_block_radius: 5,
            adaptive_offset: 2,
            close_radius: 1,
            denoise_radius: 1,
            min_text_dimension: 300,
            clahe_clip_limit: 2.0,
            clahe_grid: 8,
            code_blur_sigma: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeSettings {
    /// Resize factors tried by multi-scale detection, in order.
    pub scales: Vec<f32>,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self { scales: vec![0.5, 1.0, 1.5, 2.0] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// tessdata directory; `None` uses the engine's default lookup.
    pub data_path: Option<String>,
    pub language: String,
    pub char_whitelist: String,
    pub primary_psm: u8,
    pub fallback_psms: Vec<u8>,
    /// Tokens at or below this confidence are dropped from positioned output.
    pub min_token_confidence: f32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            data_path: None,
            language: "eng".to_string(),
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
            primary_psm: 6,
            fallback_psms: vec![6, 8, 13, 11, 12],
            min_token_confidence: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub extract_fields: bool,
    pub report_confidence: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { extract_fields: true, report_confidence: false }
    }
}

impl PipelineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bad) = self.codes.scales.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(ConfigError::Invalid(format!("scale must be positive, got {bad}")));
        }
        let p = &self.preprocess;
        if p.blur_sigma <= 0.0 || p.code_blur_sigma <= 0.0 {
            return Err(ConfigError::Invalid("blur sigma must be positive".into()));
        }
        if p.clahe_grid == 0 {
            return Err(ConfigError::Invalid("clahe_grid must be at least 1".into()));
        }
        if let Some(psm) = std::iter::once(&self.ocr.primary_psm)
            .chain(&self.ocr.fallback_psms)
            .find(|m| **m > 13)
        {
            return Err(ConfigError::Invalid(format!("unknown page segmentation mode {psm}")));
        }
        Ok(())
    }
}
