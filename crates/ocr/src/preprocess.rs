use docscan_core::PreprocessSettings;
use image::{DynamicImage, GrayImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::{contrast, morphology};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::filters;
use crate::image_info::open_sniffed;

pub const PROCESSED_SUFFIX: &str = "_processed";
pub const TEXT_SUFFIX: &str = "_enhanced";
pub const CODES_SUFFIX: &str = "_codes";
pub const CODE_DETECTION_SUFFIX: &str = "_enhanced_codes";

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Image has no pixels")]
    Empty,
    #[error("Cannot derive an output name from '{0}'")]
    NoFileName(PathBuf),
    #[error("Failed to write processed image: {0}")]
    Save(String),
}

/// Produces transformed copies of an input image. Every path-based method
/// writes a new file next to the source and returns its path; on any failure
/// it returns the source path unchanged.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    settings: PreprocessSettings,
}

impl Preprocessor {
    pub fn new(settings: PreprocessSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PreprocessSettings {
        &self.settings
    }

    /// General path: blur → adaptive threshold → closing → denoise.
    pub fn preprocess(&self, path: &Path) -> PathBuf {
        self.materialize(path, PROCESSED_SUFFIX, |img| self.binarize(img))
    }

    pub fn enhance_for_text(&self, path: &Path) -> PathBuf {
        self.materialize(path, TEXT_SUFFIX, |img| self.text_variant(img))
    }

    pub fn enhance_for_codes(&self, path: &Path) -> PathBuf {
        self.materialize(path, CODES_SUFFIX, |img| self.code_variant(img))
    }

    /// CLAHE-equalized grayscale, kept as a separate artifact for code readers
    /// that struggle with the globally equalized variant.
    pub fn enhance_for_code_detection(&self, path: &Path) -> PathBuf {
        self.materialize(path, CODE_DETECTION_SUFFIX, |img| {
            let s = &self.settings;
            filters::clahe(&img.to_luma8(), s.clahe_clip_limit, s.clahe_grid)
        })
    }

    // ── In-memory transforms ─────────────────────────────────────────────────

    pub fn binarize(&self, img: &DynamicImage) -> GrayImage {
        let s = &self.settings;
        let gray = img.to_luma8();
        let blurred = gaussian_blur_f32(&gray, s.blur_sigma);
        let binary =
            filters::adaptive_threshold_gaussian(&blurred, s.adaptive_block_radius, s.adaptive_offset);
        let closed = morphology::close(&binary, Norm::LInf, s.close_radius);
        median_filter(&closed, s.denoise_radius, s.denoise_radius)
    }

    /// Upscale small inputs, sharpen, then even out illumination.
    pub fn text_variant(&self, img: &DynamicImage) -> GrayImage {
        let s = &self.settings;
        let gray = filters::upscale_to_min(img.to_luma8(), s.min_text_dimension);
        let sharpened = filters::sharpen(&gray);
        filters::clahe(&sharpened, s.clahe_clip_limit, s.clahe_grid)
    }

    /// Global equalization plus a light blur; fine code modules survive.
    pub fn code_variant(&self, img: &DynamicImage) -> GrayImage {
        let equalized = contrast::equalize_histogram(&img.to_luma8());
        gaussian_blur_f32(&equalized, self.settings.code_blur_sigma)
    }

    fn materialize<F>(&self, path: &Path, suffix: &str, transform: F) -> PathBuf
    where
        F: FnOnce(&DynamicImage) -> GrayImage,
    {
        match try_materialize(path, suffix, transform) {
            Ok(out) => {
                info!("Image processed: {}", out.display());
                out
            }
            Err(e) => {
                warn!("Preprocessing '{}' ({suffix}) skipped: {e}", path.display());
                path.to_path_buf()
            }
        }
    }
}

fn try_materialize<F>(path: &Path, suffix: &str, transform: F) -> Result<PathBuf, PreprocessError>
where
    F: FnOnce(&DynamicImage) -> GrayImage,
{
    let img = load(path)?;
    let out_path = derived_path(path, suffix)?;
    transform(&img)
        .save(&out_path)
        .map_err(|e| PreprocessError::Save(e.to_string()))?;
    Ok(out_path)
}

/// Open an image by its content, rejecting zero-sized decodes.
pub fn load(path: &Path) -> Result<DynamicImage, PreprocessError> {
    let img = open_sniffed(path)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(PreprocessError::Empty);
    }
    Ok(img)
}

/// `dir/receipt.jpg` + `_codes` → `dir/receipt_codes.jpg`.
pub fn derived_path(path: &Path, suffix: &str) -> Result<PathBuf, PreprocessError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| PreprocessError::NoFileName(path.to_path_buf()))?;
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{suffix}.{ext}"),
        None => format!("{stem}{suffix}"),
    };
    Ok(path.with_file_name(name))
}
