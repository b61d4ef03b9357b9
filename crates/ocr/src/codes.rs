use std::path::Path;

use docscan_core::{CodeSettings, DecodedCode, ExtractError, PreprocessSettings};
use image::GrayImage;
use imageproc::contrast;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info, warn};

use crate::cascade::Cascade;
use crate::filters;
use crate::preprocess;
use crate::symbols::{CodeError, SymbolReader};

/// Finds QR codes and barcodes, escalating from a direct decode to a battery
/// of enhanced variants and finally to multi-scale detection.
pub struct CodeDetector {
    reader: Option<Box<dyn SymbolReader>>,
    settings: CodeSettings,
    preprocess: PreprocessSettings,
}

impl CodeDetector {
    pub fn new(
        reader: impl SymbolReader + 'static,
        settings: CodeSettings,
        preprocess: PreprocessSettings,
    ) -> Self {
        Self { reader: Some(Box::new(reader)), settings, preprocess }
    }

    /// A detector with no reader; every call yields no codes.
    pub fn unavailable(settings: CodeSettings, preprocess: PreprocessSettings) -> Self {
        Self { reader: None, settings, preprocess }
    }

    /// rxing when compiled in, otherwise unavailable.
    pub fn from_settings(settings: CodeSettings, preprocess: PreprocessSettings) -> Self {
        #[cfg(feature = "barcode")]
        {
            Self::new(crate::symbols::rxing_backend::RxingReader, settings, preprocess)
        }
        #[cfg(not(feature = "barcode"))]
        {
            warn!("{} - QR/barcode detection disabled", CodeError::NotAvailable);
            Self::unavailable(settings, preprocess)
        }
    }

    pub fn is_available(&self) -> bool {
        self.reader.is_some()
    }

    pub fn settings(&self) -> &CodeSettings {
        &self.settings
    }

    /// Every distinct code in the image; empty on any failure.
    pub fn detect_codes(&self, path: &Path) -> Vec<DecodedCode> {
        match self.try_detect(path) {
            Ok(codes) => codes,
            Err(ExtractError::NoCodesFound) => {
                info!("No codes found in {}", path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Code detection skipped: {e}");
                Vec::new()
            }
        }
    }

    pub fn try_detect(&self, path: &Path) -> Result<Vec<DecodedCode>, ExtractError> {
        let reader = self
            .reader
            .as_deref()
            .ok_or_else(|| ExtractError::DecodingBackendUnavailable(CodeError::NotAvailable.to_string()))?;
        let gray = preprocess::load(path)
            .map_err(|e| ExtractError::unreadable(path, e))?
            .to_luma8();

        let found = Cascade::new("codes")
            .step("direct", || decode_unique(reader, &gray))
            .step("variants", || Ok(self.decode_variants(reader, &gray)))
            .step("multi-scale", || Ok(self.decode_scales(reader, &gray)))
            .run();

        match found {
            Some((step, codes)) => {
                info!("Total codes extracted from {} ({step}): {}", path.display(), codes.len());
                Ok(codes)
            }
            None => Err(ExtractError::NoCodesFound),
        }
    }

    /// Decode each enhanced variant in turn, accumulating distinct codes.
    fn decode_variants(&self, reader: &dyn SymbolReader, gray: &GrayImage) -> Vec<DecodedCode> {
        type Variant = fn(&CodeDetector, &GrayImage) -> GrayImage;
        let variants: [(&str, Variant); 4] = [
            ("grayscale", |_, g| g.clone()),
            ("equalized", |_, g| contrast::equalize_histogram(g)),
            ("blurred", |d, g| gaussian_blur_f32(g, d.preprocess.code_blur_sigma)),
            ("thresholded", |d, g| {
                let s = &d.preprocess;
                filters::adaptive_threshold_gaussian(g, s.adaptive_block_radius, s.adaptive_offset)
            }),
        ];

        let mut codes = Vec::new();
        for (name, build) in variants {
            match reader.read(&build(self, gray)) {
                Ok(symbols) => {
                    let before = codes.len();
                    symbols.into_iter().for_each(|sym| push_unique(&mut codes, sym.into()));
                    if codes.len() > before {
                        info!("Variant {name} successful: {} new codes found", codes.len() - before);
                    }
                }
                Err(e) => debug!("Variant {name} failed: {e}"),
            }
        }
        codes
    }

    /// Decode resized copies and map hits back to source coordinates.
    fn decode_scales(&self, reader: &dyn SymbolReader, gray: &GrayImage) -> Vec<DecodedCode> {
        let mut codes = Vec::new();
        for &scale in &self.settings.scales {
            let result = if scale == 1.0 {
                reader.read(gray)
            } else {
                reader.read(&filters::resize_cubic(gray, scale))
            };
            match result {
                Ok(symbols) => {
                    for sym in symbols {
                        push_unique(&mut codes, DecodedCode::from(sym).unscaled(scale));
                    }
                }
                Err(e) => debug!("Multi-scale detection at scale {scale} failed: {e}"),
            }
        }
        codes
    }
}

fn decode_unique(reader: &dyn SymbolReader, gray: &GrayImage) -> Result<Vec<DecodedCode>, CodeError> {
    let mut codes = Vec::new();
    for sym in reader.read(gray)? {
        push_unique(&mut codes, sym.into());
    }
    Ok(codes)
}

/// Codes are the same iff their decoded text matches exactly.
fn push_unique(codes: &mut Vec<DecodedCode>, code: DecodedCode) {
    if !codes.iter().any(|c| c.text == code.text) {
        codes.push(code);
    }
}
