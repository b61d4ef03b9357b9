use std::io::Cursor;
use std::path::Path;
use std::cell::OnceCell;
use std::sync::OnceLock;

use docscan_core::{ExtractError, OcrSettings, RecognizedText, TextToken};
use image::{DynamicImage, ImageFormat};
use regex::Regex;
use tracing::{info, warn};

use crate::cascade::Cascade;
use crate::image_info::open_sniffed;
use crate::recognizer::{OcrBackend, OcrError, PageSegMode, RecognitionConfig};

/// Digit → letters it is commonly misread as. Advisory only: nothing rewrites
/// recognized text with it.
pub const CONFUSION_TABLE: &[(char, &[char])] = &[
    ('0', &['O', 'o']),
    ('1', &['l', 'I']),
    ('5', &['S']),
    ('6', &['G']),
    ('8', &['B']),
];

/// The digit a letter may stand for, per [`CONFUSION_TABLE`].
pub fn confusable_digit(c: char) -> Option<char> {
    CONFUSION_TABLE
        .iter()
        .find(|(_, letters)| letters.contains(&c))
        .map(|(digit, _)| *digit)
}

fn re_disallowed() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        Regex::new(r#"[^\w\s\-.,!@#$%\^&*()_+=\[\]{}|;:<>?/~`"]"#).expect("invalid regex")
    })
}

fn re_whitespace() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\s+").expect("invalid regex"))
}

/// Drop characters outside the allowlist, collapse whitespace runs to one
/// space, trim. Idempotent.
pub fn clean_text(text: &str) -> String {
    let kept = re_disallowed().replace_all(text, "");
    re_whitespace().replace_all(&kept, " ").trim().to_string()
}

/// Runs OCR through a fixed cascade of image representations and engine
/// settings, returning the first non-empty cleaned result.
pub struct TextRecognizer {
    backend: Option<Box<dyn OcrBackend>>,
    settings: OcrSettings,
}

impl TextRecognizer {
    pub fn new(backend: impl OcrBackend + 'static, settings: OcrSettings) -> Self {
        Self { backend: Some(Box::new(backend)), settings }
    }

    /// A recognizer with no engine; every call yields empty output.
    pub fn unavailable(settings: OcrSettings) -> Self {
        Self { backend: None, settings }
    }

    /// Tesseract when compiled in, otherwise unavailable.
    pub fn from_settings(settings: OcrSettings) -> Self {
        #[cfg(feature = "tesseract")]
        {
            let backend = crate::recognizer::tesseract_backend::TesseractRecognizer::new(
                settings.data_path.clone(),
                &settings.language,
            );
            Self::new(backend, settings)
        }
        #[cfg(not(feature = "tesseract"))]
        {
            warn!("{}", OcrError::NotAvailable);
            Self::unavailable(settings)
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn settings(&self) -> &OcrSettings {
        &self.settings
    }

    /// Cleaned text, or an empty string when nothing could be read.
    pub fn recognize_text(&self, path: &Path) -> String {
        match self.try_recognize(path) {
            Ok(text) => text,
            Err(e) if e.is_empty_result() => {
                warn!("No text could be extracted from image: {}", path.display());
                String::new()
            }
            Err(e) => {
                warn!("Text recognition skipped: {e}");
                String::new()
            }
        }
    }

    /// Text plus average token confidence.
    pub fn recognize(&self, path: &Path) -> RecognizedText {
        let text = self.recognize_text(path);
        let confidence = Some(self.mean_confidence(path));
        RecognizedText { text, confidence }
    }

    pub fn try_recognize(&self, path: &Path) -> Result<String, ExtractError> {
        let backend = self
            .backend
            .as_deref()
            .ok_or_else(|| ExtractError::DecodingBackendUnavailable(OcrError::NotAvailable.to_string()))?;

        let primary = RecognitionConfig {
            psm: Some(PageSegMode::from(self.settings.primary_psm)),
            char_whitelist: Some(self.settings.char_whitelist.clone()),
        };

        // Decoded at most once, and only when a later step needs it.
        let sniffed: OnceCell<Result<Vec<u8>, String>> = OnceCell::new();
        let sniffed_png = || {
            sniffed
                .get_or_init(|| {
                    let img = open_sniffed(path).map_err(|e| e.to_string())?;
                    encode_rgb_png(&img).map_err(|e| e.to_string())
                })
                .as_deref()
                .map_err(|e| OcrError::ImageDecode(e.clone()))
        };
        let sniffed_png = &sniffed_png;

        let mut cascade = Cascade::new("text")
            .step("native+whitelist", || {
                let img = image::open(path).map_err(|e| OcrError::ImageDecode(e.to_string()))?;
                backend.recognize(&encode_rgb_png(&img)?, &primary).map(|t| clean_text(&t))
            })
            .step("sniffed+default", move || {
                backend.recognize(sniffed_png()?, &RecognitionConfig::default()).map(|t| clean_text(&t))
            });
        for &psm in &self.settings.fallback_psms {
            cascade = cascade.step(format!("psm {psm}"), move || {
                let cfg = RecognitionConfig::with_psm(PageSegMode::from(psm));
                backend.recognize(sniffed_png()?, &cfg).map(|t| clean_text(&t))
            });
        }

        match cascade.run() {
            Some((step, text)) => {
                info!("OCR extraction successful ({step}): {} characters", text.len());
                Ok(text)
            }
            None => match sniffed.get() {
                Some(Err(reason)) => Err(ExtractError::unreadable(path, reason)),
                _ => Err(ExtractError::NoTextFound),
            },
        }
    }

    /// Average confidence over tokens the engine scored above zero; 0.0 on any failure.
    pub fn mean_confidence(&self, path: &Path) -> f32 {
        match self.raw_tokens(path) {
            Ok(tokens) => docscan_core::text::mean_confidence(&tokens),
            Err(e) => {
                warn!("Error getting OCR confidence for {}: {e}", path.display());
                0.0
            }
        }
    }

    /// Tokens with positions, keeping only those above the confidence floor.
    pub fn text_with_boxes(&self, path: &Path) -> Vec<TextToken> {
        match self.raw_tokens(path) {
            Ok(tokens) => tokens
                .into_iter()
                .filter(|t| t.confidence > self.settings.min_token_confidence && !t.text.trim().is_empty())
                .collect(),
            Err(e) => {
                warn!("Error extracting text with coordinates from {}: {e}", path.display());
                Vec::new()
            }
        }
    }

    fn raw_tokens(&self, path: &Path) -> Result<Vec<TextToken>, OcrError> {
        let backend = self.backend.as_deref().ok_or(OcrError::NotAvailable)?;
        let img = open_sniffed(path).map_err(|e| OcrError::ImageDecode(e.to_string()))?;
        backend.tokens(&encode_rgb_png(&img)?)
    }
}

/// Normalize to 3-channel RGB and encode as PNG for the engine.
fn encode_rgb_png(img: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
    Ok(buf)
}
