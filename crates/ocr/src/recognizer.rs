use docscan_core::TextToken;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available, build with `tesseract` feature")]
    NotAvailable,
}

/// Tesseract page-segmentation modes the recognizer cascades through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    Auto,
    SingleBlock,
    SingleWord,
    SparseText,
    SparseTextOsd,
    RawLine,
    /// Any other engine mode number.
    Other(u8),
}

impl PageSegMode {
    pub fn code(self) -> u8 {
        match self {
            PageSegMode::Auto => 3,
            PageSegMode::SingleBlock => 6,
            PageSegMode::SingleWord => 8,
            PageSegMode::SparseText => 11,
            PageSegMode::SparseTextOsd => 12,
            PageSegMode::RawLine => 13,
            PageSegMode::Other(n) => n,
        }
    }
}

impl From<u8> for PageSegMode {
    fn from(n: u8) -> Self {
        match n {
            3 => PageSegMode::Auto,
            6 => PageSegMode::SingleBlock,
            8 => PageSegMode::SingleWord,
            11 => PageSegMode::SparseText,
            12 => PageSegMode::SparseTextOsd,
            13 => PageSegMode::RawLine,
            other => PageSegMode::Other(other),
        }
    }
}

/// Per-call engine knobs. The default leaves everything to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionConfig {
    pub psm: Option<PageSegMode>,
    pub char_whitelist: Option<String>,
}

impl RecognitionConfig {
    pub fn with_psm(psm: PageSegMode) -> Self {
        Self { psm: Some(psm), char_whitelist: None }
    }
}

/// Abstraction over an OCR backend.
/// Implementations accept encoded PNG/JPEG image bytes.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8], config: &RecognitionConfig) -> Result<String, OcrError>;

    /// Word-level output with positions and confidences (engine scale 0–100, -1 = none).
    fn tokens(&self, image_bytes: &[u8]) -> Result<Vec<TextToken>, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns pre-set output, for exercising the pipeline without
/// requiring Tesseract to be installed.
pub struct MockRecognizer {
    pub text: String,
    pub tokens: Vec<TextToken>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), tokens: Vec::new() }
    }

    pub fn with_tokens(mut self, tokens: Vec<TextToken>) -> Self {
        self.tokens = tokens;
        self
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8], _config: &RecognitionConfig) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }

    fn tokens(&self, _image_bytes: &[u8]) -> Result<Vec<TextToken>, OcrError> {
        Ok(self.tokens.clone())
    }
}

/// Parse Tesseract TSV output (`level page block par line word left top width
/// height conf text`) into word tokens. Rows that are not words are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<TextToken> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.splitn(12, '\t').collect();
            if cols.len() < 11 || cols[0] != "5" {
                return None;
            }
            let num = |i: usize| cols[i].trim().parse::<i32>().ok();
            Some(TextToken {
                left: num(6)?,
                top: num(7)?,
                width: num(8)?,
                height: num(9)?,
                confidence: cols[10].trim().parse::<f32>().ok()?,
                text: cols.get(11).map(|t| t.trim().to_string()).unwrap_or_default(),
            })
        })
        .collect()
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{parse_tsv, OcrBackend, OcrError, RecognitionConfig};
    use docscan_core::TextToken;
    use leptess::{LepTess, Variable};

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }

        // LepTess is not Sync; a fresh handle per call keeps the backend shareable.
        fn session(&self, image_bytes: &[u8]) -> Result<LepTess, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            Ok(lt)
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8], config: &RecognitionConfig) -> Result<String, OcrError> {
            let mut lt = self.session(image_bytes)?;
            if let Some(psm) = config.psm {
                lt.set_variable(Variable::TesseditPagesegMode, &psm.code().to_string())
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
            }
            if let Some(whitelist) = &config.char_whitelist {
                lt.set_variable(Variable::TesseditCharWhitelist, whitelist)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
            }
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }

        fn tokens(&self, image_bytes: &[u8]) -> Result<Vec<TextToken>, OcrError> {
            let mut lt = self.session(image_bytes)?;
            let tsv = lt.get_tsv_text(0).map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(parse_tsv(&tsv))
        }
    }
}
