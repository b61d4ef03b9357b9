pub mod cascade;
pub mod codes;
pub mod extract;
pub mod filters;
pub mod image_info;
pub mod interpret;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod symbols;
pub mod text;

use std::path::{Path, PathBuf};

use docscan_core::{
    CodeSettings, DecodedCode, OcrSettings, PreprocessSettings, StructuredFields,
};

pub use cascade::{Cascade, Found};
pub use codes::CodeDetector;
pub use extract::Extractor;
pub use image_info::{get_image_info, validate_image};
pub use pipeline::{DocumentPipeline, ScanResult};
pub use preprocess::{PreprocessError, Preprocessor};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, PageSegMode, RecognitionConfig};
pub use symbols::{CodeError, MockReader, RawSymbol, SymbolReader};
pub use text::{clean_text, TextRecognizer, CONFUSION_TABLE};

// ── Boundary operations with default settings ────────────────────────────────

/// Binarized working copy of `path`, or `path` itself on failure.
pub fn preprocess(path: &Path) -> PathBuf {
    Preprocessor::default().preprocess(path)
}

/// Cleaned OCR text; empty when nothing was read or no engine is compiled in.
pub fn recognize_text(path: &Path) -> String {
    TextRecognizer::from_settings(OcrSettings::default()).recognize_text(path)
}

/// Distinct codes in the image; empty when none were found or no reader is compiled in.
pub fn detect_codes(path: &Path) -> Vec<DecodedCode> {
    CodeDetector::from_settings(CodeSettings::default(), PreprocessSettings::default())
        .detect_codes(path)
}

pub fn extract_fields(text: &str) -> StructuredFields {
    Extractor::extract(text)
}
