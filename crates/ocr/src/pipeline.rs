use std::path::{Path, PathBuf};

use docscan_core::{DecodedCode, PipelineConfig, RunSettings, StructuredFields};
use serde::Serialize;
use tracing::info;

use crate::codes::CodeDetector;
use crate::extract::Extractor;
use crate::preprocess::Preprocessor;
use crate::text::TextRecognizer;

/// Everything extracted from one image.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub source: PathBuf,
    /// The binarized working copy, or `source` when preprocessing failed.
    pub processed_path: PathBuf,
    /// Files written during the run. Removing them is the caller's job.
    pub artifacts: Vec<PathBuf>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub codes: Vec<DecodedCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<StructuredFields>,
}

/// Orchestrates: preprocess → OCR on the working copy → codes on the
/// original → field extraction.
pub struct DocumentPipeline {
    preprocessor: Preprocessor,
    recognizer: TextRecognizer,
    detector: CodeDetector,
    run: RunSettings,
}

impl DocumentPipeline {
    pub fn new(
        preprocessor: Preprocessor,
        recognizer: TextRecognizer,
        detector: CodeDetector,
        run: RunSettings,
    ) -> Self {
        Self { preprocessor, recognizer, detector, run }
    }

    /// Build every component from configuration, using whichever native
    /// backends were compiled in.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Preprocessor::new(config.preprocess.clone()),
            TextRecognizer::from_settings(config.ocr.clone()),
            CodeDetector::from_settings(config.codes.clone(), config.preprocess.clone()),
            config.pipeline.clone(),
        )
    }

    pub fn recognizer(&self) -> &TextRecognizer {
        &self.recognizer
    }

    pub fn detector(&self) -> &CodeDetector {
        &self.detector
    }

    pub fn run_settings_mut(&mut self) -> &mut RunSettings {
        &mut self.run
    }

    /// Run the full pipeline. Never fails: each stage degrades to an empty value.
    pub fn process(&self, path: &Path) -> ScanResult {
        let processed_path = self.preprocessor.preprocess(path);
        let artifacts = if processed_path != path { vec![processed_path.clone()] } else { Vec::new() };

        let text = self.recognizer.recognize_text(&processed_path);
        let confidence = self
            .run
            .report_confidence
            .then(|| self.recognizer.mean_confidence(&processed_path));

        // The detector builds its own variants; the binarized copy loses fine modules.
        let codes = self.detector.detect_codes(path);

        let fields = self.run.extract_fields.then(|| Extractor::extract(&text));

        info!(
            "Processed {}: {} characters, {} codes",
            path.display(),
            text.len(),
            codes.len()
        );

        ScanResult {
            source: path.to_path_buf(),
            processed_path,
            artifacts,
            text,
            confidence,
            codes,
            fields,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::MockRecognizer;
    use crate::symbols::{MockReader, RawSymbol};
    use docscan_core::{CodeRect, CodeSettings, OcrSettings, PreprocessSettings, Symbology, TextToken};
    use image::{GrayImage, ImageBuffer, Luma};

    fn receipt_png(dir: &Path) -> PathBuf {
        let img: GrayImage = ImageBuffer::from_fn(48, 48, |x, _| Luma([if x % 6 < 3 { 20 } else { 230 }]));
        let path = dir.join("receipt.png");
        img.save(&path).unwrap();
        path
    }

    fn pipeline(text: &str, run: RunSettings) -> DocumentPipeline {
        let mock = MockRecognizer::new(text).with_tokens(vec![TextToken {
            text: "Total".into(),
            left: 0,
            top: 0,
            width: 10,
            height: 5,
            confidence: 88.0,
        }]);
        let reader = MockReader::new(vec![RawSymbol {
            symbology: Symbology::Qr,
            data: b"https://shop.example/r/42".to_vec(),
            rect: CodeRect { left: 2, top: 2, width: 20, height: 20 },
            polygon: vec![(2, 2), (22, 2), (22, 22), (2, 22)],
        }]);
        DocumentPipeline::new(
            Preprocessor::default(),
            TextRecognizer::new(mock, OcrSettings::default()),
            CodeDetector::new(reader, CodeSettings::default(), PreprocessSettings::default()),
            run,
        )
    }

    #[test]
    fn process_produces_text_codes_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let src = receipt_png(dir.path());
        let result = pipeline("STARBUCKS\n2024-01-15\nTotal $5.50", RunSettings::default()).process(&src);

        assert_eq!(result.text, "STARBUCKS 2024-01-15 Total $5.50");
        assert_eq!(result.processed_path, dir.path().join("receipt_processed.png"));
        assert_eq!(result.artifacts, vec![result.processed_path.clone()]);
        assert!(result.processed_path.exists());
        assert_eq!(result.codes.len(), 1);
        let fields = result.fields.unwrap();
        assert!(fields.amounts.contains("$5.50"));
        assert!(fields.dates.contains("2024-01-15"));
        assert!(result.confidence.is_none());
    }

    #[test]
    fn field_extraction_and_confidence_follow_settings() {
        let dir = tempfile::tempdir().unwrap();
        let src = receipt_png(dir.path());
        let run = RunSettings { extract_fields: false, report_confidence: true };
        let result = pipeline("Total $5.50", run).process(&src);
        assert!(result.fields.is_none());
        assert_eq!(result.confidence, Some(88.0));
    }

    #[test]
    fn unreadable_input_degrades_to_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("broken.png");
        std::fs::write(&src, b"not an image").unwrap();
        let result = pipeline("ignored", RunSettings::default()).process(&src);
        assert_eq!(result.processed_path, src);
        assert!(result.artifacts.is_empty());
        assert_eq!(result.text, "");
        assert!(result.codes.is_empty());
        assert!(result.fields.unwrap().is_empty());
    }

    #[test]
    fn scan_result_serializes() {
        let dir = tempfile::tempdir().unwrap();
        let src = receipt_png(dir.path());
        let result = pipeline("INV #A-100", RunSettings::default()).process(&src);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["codes"][0]["info"]["type"], "url");
        assert_eq!(json["fields"]["invoice_numbers"][0], "A-100");
        assert!(json.get("confidence").is_none());
    }
}
