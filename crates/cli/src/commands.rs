use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use docscan_core::{ImageInfo, PipelineConfig, StructuredFields};
use docscan_ocr::{get_image_info, validate_image, DocumentPipeline, Extractor};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

pub struct ScanOptions {
    pub no_fields: bool,
    pub keep_artifacts: bool,
    pub confidence: bool,
}

#[derive(Debug, Serialize)]
pub struct FieldsOutput {
    #[serde(flatten)]
    pub fields: StructuredFields,
    pub amount_values: Vec<Decimal>,
    pub parsed_dates: Vec<NaiveDate>,
}

impl From<StructuredFields> for FieldsOutput {
    fn from(fields: StructuredFields) -> Self {
        FieldsOutput {
            amount_values: fields.amount_values(),
            parsed_dates: fields.parsed_dates(),
            fields,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InfoOutput {
    pub path: PathBuf,
    pub valid: bool,
    /// Empty object when the header could not be read.
    pub info: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CapabilitiesOutput {
    pub ocr: bool,
    pub codes: bool,
}

/// Run the pipeline over each path, printing one JSON line per image.
pub fn scan(config: &PipelineConfig, paths: &[PathBuf], opts: &ScanOptions) -> anyhow::Result<()> {
    let mut pipeline = DocumentPipeline::from_config(config);
    let run = pipeline.run_settings_mut();
    run.extract_fields &= !opts.no_fields;
    run.report_confidence |= opts.confidence;

    let mut out = std::io::stdout().lock();
    for path in paths {
        let result = pipeline.process(path);
        serde_json::to_writer(&mut out, &result).context("writing scan result")?;
        writeln!(out)?;
        if !opts.keep_artifacts {
            remove_artifacts(&result.artifacts);
        }
    }
    Ok(())
}

fn remove_artifacts(artifacts: &[PathBuf]) {
    for artifact in artifacts {
        if let Err(e) = std::fs::remove_file(artifact) {
            warn!("Could not remove temporary file {}: {e}", artifact.display());
        }
    }
}

pub fn fields(file: Option<&Path>) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let output = FieldsOutput::from(Extractor::extract(&text));
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn info(paths: &[PathBuf]) -> anyhow::Result<()> {
    for path in paths {
        let output = InfoOutput {
            path: path.clone(),
            valid: validate_image(path),
            info: info_json(get_image_info(path))?,
        };
        println!("{}", serde_json::to_string(&output)?);
    }
    Ok(())
}

fn info_json(info: Option<ImageInfo>) -> anyhow::Result<serde_json::Value> {
    Ok(match info {
        Some(info) => serde_json::to_value(info)?,
        None => serde_json::json!({}),
    })
}

pub fn capabilities(config: &PipelineConfig) -> anyhow::Result<()> {
    let pipeline = DocumentPipeline::from_config(config);
    let output = CapabilitiesOutput {
        ocr: pipeline.recognizer().is_available(),
        codes: pipeline.detector().is_available(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_output_flattens_and_normalizes() {
        let output = FieldsOutput::from(Extractor::extract("Paid $1,200.00 on 03/15/2024"));
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["amounts"][0], "$1,200.00");
        assert_eq!(json["parsed_dates"][0], "2024-03-15");
        assert_eq!(output.amount_values, vec![Decimal::new(120000, 2)]);
    }

    #[test]
    fn missing_info_is_empty_object() {
        assert_eq!(info_json(None).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn artifacts_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("x_processed.png");
        std::fs::write(&artifact, b"x").unwrap();
        remove_artifacts(&[artifact.clone(), dir.path().join("missing.png")]);
        assert!(!artifact.exists());
    }
}
