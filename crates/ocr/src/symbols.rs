use docscan_core::{CodeRect, Symbology};
use image::GrayImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeError {
    #[error("Symbol reader error: {0}")]
    Reader(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("Barcode reader not available, build with `barcode` feature")]
    NotAvailable,
}

/// A symbol as reported by a reader, before payload interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSymbol {
    pub symbology: Symbology,
    pub data: Vec<u8>,
    pub rect: CodeRect,
    pub polygon: Vec<(i32, i32)>,
}

/// Locates and decodes every symbol in a grayscale image.
/// An image with no symbols is `Ok(vec![])`, not an error.
pub trait SymbolReader: Send + Sync {
    fn read(&self, image: &GrayImage) -> Result<Vec<RawSymbol>, CodeError>;
}

/// Reports a fixed set of symbols for any image. Coordinates can be made
/// proportional to the image size to exercise multi-scale remapping.
pub struct MockReader {
    symbols: Vec<RawSymbol>,
    relative: bool,
    min_width: u32,
}

impl MockReader {
    pub fn new(symbols: Vec<RawSymbol>) -> Self {
        Self { symbols, relative: false, min_width: 0 }
    }

    /// Treat each symbol's coordinates as per-mille of the image size.
    pub fn relative(mut self) -> Self {
        self.relative = true;
        self
    }

    /// Report nothing for images narrower than `width` pixels.
    pub fn min_width(mut self, width: u32) -> Self {
        self.min_width = width;
        self
    }
}

impl SymbolReader for MockReader {
    fn read(&self, image: &GrayImage) -> Result<Vec<RawSymbol>, CodeError> {
        if image.width() < self.min_width {
            return Ok(Vec::new());
        }
        if !self.relative {
            return Ok(self.symbols.clone());
        }
        let (w, h) = (image.width() as i64, image.height() as i64);
        let sx = |v: i32| (v as i64 * w / 1000) as i32;
        let sy = |v: i32| (v as i64 * h / 1000) as i32;
        Ok(self
            .symbols
            .iter()
            .map(|s| RawSymbol {
                rect: CodeRect {
                    left: sx(s.rect.left),
                    top: sy(s.rect.top),
                    width: sx(s.rect.width),
                    height: sy(s.rect.height),
                },
                polygon: s.polygon.iter().map(|&(x, y)| (sx(x), sy(y))).collect(),
                ..s.clone()
            })
            .collect())
    }
}

// ── rxing backend (optional, gated behind `barcode` feature) ──────────────────

#[cfg(feature = "barcode")]
pub mod rxing_backend {
    use super::{CodeError, RawSymbol, SymbolReader};
    use docscan_core::{CodeRect, Symbology};
    use image::GrayImage;
    use rxing::BarcodeFormat;

    #[derive(Debug, Default)]
    pub struct RxingReader;

    impl SymbolReader for RxingReader {
        fn read(&self, image: &GrayImage) -> Result<Vec<RawSymbol>, CodeError> {
            // rxing reports "nothing found" as an error; callers treat both the same.
            let results = rxing::helpers::detect_multiple_in_luma(
                image.as_raw().clone(),
                image.width(),
                image.height(),
            )
            .map_err(|e| CodeError::Reader(e.to_string()))?;

            Ok(results
                .iter()
                .map(|r| {
                    let polygon: Vec<(i32, i32)> =
                        r.getPoints().iter().map(|p| (p.x as i32, p.y as i32)).collect();
                    RawSymbol {
                        symbology: symbology(r.getBarcodeFormat()),
                        data: r.getText().as_bytes().to_vec(),
                        rect: CodeRect::bounding(&polygon),
                        polygon,
                    }
                })
                .collect())
        }
    }

    fn symbology(format: &BarcodeFormat) -> Symbology {
        match format {
            BarcodeFormat::QR_CODE => Symbology::Qr,
            BarcodeFormat::EAN_13 => Symbology::Ean13,
            BarcodeFormat::EAN_8 => Symbology::Ean8,
            BarcodeFormat::UPC_A => Symbology::UpcA,
            BarcodeFormat::UPC_E => Symbology::UpcE,
            BarcodeFormat::CODE_128 => Symbology::Code128,
            other => Symbology::Other(format!("{other:?}")),
        }
    }
}
