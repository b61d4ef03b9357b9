pub mod code;
pub mod config;
pub mod error;
pub mod fields;
pub mod image_info;
pub mod text;

pub use code::{
    CodeInfo, CodeRect, ContentClass, DecodedCode, GenericCode, ProductCode, QrPayload, Symbology,
    WifiConfig, DECODE_ERROR_MARKER,
};
pub use config::{
    CodeSettings, ConfigError, OcrSettings, PipelineConfig, PreprocessSettings, RunSettings,
};
pub use error::ExtractError;
pub use fields::StructuredFields;
pub use image_info::ImageInfo;
pub use text::{RecognizedText, TextToken};
