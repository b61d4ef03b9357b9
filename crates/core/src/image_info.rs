use serde::{Deserialize, Serialize};

/// Basic facts about an image file, read without running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Container format, e.g. `PNG`, `JPEG`.
    pub format: String,
    /// Pixel layout, e.g. `L`, `RGB`, `RGBA`, `RGB16`.
    pub color_mode: String,
    pub width: u32,
    pub height: u32,
}
