use docscan_core::ImageInfo;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::path::Path;
use tracing::warn;

/// True iff the file decodes through both the extension-driven loader and the
/// content-sniffing reader.
pub fn validate_image(path: &Path) -> bool {
    let primary = image::open(path);
    let sniffed = open_sniffed(path);
    match (primary, sniffed) {
        (Ok(_), Ok(_)) => true,
        (Err(e), _) | (_, Err(e)) => {
            warn!("Image validation failed for {}: {e}", path.display());
            false
        }
    }
}

/// Format, color mode and dimensions from the file header. `None` when the
/// file cannot be identified.
pub fn get_image_info(path: &Path) -> Option<ImageInfo> {
    match read_info(path) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("Error getting image info for {}: {e}", path.display());
            None
        }
    }
}

/// Decode by inspecting the file's magic bytes rather than its extension.
pub fn open_sniffed(path: &Path) -> image::ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

fn read_info(path: &Path) -> image::ImageResult<ImageInfo> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format().map(format_name).unwrap_or("UNKNOWN");
    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    Ok(ImageInfo {
        format: format.to_string(),
        color_mode: color_mode(decoder.color_type()).to_string(),
        width,
        height,
    })
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Ico => "ICO",
        ImageFormat::Pnm => "PNM",
        ImageFormat::Tga => "TGA",
        _ => "OTHER",
    }
}

fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "L16",
        ColorType::La16 => "LA16",
        ColorType::Rgb16 => "RGB16",
        ColorType::Rgba16 => "RGBA16",
        ColorType::Rgb32F => "RGB32F",
        ColorType::Rgba32F => "RGBA32F",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn valid_png_passes_both_readers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.png");
        GrayImage::from_fn(5, 7, |_, _| Luma([9])).save(&path).unwrap();
        assert!(validate_image(&path));
    }

    #[test]
    fn garbage_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jpg");
        std::fs::write(&path, b"\x00\x01\x02 nope").unwrap();
        assert!(!validate_image(&path));
        assert!(get_image_info(&path).is_none());
    }

    #[test]
    fn info_reports_header_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        RgbImage::from_fn(12, 4, |_, _| Rgb([1, 2, 3])).save(&path).unwrap();
        let info = get_image_info(&path).unwrap();
        assert_eq!(
            info,
            ImageInfo { format: "PNG".into(), color_mode: "RGB".into(), width: 12, height: 4 }
        );
    }

    #[test]
    fn info_ignores_misleading_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("real.png");
        GrayImage::from_fn(3, 3, |_, _| Luma([0])).save(&png).unwrap();
        let renamed = dir.path().join("actually_png.jpg");
        std::fs::rename(&png, &renamed).unwrap();
        let info = get_image_info(&renamed).unwrap();
        assert_eq!(info.format, "PNG");
        assert_eq!(info.color_mode, "L");
    }
}
