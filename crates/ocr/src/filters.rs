//! Pixel-level transforms used by the preprocessing paths.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::filter::{filter3x3, gaussian_blur_f32};

/// 3×3 sharpening kernel: centre 9, ring -1 (sums to 1).
pub const SHARPEN_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 9.0, -1.0, -1.0, -1.0, -1.0];

/// Sigma of the Gaussian an odd `ksize` box implies when no sigma is given.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Binarize against a Gaussian-weighted local mean: a pixel is white iff it is
/// brighter than `mean - offset` over its `(2r+1)²` neighborhood.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let sigma = sigma_for_kernel(2 * block_radius + 1).max(0.5);
    let mean = gaussian_blur_f32(gray, sigma);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0] as i32;
        let t = mean.get_pixel(x, y)[0] as i32 - offset;
        Luma([if p > t { 255 } else { 0 }])
    })
}

/// Convolve with [`SHARPEN_KERNEL`]. Edge pixels are replicated and the
/// result is clamped to `u8`.
pub fn sharpen(gray: &GrayImage) -> GrayImage {
    filter3x3::<_, f32, u8>(gray, &SHARPEN_KERNEL)
}

/// Resize by `scale` with cubic interpolation. Dimensions are truncated and
/// never drop below one pixel.
pub fn resize_cubic(gray: &GrayImage, scale: f32) -> GrayImage {
    let w = ((gray.width() as f32 * scale) as u32).max(1);
    let h = ((gray.height() as f32 * scale) as u32).max(1);
    imageops::resize(gray, w, h, FilterType::CatmullRom)
}

/// Upscale so that neither side is below `min_dim`; images already large
/// enough are returned unchanged.
pub fn upscale_to_min(gray: GrayImage, min_dim: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 || (w >= min_dim && h >= min_dim) {
        return gray;
    }
    let scale = (min_dim as f32 / h as f32).max(min_dim as f32 / w as f32);
    resize_cubic(&gray, scale)
}

/// Contrast-limited adaptive histogram equalization over a `grid × grid` tile
/// layout, bilinearly blending the per-tile mappings.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let grid = grid.max(1);
    let tile_w = w.div_ceil(grid).max(1);
    let tile_h = h.div_ceil(grid).max(1);
    let tiles_x = w.div_ceil(tile_w);
    let tiles_y = h.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);
            luts.push(tile_lut(gray, (x0, y0, x1, y1), clip_limit));
        }
    }
    let lut = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    GrayImage::from_fn(w, h, |x, y| {
        let v = gray.get_pixel(x, y)[0] as usize;

        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let (tx0, ax) = (fx.floor(), fx - fx.floor());
        let (ty0, ay) = (fy.floor(), fy - fy.floor());
        let tx1 = ((tx0 + 1.0) as i64).clamp(0, tiles_x as i64 - 1) as u32;
        let ty1 = ((ty0 + 1.0) as i64).clamp(0, tiles_y as i64 - 1) as u32;
        let tx0 = (tx0 as i64).clamp(0, tiles_x as i64 - 1) as u32;
        let ty0 = (ty0 as i64).clamp(0, tiles_y as i64 - 1) as u32;

        let top = lut(tx0, ty0)[v] as f32 * (1.0 - ax) + lut(tx1, ty0)[v] as f32 * ax;
        let bottom = lut(tx0, ty1)[v] as f32 * (1.0 - ax) + lut(tx1, ty1)[v] as f32 * ax;
        Luma([(top * (1.0 - ay) + bottom * ay).round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_lut(gray: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let area = ((x1 - x0) * (y1 - y0)).max(1);

    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for count in hist.iter_mut() {
            if *count > clip {
                excess += *count - clip;
                *count = clip;
            }
        }
        let bonus = excess / 256;
        let residual = (excess % 256) as usize;
        for (i, count) in hist.iter_mut().enumerate() {
            *count += bonus + u32::from(i < residual);
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (i, count) in hist.iter().enumerate() {
        cdf += count;
        lut[i] = (cdf as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, v: u8) -> GrayImage {
        GrayImage::from_fn(w, h, |_, _| Luma([v]))
    }

    #[test]
    fn kernel_sigma_matches_known_sizes() {
        assert!((sigma_for_kernel(3) - 0.8).abs() < 1e-6);
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
        assert!((sigma_for_kernel(11) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn adaptive_threshold_is_binary() {
        let img = GrayImage::from_fn(40, 40, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let out = adaptive_threshold_gaussian(&img, 5, 2);
        assert_eq!(out.dimensions(), (40, 40));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn adaptive_threshold_uniform_is_white() {
        // Every pixel exceeds mean - offset when the image is flat.
        let out = adaptive_threshold_gaussian(&solid(20, 20, 90), 5, 2);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn adaptive_threshold_keeps_dark_stroke_on_uneven_background() {
        // Left half dim, right half bright, one dark vertical line in each half.
        let img = GrayImage::from_fn(60, 30, |x, _| {
            let bg = if x < 30 { 90 } else { 200 };
            Luma([if x == 10 || x == 45 { bg - 60 } else { bg }])
        });
        let out = adaptive_threshold_gaussian(&img, 5, 2);
        assert_eq!(out.get_pixel(10, 15)[0], 0);
        assert_eq!(out.get_pixel(45, 15)[0], 0);
        assert_eq!(out.get_pixel(20, 15)[0], 255);
        assert_eq!(out.get_pixel(55, 15)[0], 255);
    }

    #[test]
    fn sharpen_preserves_flat_regions() {
        let out = sharpen(&solid(8, 8, 120));
        assert!(out.pixels().all(|p| p[0] == 120));
    }

    #[test]
    fn sharpen_boosts_edges_and_clamps() {
        // Dark left half, light right half.
        let img = GrayImage::from_fn(6, 4, |x, _| Luma([if x < 3 { 50 } else { 200 }]));
        let out = sharpen(&img);
        assert_eq!(out.dimensions(), (6, 4));
        // Border columns see replicated neighbours, so they stay flat.
        assert_eq!(out.get_pixel(0, 0)[0], 50);
        assert_eq!(out.get_pixel(5, 3)[0], 200);
        // 9*50 - 5*50 - 3*200 < 0 and 9*200 - 5*200 - 3*50 > 255.
        assert_eq!(out.get_pixel(2, 1)[0], 0);
        assert_eq!(out.get_pixel(3, 1)[0], 255);
    }

    #[test]
    fn upscale_small_image_to_min_side() {
        let out = upscale_to_min(solid(100, 50, 0), 300);
        // scale = max(300/50, 300/100) = 6
        assert_eq!(out.dimensions(), (600, 300));
    }

    #[test]
    fn upscale_leaves_large_image() {
        let out = upscale_to_min(solid(400, 320, 0), 300);
        assert_eq!(out.dimensions(), (400, 320));
    }

    #[test]
    fn resize_cubic_truncates_dimensions() {
        assert_eq!(resize_cubic(&solid(15, 9, 0), 0.5).dimensions(), (7, 4));
        assert_eq!(resize_cubic(&solid(1, 1, 0), 0.5).dimensions(), (1, 1));
    }

    #[test]
    fn clahe_flat_image_stays_flat() {
        let out = clahe(&solid(64, 64, 100), 2.0, 8);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn clahe_spreads_low_contrast_gradient() {
        let img = GrayImage::from_fn(128, 128, |x, _| Luma([100 + ((x % 16) / 2) as u8]));
        let out = clahe(&img, 2.0, 8);
        let min = out.pixels().map(|p| p[0]).min().unwrap();
        let max = out.pixels().map(|p| p[0]).max().unwrap();
        assert!(max - min > 7, "range {min}..{max} was not stretched");
    }

    #[test]
    fn clahe_handles_images_smaller_than_grid() {
        let img = GrayImage::from_fn(3, 5, |x, y| Luma([(x * 40 + y * 10) as u8]));
        assert_eq!(clahe(&img, 2.0, 8).dimensions(), (3, 5));
    }
}
