use crate::error::EngineResult;
use artmatch_core::EngineConfig;
use image::{GrayImage, imageops};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::gaussian_blur_f32;

/// σ matching a fixed 5×5 smoothing kernel.
const BLUR_SIGMA: f32 = 1.1;

/// Decode raw bytes into a grayscale image. The only fatal failure of the
/// pipeline for a query; for gallery entries the caller skips instead.
pub fn decode_gray(bytes: &[u8]) -> EngineResult<GrayImage> {
    Ok(image::load_from_memory(bytes)?.to_luma8())
}

/// Gallery-side normalization: denoise, then equalize contrast globally.
/// Gallery images keep their full frame; only queries are cropped.
pub fn prepare_gallery(img: &GrayImage) -> GrayImage {
    equalize_histogram(&gaussian_blur_f32(img, BLUR_SIGMA))
}

/// Query-side normalization: gallery steps, then a width bound (performance,
/// not correctness) and a center crop that discards background and frame
/// clutter around the photographed artwork.
pub fn prepare_query(img: &GrayImage, cfg: &EngineConfig) -> GrayImage {
    let img = prepare_gallery(img);
    let img = downscale_to_width(&img, cfg.max_query_width);
    center_crop(&img, cfg.crop_ratio)
}

/// Downscale so width ≤ `max_width`, preserving aspect ratio. Images already
/// narrow enough pass through unchanged.
pub fn downscale_to_width(img: &GrayImage, max_width: u32) -> GrayImage {
    let (w, h) = img.dimensions();
    if w <= max_width || w == 0 {
        return img.clone();
    }
    let new_h = ((h as u64 * max_width as u64) / w as u64).max(1) as u32;
    imageops::resize(img, max_width, new_h, imageops::FilterType::Triangle)
}

/// Keep the central `ratio` fraction of each dimension.
pub fn center_crop(img: &GrayImage, ratio: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let new_w = ((w as f32 * ratio) as u32).max(1).min(w);
    let new_h = ((h as f32 * ratio) as u32).max(1).min(h);
    let x = (w - new_w) / 2;
    let y = (h - new_h) / 2;
    imageops::crop_imm(img, x, y, new_w, new_h).to_image()
}
