//! Page image normalization ahead of text recognition.
//!
//! Every page, rendered or uploaded, goes through the same steps:
//! - EXIF orientation correction (uploaded photos only)
//! - grayscale conversion
//! - percentile contrast stretch (1st..99th percentile mapped to 0..255)
//! - unsharp mask
//!
//! Pure functions over `image` buffers; file handling lives in the rasterizer.

use std::io::Cursor;

use image::{imageops, DynamicImage, GrayImage, ImageOutputFormat, Luma};
use tracing::debug;

use super::ConversionError;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial files.
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

/// Share of darkest / brightest pixels ignored by the contrast stretch.
const STRETCH_CLIP_PERCENT: f32 = 1.0;

/// Below this intensity range the page is left unstretched (blank or solid pages).
const MIN_STRETCH_RANGE: u8 = 8;

const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 2;

// ═══════════════════════════════════════════════════════════
// Pipeline
// ═══════════════════════════════════════════════════════════

/// Decode raw raster bytes, apply EXIF orientation, then normalize.
pub fn normalize_raster_bytes(bytes: &[u8]) -> Result<GrayImage, ConversionError> {
    validate_image_bytes(bytes)?;
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ConversionError::ImageDecode(e.to_string()))?;
    let oriented = apply_orientation(decoded, read_exif_orientation(bytes));
    Ok(normalize_page(&oriented))
}

/// Contrast normalization + sharpening of an already decoded page.
pub fn normalize_page(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let stretched = stretch_contrast(&gray);
    let sharpened = imageops::unsharpen(&stretched, SHARPEN_SIGMA, SHARPEN_THRESHOLD);

    debug!(
        width = sharpened.width(),
        height = sharpened.height(),
        "Normalized page image"
    );

    sharpened
}

// ═══════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════

/// Validate image bytes before decoding.
/// Returns early error for clearly invalid input.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ConversionError> {
    if bytes.is_empty() {
        return Err(ConversionError::EmptyDocument);
    }
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ConversionError::ImageDecode(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ConversionError::TooLarge {
            limit_mb: MAX_IMAGE_BYTES / (1024 * 1024),
        });
    }
    Ok(())
}

/// Linear stretch mapping the clipped intensity range onto 0..=255.
pub fn stretch_contrast(gray: &GrayImage) -> GrayImage {
    let (low, high) = match percentile_bounds(gray, STRETCH_CLIP_PERCENT) {
        Some(bounds) => bounds,
        None => return gray.clone(),
    };
    if high.saturating_sub(low) < MIN_STRETCH_RANGE {
        return gray.clone();
    }

    let range = (high - low) as f32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let v = value as f32;
        *slot = (((v - low as f32) / range) * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        *pixel = Luma([lut[pixel.0[0] as usize]]);
    }
    out
}

/// Intensities at the `clip` and `100 - clip` percentiles. `None` for empty images.
fn percentile_bounds(gray: &GrayImage, clip: f32) -> Option<(u8, u8)> {
    let total = (gray.width() as u64) * (gray.height() as u64);
    if total == 0 {
        return None;
    }

    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let cutoff = ((total as f32) * clip / 100.0) as u64;
    let mut low = 0u8;
    let mut seen = 0u64;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen > cutoff {
            low = value as u8;
            break;
        }
    }

    let mut high = 255u8;
    seen = 0;
    for (value, count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > cutoff {
            high = value as u8;
            break;
        }
    }

    Some((low, high.max(low)))
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
///
/// 1 = Normal, 2 = Mirrored, 3 = 180deg, 4 = Flipped V,
/// 5 = Mirrored + 90deg CW, 6 = 90deg CW, 7 = Mirrored + 270deg CW, 8 = 270deg CW
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Encode a grayscale page as PNG bytes.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, ConversionError> {
    let dynamic = DynamicImage::ImageLuma8(img.clone());
    let mut cursor = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ConversionError::ImageEncode(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, ImageOutputFormat::Png).unwrap();
        cursor.into_inner()
    }

    /// Gray ramp confined to 100..=150, i.e. a washed-out scan.
    fn low_contrast_page() -> GrayImage {
        GrayImage::from_fn(64, 32, |x, _| Luma([100 + (x * 50 / 63) as u8]))
    }

    #[test]
    fn stretch_expands_intensity_range() {
        let stretched = stretch_contrast(&low_contrast_page());
        let min = stretched.pixels().map(|p| p.0[0]).min().unwrap();
        let max = stretched.pixels().map(|p| p.0[0]).max().unwrap();
        assert!(min < 10, "min after stretch: {min}");
        assert!(max > 245, "max after stretch: {max}");
    }

    #[test]
    fn stretch_leaves_uniform_page_alone() {
        let blank = GrayImage::from_pixel(16, 16, Luma([240]));
        let stretched = stretch_contrast(&blank);
        assert!(stretched.pixels().all(|p| p.0[0] == 240));
    }

    #[test]
    fn stretch_handles_empty_image() {
        let empty = GrayImage::new(0, 0);
        assert_eq!(stretch_contrast(&empty).dimensions(), (0, 0));
    }

    #[test]
    fn normalize_page_keeps_dimensions() {
        let rgb = image::RgbImage::from_pixel(40, 20, image::Rgb([120, 130, 140]));
        let normalized = normalize_page(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(normalized.dimensions(), (40, 20));
    }

    #[test]
    fn normalize_raster_bytes_decodes_png() {
        let img = DynamicImage::ImageLuma8(low_contrast_page());
        let normalized = normalize_raster_bytes(&png_bytes(&img)).unwrap();
        assert_eq!(normalized.dimensions(), (64, 32));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let garbage = vec![0xAB; 512];
        let err = normalize_raster_bytes(&garbage).unwrap_err();
        assert!(matches!(err, ConversionError::ImageDecode(_)));
    }

    #[test]
    fn empty_bytes_rejected() {
        assert!(matches!(
            validate_image_bytes(&[]),
            Err(ConversionError::EmptyDocument)
        ));
    }

    #[test]
    fn tiny_bytes_rejected() {
        assert!(validate_image_bytes(&[0x89, 0x50]).is_err());
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(40, 10));
        let rotated = apply_orientation(img, 6);
        assert_eq!((rotated.width(), rotated.height()), (10, 40));
    }

    #[test]
    fn unknown_orientation_is_noop() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(40, 10));
        let same = apply_orientation(img, 42);
        assert_eq!((same.width(), same.height()), (40, 10));
    }

    #[test]
    fn png_without_exif_reports_normal_orientation() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(8, 8));
        assert_eq!(read_exif_orientation(&png_bytes(&img)), 1);
    }

    #[test]
    fn encode_png_round_trips_dimensions() {
        let bytes = encode_png(&low_contrast_page()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }
}
