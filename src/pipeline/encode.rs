//! Surface encoding: `DynamicImage` → PNG / JPEG / WebP bytes.
//!
//! JPEG has no alpha channel, so every JPEG encode first composites the
//! surface onto opaque white. Without that step transparent PNG regions come
//! out black.
//!
//! The `image` crate only ships a lossless WebP encoder. WebP quality below 1
//! is applied by quantising the RGB channels first; fewer levels compress
//! better under the lossless coder. Alpha is never quantised.

use crate::config::OutputFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use tracing::debug;

/// Map a 0–1 quality fraction onto the encoder's 1–100 scale.
///
/// NaN maps to 1, the same value the JPEG encoder would fall back to.
pub fn jpeg_quality(q: f32) -> u8 {
    if q.is_nan() {
        return 1;
    }
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Number of levels per RGB channel kept at a given 1–100 WebP quality.
///
/// Quadratic in quality: high settings keep nearly every level, low ones
/// collapse to a handful.
fn webp_levels(quality: u8) -> u16 {
    if quality >= 100 {
        return 256;
    }
    let q = f32::from(quality.max(1)) / 100.0;
    (2.0 + q * q * 254.0).round().clamp(2.0, 256.0) as u16
}

/// Snap every RGB channel onto `webp_levels(quality)` evenly spaced values.
fn quantise_rgb(pixels: &mut RgbaImage, quality: u8) {
    let levels = webp_levels(quality);
    if levels >= 256 {
        return;
    }
    let step = 255.0 / f32::from(levels - 1);
    for px in pixels.pixels_mut() {
        for c in px.0.iter_mut().take(3) {
            *c = ((f32::from(*c) / step).round() * step).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Composite `img` onto an opaque white surface of the same size.
pub fn flatten_on_white(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }
    let mut surface = RgbaImage::from_pixel(img.width(), img.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut surface, &img.to_rgba8(), 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(surface).to_rgb8())
}

/// Encode a surface in `format`. `quality` is used by JPEG and WebP; PNG
/// ignores it.
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: f32,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let flat = flatten_on_white(img);
            let encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
            flat.write_with_encoder(encoder)?;
        }
        OutputFormat::Png => {
            img.write_with_encoder(PngEncoder::new(&mut buf))?;
        }
        OutputFormat::WebP => {
            // The WebP encoder accepts 8-bit RGB(A) only.
            let mut rgba = img.to_rgba8();
            quantise_rgb(&mut rgba, jpeg_quality(quality));
            let surface = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(rgba)
            } else {
                DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())
            };
            surface.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
        }
    }
    debug!(
        "Encoded {}x{} surface → {} bytes {}",
        img.width(),
        img.height(),
        buf.len(),
        format.mime()
    );
    Ok(buf)
}

/// Render bytes as a `data:` URI suitable for an `<img src>`.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode previously encoded bytes, sniffing the format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}
