//! Raster pipeline: decode → (resize) → encode for the image tools.
//!
//! Covers JPG→PNG/WebP, PNG→JPG, compression and resize. Every call decodes
//! its own surface and drops it before returning, so no pixel buffer outlives
//! a transform. The work is CPU-bound; [`transform_image`] moves it onto the
//! blocking pool.

use crate::config::{CompressionMode, ConversionParameters, OutputFormat};
use crate::error::ConvertError;
use crate::output::{Blob, ConversionResult};
use crate::pipeline::encode::{self, jpeg_quality};
use crate::tool::Tool;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, info, warn};

/// Output size for a resize.
///
/// Aspect-locked: `height = round(width × src_h / src_w)`, never below 1.
/// Unlocked: the explicit target height, or a square when none was given.
pub fn resize_dimensions(src_w: u32, src_h: u32, params: &ConversionParameters) -> (u32, u32) {
    let width = params.target_width.max(1);
    let height = if params.keep_aspect_ratio && src_w > 0 {
        let h = (width as f64 * (src_h as f64 / src_w as f64)).round();
        (h as u32).max(1)
    } else {
        params.target_height.unwrap_or(width).max(1)
    };
    (width, height)
}

/// Run an image tool on one blob, off the async executor.
pub async fn transform_image(
    tool: Tool,
    blob: Blob,
    params: ConversionParameters,
) -> Result<ConversionResult, ConvertError> {
    tokio::task::spawn_blocking(move || transform_image_blocking(tool, &blob, &params))
        .await
        .map_err(|e| ConvertError::Internal(format!("Image task panicked: {}", e)))?
}

/// Blocking implementation of the image tools.
pub fn transform_image_blocking(
    tool: Tool,
    blob: &Blob,
    params: &ConversionParameters,
) -> Result<ConversionResult, ConvertError> {
    let source = decode(blob)?;
    debug!(
        "{}: decoded '{}' at {}x{}",
        tool,
        blob.name,
        source.width(),
        source.height()
    );

    match tool {
        Tool::JpgToPng | Tool::PngToJpg => {
            let default = if tool == Tool::JpgToPng {
                OutputFormat::Png
            } else {
                OutputFormat::Jpeg
            };
            let format = params.output_format.unwrap_or(default);
            let data = encode(&source, format, params.quality)?;
            Ok(finish(tool, blob, format, data, &source, params.quality))
        }
        Tool::Compress => compress(blob, &source, params),
        Tool::Resize => {
            let (w, h) = resize_dimensions(source.width(), source.height(), params);
            let resized = source.resize_exact(w, h, FilterType::CatmullRom);
            drop(source);
            let format = params
                .output_format
                .or_else(|| OutputFormat::from_mime(&blob.mime))
                .unwrap_or(OutputFormat::Png);
            let data = encode(&resized, format, params.quality)?;
            info!("Resized '{}' to {}x{}", blob.name, w, h);
            Ok(finish(tool, blob, format, data, &resized, params.quality))
        }
        other => Err(ConvertError::InvalidConfig(format!(
            "{other} is not an image tool"
        ))),
    }
}

/// Re-encode as JPEG, either at a fixed quality or at the highest quality
/// that fits a byte budget.
fn compress(
    blob: &Blob,
    source: &DynamicImage,
    params: &ConversionParameters,
) -> Result<ConversionResult, ConvertError> {
    let flat = encode::flatten_on_white(source);
    match params.compression {
        CompressionMode::Quality => {
            let data = encode(&flat, OutputFormat::Jpeg, params.quality)?;
            Ok(finish(
                Tool::Compress,
                blob,
                OutputFormat::Jpeg,
                data,
                &flat,
                params.quality,
            ))
        }
        CompressionMode::MaxSize { max_bytes } => {
            let (quality, data) = search_quality(&flat, max_bytes)?;
            Ok(finish(
                Tool::Compress,
                blob,
                OutputFormat::Jpeg,
                data,
                &flat,
                quality,
            ))
        }
    }
}

/// Binary search over JPEG quality 1–100 for the largest output that still
/// fits in `max_bytes`. Falls back to quality 1 when nothing fits.
fn search_quality(img: &DynamicImage, max_bytes: u64) -> Result<(f32, Vec<u8>), ConvertError> {
    let (mut lo, mut hi) = (1u8, 100u8);
    let mut best: Option<(u8, Vec<u8>)> = None;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let data = encode(img, OutputFormat::Jpeg, mid as f32 / 100.0)?;
        debug!("quality {} → {} bytes (budget {})", mid, data.len(), max_bytes);
        if data.len() as u64 <= max_bytes {
            best = Some((mid, data));
            lo = mid + 1;
        } else if mid == 1 {
            break;
        } else {
            hi = mid - 1;
        }
    }

    match best {
        Some((q, data)) => Ok((q as f32 / 100.0, data)),
        None => {
            let data = encode(img, OutputFormat::Jpeg, 0.01)?;
            warn!(
                "No JPEG quality fits {} bytes; smallest output is {} bytes",
                max_bytes,
                data.len()
            );
            Ok((0.01, data))
        }
    }
}

fn decode(blob: &Blob) -> Result<DynamicImage, ConvertError> {
    encode::decode_image(blob.bytes()).map_err(|e| ConvertError::DecodeFailed {
        name: blob.name.clone(),
        detail: e.to_string(),
    })
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: f32) -> Result<Vec<u8>, ConvertError> {
    encode::encode_image(img, format, quality).map_err(|e| ConvertError::EncodeFailed {
        mime: format.mime().to_string(),
        detail: e.to_string(),
    })
}

fn finish(
    tool: Tool,
    blob: &Blob,
    format: OutputFormat,
    data: Vec<u8>,
    surface: &DynamicImage,
    quality: f32,
) -> ConversionResult {
    ConversionResult {
        file_name: tool.output_name(&blob.name, Some(format), None),
        mime: format.mime().to_string(),
        size: data.len(),
        origin_size: blob.len(),
        dimensions: Some((surface.width(), surface.height())),
        quality: format
            .honours_quality()
            .then(|| jpeg_quality(quality) as f32 / 100.0),
        page_count: None,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn params_with_width(w: u32) -> ConversionParameters {
        ConversionParameters::builder().target_width(w).build().unwrap()
    }

    #[test]
    fn aspect_locked_height_is_rounded() {
        assert_eq!(resize_dimensions(1000, 500, &params_with_width(800)), (800, 400));
        assert_eq!(resize_dimensions(3, 2, &params_with_width(10)), (10, 7)); // 6.67 → 7
        assert_eq!(resize_dimensions(1000, 1, &params_with_width(10)), (10, 1)); // never 0
    }

    #[test]
    fn aspect_locked_formula_holds_for_many_widths() {
        for w in 1..300u32 {
            let (_, h) = resize_dimensions(640, 427, &params_with_width(w));
            let expected = ((w as f64 * 427.0 / 640.0).round() as u32).max(1);
            assert_eq!(h, expected, "width {w}");
        }
    }

    #[test]
    fn unlocked_uses_target_height_or_square() {
        let p = ConversionParameters::builder()
            .target_width(300)
            .keep_aspect_ratio(false)
            .build()
            .unwrap();
        assert_eq!(resize_dimensions(1000, 500, &p), (300, 300));

        let p = p.to_builder().target_height(120).build().unwrap();
        assert_eq!(resize_dimensions(1000, 500, &p), (300, 120));
    }

    #[test]
    fn upscaling_is_allowed() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 255])));
        let bytes = encode::encode_image(&img, OutputFormat::Png, 1.0).unwrap();
        let blob = Blob::new("tiny.png", "image/png", bytes);
        let result = transform_image_blocking(Tool::Resize, &blob, &params_with_width(40)).unwrap();
        assert_eq!(result.dimensions, Some((40, 20)));
        assert_eq!(result.mime, "image/png");
        assert_eq!(result.file_name, "resized-tiny.png");
        let back = encode::decode_image(&result.data).unwrap();
        assert_eq!(back.dimensions(), (40, 20));
    }

    #[test]
    fn undecodable_input_is_a_decode_error() {
        let blob = Blob::new("broken.jpg", "image/jpeg", b"definitely not a jpeg".to_vec());
        let err = transform_image_blocking(Tool::JpgToPng, &blob, &ConversionParameters::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::DecodeFailed { .. }));
    }

    #[test]
    fn pdf_tools_are_rejected() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));
        let blob = Blob::new(
            "a.png",
            "image/png",
            encode::encode_image(&img, OutputFormat::Png, 1.0).unwrap(),
        );
        let err = transform_image_blocking(Tool::MergePdf, &blob, &ConversionParameters::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }
}
