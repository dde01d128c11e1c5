//! Document pipeline: merge, split and JPG→PDF through pdfium.
//!
//! Every operation builds a fresh document object and serialises it once at
//! the end. Any load or build error aborts the whole operation, so callers
//! never see a partially assembled PDF.

use crate::config::{ConversionParameters, Orientation, PageSize};
use crate::engine;
use crate::error::ConvertError;
use crate::output::{Blob, ConversionResult, DocumentInfo};
use crate::pipeline::{encode, input};
use crate::tool::Tool;
use image::GenericImageView;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// PDF points per millimetre.
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Where an image lands on a page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit an `img_w × img_h` image into a page with `margin` on every side.
///
/// The image fills the usable width, shrinks to the usable height if it
/// would overflow, keeps its aspect ratio, and is centred on the full page.
pub fn fit_image(page_w: f32, page_h: f32, margin: f32, img_w: u32, img_h: u32) -> Placement {
    let usable_w = (page_w - margin * 2.0).max(0.0);
    let usable_h = (page_h - margin * 2.0).max(0.0);
    let ratio = img_w.max(1) as f32 / img_h.max(1) as f32;

    let mut width = usable_w;
    let mut height = usable_w / ratio;
    if height > usable_h {
        height = usable_h;
        width = usable_h * ratio;
    }

    Placement {
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
        width,
        height,
    }
}

fn build_err(e: PdfiumError) -> ConvertError {
    ConvertError::DocumentBuildFailed(format!("{:?}", e))
}

// ── Merge ────────────────────────────────────────────────────────────────

/// Merge two or more PDFs, in order, into one new document.
pub async fn merge(inputs: Vec<Blob>, password: Option<String>) -> Result<ConversionResult, ConvertError> {
    tokio::task::spawn_blocking(move || merge_blocking(&inputs, password.as_deref()))
        .await
        .map_err(|e| ConvertError::Internal(format!("Merge task panicked: {}", e)))?
}

/// Blocking implementation of [`merge`].
pub fn merge_blocking(inputs: &[Blob], password: Option<&str>) -> Result<ConversionResult, ConvertError> {
    if inputs.len() < 2 {
        return Err(ConvertError::NotEnoughInputs {
            required: 2,
            got: inputs.len(),
        });
    }
    for blob in inputs {
        input::ensure_pdf(blob)?;
    }

    let pdfium = engine::bind()?;
    let mut merged = pdfium.create_new_pdf().map_err(build_err)?;

    for blob in inputs {
        let donor = engine::load_document(&pdfium, &blob.name, blob.bytes(), password)?;
        debug!("Appending {} pages from '{}'", donor.pages().len(), blob.name);
        merged.pages_mut().append(&donor).map_err(build_err)?;
    }

    let page_count = merged.pages().len() as usize;
    let data = merged.save_to_bytes().map_err(build_err)?;
    info!("Merged {} documents → {} pages", inputs.len(), page_count);

    Ok(ConversionResult {
        file_name: Tool::MergePdf.output_name("", None, None),
        mime: "application/pdf".to_string(),
        size: data.len(),
        origin_size: inputs.iter().map(Blob::len).sum(),
        dimensions: None,
        quality: None,
        page_count: Some(page_count),
        data,
    })
}

// ── Split ────────────────────────────────────────────────────────────────

/// Extract `params.page_range` from one PDF into a new document.
pub async fn split(blob: Blob, params: ConversionParameters) -> Result<ConversionResult, ConvertError> {
    tokio::task::spawn_blocking(move || split_blocking(&blob, &params))
        .await
        .map_err(|e| ConvertError::Internal(format!("Split task panicked: {}", e)))?
}

/// Blocking implementation of [`split`].
pub fn split_blocking(blob: &Blob, params: &ConversionParameters) -> Result<ConversionResult, ConvertError> {
    input::ensure_pdf(blob)?;

    let pdfium = engine::bind()?;
    let source = engine::load_document(&pdfium, &blob.name, blob.bytes(), params.password.as_deref())?;
    let total = source.pages().len() as usize;
    let range = params.page_range.resolve(total)?;
    let (start, end) = (*range.start(), *range.end());

    let mut out = pdfium.create_new_pdf().map_err(build_err)?;
    out.pages_mut()
        .copy_page_range_from_document(
            &source,
            (start - 1) as PdfPageIndex..=(end - 1) as PdfPageIndex,
            0,
        )
        .map_err(build_err)?;

    let page_count = out.pages().len() as usize;
    let data = out.save_to_bytes().map_err(build_err)?;
    info!("Split '{}' pages {}-{} of {}", blob.name, start, end, total);

    Ok(ConversionResult {
        file_name: Tool::SplitPdf.output_name(&blob.name, None, Some((start, end))),
        mime: "application/pdf".to_string(),
        size: data.len(),
        origin_size: blob.len(),
        dimensions: None,
        quality: None,
        page_count: Some(page_count),
        data,
    })
}

// ── JPG → PDF ────────────────────────────────────────────────────────────

/// Lay out each image on its own page of a new PDF.
pub async fn images_to_pdf(
    images: Vec<Blob>,
    params: ConversionParameters,
) -> Result<ConversionResult, ConvertError> {
    tokio::task::spawn_blocking(move || images_to_pdf_blocking(&images, &params))
        .await
        .map_err(|e| ConvertError::Internal(format!("JPG to PDF task panicked: {}", e)))?
}

/// Blocking implementation of [`images_to_pdf`].
pub fn images_to_pdf_blocking(
    images: &[Blob],
    params: &ConversionParameters,
) -> Result<ConversionResult, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::NotEnoughInputs {
            required: 1,
            got: 0,
        });
    }

    let (page_w, page_h) = page_dimensions(params.page_size, params.orientation);
    let pdfium = engine::bind()?;
    let mut doc = pdfium.create_new_pdf().map_err(build_err)?;

    for blob in images {
        let img = encode::decode_image(blob.bytes()).map_err(|e| ConvertError::DecodeFailed {
            name: blob.name.clone(),
            detail: e.to_string(),
        })?;
        let (img_w, img_h) = img.dimensions();
        let p = fit_image(page_w, page_h, params.margin_mm, img_w, img_h);
        debug!(
            "Placing '{}' at ({:.1}, {:.1}) mm, {:.1}x{:.1} mm",
            blob.name, p.x, p.y, p.width, p.height
        );

        let mut page = doc
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(
                PdfPoints::new(page_w * POINTS_PER_MM),
                PdfPoints::new(page_h * POINTS_PER_MM),
            ))
            .map_err(build_err)?;

        // PDF user space grows upwards from the bottom-left corner.
        let bottom = page_h - p.y - p.height;
        page.objects_mut()
            .create_image_object(
                PdfPoints::new(p.x * POINTS_PER_MM),
                PdfPoints::new(bottom * POINTS_PER_MM),
                &img,
                Some(PdfPoints::new(p.width * POINTS_PER_MM)),
                Some(PdfPoints::new(p.height * POINTS_PER_MM)),
            )
            .map_err(build_err)?;
    }

    let page_count = doc.pages().len() as usize;
    let data = doc.save_to_bytes().map_err(build_err)?;
    info!("Built {}-page PDF from {} images", page_count, images.len());

    Ok(ConversionResult {
        file_name: Tool::JpgToPdf.output_name("", None, None),
        mime: "application/pdf".to_string(),
        size: data.len(),
        origin_size: images.iter().map(Blob::len).sum(),
        dimensions: None,
        quality: None,
        page_count: Some(page_count),
        data,
    })
}

/// Page `(width, height)` in millimetres.
pub fn page_dimensions(size: PageSize, orientation: Orientation) -> (f32, f32) {
    size.dimensions_mm(orientation)
}

// ── Inspect ──────────────────────────────────────────────────────────────

/// Read page count and metadata without transforming anything.
pub async fn inspect(blob: Blob, password: Option<String>) -> Result<DocumentInfo, ConvertError> {
    tokio::task::spawn_blocking(move || inspect_blocking(&blob, password.as_deref()))
        .await
        .map_err(|e| ConvertError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Blocking implementation of [`inspect`].
pub fn inspect_blocking(blob: &Blob, password: Option<&str>) -> Result<DocumentInfo, ConvertError> {
    input::ensure_pdf(blob)?;
    let pdfium = engine::bind()?;
    let document = engine::load_document(&pdfium, &blob.name, blob.bytes(), password)?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentInfo {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn assert_fits_and_centred(page_w: f32, page_h: f32, margin: f32, img_w: u32, img_h: u32) {
        let p = fit_image(page_w, page_h, margin, img_w, img_h);
        assert!(p.width <= page_w - 2.0 * margin + EPS, "{p:?}");
        assert!(p.height <= page_h - 2.0 * margin + EPS, "{p:?}");
        // equal leftovers on both sides of each axis
        assert!((p.x - (page_w - p.x - p.width)).abs() < EPS, "{p:?}");
        assert!((p.y - (page_h - p.y - p.height)).abs() < EPS, "{p:?}");
        // aspect ratio preserved
        let ratio = img_w as f32 / img_h as f32;
        assert!((p.width / p.height - ratio).abs() < 1e-2, "{p:?}");
    }

    #[test]
    fn landscape_image_fills_width_on_a4_portrait() {
        let p = fit_image(210.0, 297.0, 0.0, 2000, 1000);
        assert!((p.width - 210.0).abs() < EPS);
        assert!((p.height - 105.0).abs() < EPS);
        assert!((p.x).abs() < EPS);
        assert!((p.y - 96.0).abs() < EPS);
    }

    #[test]
    fn tall_image_shrinks_to_usable_height() {
        let p = fit_image(210.0, 297.0, 10.0, 1000, 4000);
        assert!((p.height - 277.0).abs() < EPS);
        assert!((p.width - 69.25).abs() < EPS);
    }

    #[test]
    fn placement_always_fits_and_is_centred() {
        for (w, h) in [(210.0, 297.0), (297.0, 210.0), (215.9, 279.4), (279.4, 215.9)] {
            for margin in [0.0, 5.0, 25.0, 50.0] {
                for (iw, ih) in [(1, 1), (640, 480), (480, 640), (4000, 300), (300, 4000)] {
                    assert_fits_and_centred(w, h, margin, iw, ih);
                }
            }
        }
    }

    #[test]
    fn letter_landscape_dimensions() {
        let (w, h) = page_dimensions(PageSize::Letter, Orientation::Landscape);
        assert!((w * POINTS_PER_MM - 792.0).abs() < 0.01);
        assert!((h * POINTS_PER_MM - 612.0).abs() < 0.01);
    }

    #[test]
    fn merge_needs_two_inputs() {
        let one = vec![Blob::new("a.pdf", "application/pdf", b"%PDF-1.4".to_vec())];
        let err = merge_blocking(&one, None).unwrap_err();
        assert!(matches!(err, ConvertError::NotEnoughInputs { required: 2, got: 1 }));
    }

    #[test]
    fn merge_rejects_non_pdf_before_binding() {
        let inputs = vec![
            Blob::new("a.pdf", "application/pdf", b"%PDF-1.4".to_vec()),
            Blob::new("b.pdf", "application/pdf", b"not a pdf".to_vec()),
        ];
        let err = merge_blocking(&inputs, None).unwrap_err();
        assert!(matches!(err, ConvertError::NotAPdf { .. }));
    }

    #[test]
    fn images_to_pdf_needs_an_image() {
        let err = images_to_pdf_blocking(&[], &ConversionParameters::default()).unwrap_err();
        assert!(matches!(err, ConvertError::NotEnoughInputs { required: 1, .. }));
    }
}
