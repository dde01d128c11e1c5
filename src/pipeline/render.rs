//! PDF rasterisation: render every page to a JPEG via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, so a long document never stalls
//! the Tokio worker threads.
//!
//! Pages render at a fixed 2× scale and encode at JPEG quality 0.9.

use crate::config::OutputFormat;
use crate::engine;
use crate::error::{ConvertError, PageError};
use crate::output::{Blob, RenderedPage};
use crate::pipeline::{encode, input};
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Upscaling factor applied to every page.
pub const RENDER_SCALE: f32 = 2.0;

/// JPEG quality for rendered pages.
pub const PAGE_JPEG_QUALITY: f32 = 0.9;

/// Rasterise all pages of a PDF.
///
/// All-or-nothing: a parse failure or any page failure fails the whole call.
/// Use [`crate::stream::pdf_to_jpg_stream`] to keep the pages that succeed.
pub async fn pdf_to_jpg(blob: Blob, password: Option<String>) -> Result<Vec<RenderedPage>, ConvertError> {
    tokio::task::spawn_blocking(move || -> Result<Vec<RenderedPage>, ConvertError> {
        let mut pages = Vec::new();
        render_each_blocking(&blob, password.as_deref(), |_, result| {
            pages.push(result.map_err(|e| ConvertError::RasterisationFailed {
                page: e.page(),
                detail: e.to_string(),
            })?);
            Ok(())
        })?;
        Ok(pages)
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

/// Render pages in order, handing each result to `on_page` together with
/// the document's page count.
///
/// Returning `Err` from `on_page` stops the loop and propagates the error.
pub fn render_each_blocking<F>(
    blob: &Blob,
    password: Option<&str>,
    mut on_page: F,
) -> Result<usize, ConvertError>
where
    F: FnMut(usize, Result<RenderedPage, PageError>) -> Result<(), ConvertError>,
{
    input::ensure_pdf(blob)?;
    let pdfium = engine::bind()?;
    let document = engine::load_document(&pdfium, &blob.name, blob.bytes(), password)?;

    let total_pages = document.pages().len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);

    for (idx, page) in document.pages().iter().enumerate() {
        let page_num = idx + 1;
        on_page(total_pages, render_page(&page, page_num, &render_config))?;
    }

    Ok(total_pages)
}

fn render_page(
    page: &PdfPage,
    page_num: usize,
    render_config: &PdfRenderConfig,
) -> Result<RenderedPage, PageError> {
    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );

    let jpeg = encode::encode_image(&image, OutputFormat::Jpeg, PAGE_JPEG_QUALITY).map_err(|e| {
        PageError::EncodeFailed {
            page: page_num,
            detail: e.to_string(),
        }
    })?;

    Ok(RenderedPage {
        page_num,
        width: image.width(),
        height: image.height(),
        jpeg,
    })
}
