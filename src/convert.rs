//! Top-level conversion entry points.
//!
//! [`transform`] runs one per-item tool on one blob; [`merge_pdfs`] and
//! [`images_to_pdf`] consume a whole set. [`convert_batch`] runs a per-item
//! tool over many inputs with bounded concurrency, for callers that don't
//! need the bookkeeping of a [`crate::workspace::Workspace`].

use crate::config::ConversionParameters;
use crate::error::ConvertError;
use crate::output::{Blob, ConversionResult, DocumentInfo, RenderedPage, TransformOutput};
use crate::pipeline::{document, input, raster, render};
use crate::progress::ProgressCallback;
use crate::stream;
use crate::tool::Tool;
use futures::stream::{self as fstream, StreamExt};
use std::path::Path;
use tracing::{info, warn};

/// Run a per-item tool on one blob.
///
/// # Errors
/// - [`ConvertError::UnsupportedType`] when the tool does not accept the
///   blob's declared type
/// - [`ConvertError::InvalidConfig`] for whole-set tools (use
///   [`merge_pdfs`] / [`images_to_pdf`])
/// - whatever the underlying pipeline reports
pub async fn transform(
    tool: Tool,
    blob: Blob,
    params: ConversionParameters,
) -> Result<TransformOutput, ConvertError> {
    params.validate()?;
    if !tool.accepts(&blob.mime) {
        return Err(ConvertError::UnsupportedType {
            name: blob.name,
            mime: blob.mime,
            tool: tool.label().to_string(),
        });
    }

    match tool {
        Tool::JpgToPng | Tool::PngToJpg | Tool::Compress | Tool::Resize => {
            raster::transform_image(tool, blob, params)
                .await
                .map(TransformOutput::Single)
        }
        Tool::SplitPdf => document::split(blob, params)
            .await
            .map(TransformOutput::Single),
        Tool::PdfToJpg => render::pdf_to_jpg(blob, params.password)
            .await
            .map(TransformOutput::Pages),
        Tool::JpgToPdf | Tool::MergePdf => Err(ConvertError::InvalidConfig(format!(
            "{} operates on the whole set of files, not on one item",
            tool
        ))),
    }
}

/// Load `path` and run a per-item tool on it.
pub async fn transform_file(
    tool: Tool,
    path: impl AsRef<Path>,
    params: ConversionParameters,
) -> Result<TransformOutput, ConvertError> {
    let blob = input::load_file(path).await?;
    transform(tool, blob, params).await
}

/// Run a per-item tool on in-memory bytes; the type is derived from `name`.
pub async fn transform_bytes(
    tool: Tool,
    name: &str,
    bytes: &[u8],
    params: ConversionParameters,
) -> Result<TransformOutput, ConvertError> {
    let blob = Blob::new(name, input::mime_for_name(name), bytes.to_vec());
    transform(tool, blob, params).await
}

/// Synchronous wrapper around [`transform`].
///
/// Creates a temporary tokio runtime internally.
pub fn transform_sync(
    tool: Tool,
    blob: Blob,
    params: ConversionParameters,
) -> Result<TransformOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(transform(tool, blob, params))
}

/// Merge PDFs in the given order.
pub async fn merge_pdfs(
    inputs: Vec<Blob>,
    params: &ConversionParameters,
) -> Result<ConversionResult, ConvertError> {
    params.validate()?;
    let inputs = input::accept(Tool::MergePdf, inputs);
    document::merge(inputs, params.password.clone()).await
}

/// Lay out JPEG images one per page of a new PDF.
pub async fn images_to_pdf(
    images: Vec<Blob>,
    params: &ConversionParameters,
) -> Result<ConversionResult, ConvertError> {
    params.validate()?;
    let images = input::accept(Tool::JpgToPdf, images);
    document::images_to_pdf(images, params.clone()).await
}

/// Read PDF metadata without converting anything.
pub async fn inspect(path: impl AsRef<Path>, password: Option<String>) -> Result<DocumentInfo, ConvertError> {
    let blob = input::load_file(path).await?;
    document::inspect(blob, password).await
}

/// Rasterise a PDF, reporting each page to `progress`.
///
/// Same all-or-nothing contract as [`render::pdf_to_jpg`], built on the
/// streaming API so pages are reported as they finish.
pub async fn pdf_to_jpg_with_progress(
    blob: Blob,
    password: Option<String>,
    progress: &ProgressCallback,
) -> Result<Vec<RenderedPage>, ConvertError> {
    let (total_pages, mut pages_stream) = stream::pdf_to_jpg_stream(blob, password).await?;
    let mut pages = Vec::with_capacity(total_pages);

    while let Some(result) = pages_stream.next().await {
        let page = result.map_err(|e| ConvertError::RasterisationFailed {
            page: e.page(),
            detail: e.to_string(),
        })?;
        progress.on_page_rendered(page.page_num, total_pages);
        pages.push(page);
    }

    Ok(pages)
}

/// Outcome of one item of a batch.
#[derive(Debug)]
pub struct BatchItem {
    /// Position of the input in the batch.
    pub index: usize,
    /// Input file name.
    pub name: String,
    pub result: Result<TransformOutput, ConvertError>,
}

/// Run a per-item tool over every accepted input, `concurrency` at a time.
///
/// Items are independent: one failure never stops the others. Results come
/// back sorted by input position; completion order is not observable.
pub async fn convert_batch(
    tool: Tool,
    inputs: Vec<Blob>,
    params: &ConversionParameters,
    concurrency: usize,
    progress: Option<ProgressCallback>,
) -> Vec<BatchItem> {
    let inputs = input::accept(tool, inputs);
    let total = inputs.len();
    info!("{}: converting {} files", tool, total);

    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    let mut items: Vec<BatchItem> = fstream::iter(inputs.into_iter().enumerate().map(|(index, blob)| {
        let params = params.clone();
        let progress = progress.clone();
        async move {
            let name = blob.name.clone();
            if let Some(ref cb) = progress {
                cb.on_item_start(index, &name);
            }
            let result = transform(tool, blob, params).await;
            match (&result, &progress) {
                (Ok(out), Some(cb)) => cb.on_item_complete(index, &name, out.size()),
                (Err(e), Some(cb)) => cb.on_item_error(index, &name, &e.to_string()),
                _ => {}
            }
            if let Err(ref e) = result {
                warn!("{}: '{}' failed: {}", tool, name, e);
            }
            BatchItem { index, name, result }
        }
    }))
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await;

    items.sort_by_key(|item| item.index);

    let succeeded = items.iter().filter(|i| i.result.is_ok()).count();
    info!("{}: {}/{} files converted", tool, succeeded, total);
    if let Some(ref cb) = progress {
        cb.on_batch_complete(total, succeeded);
    }

    items
}
