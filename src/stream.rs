//! Streaming rasterisation: emit pages as they are rendered.
//!
//! Unlike the batch [`crate::pipeline::render::pdf_to_jpg`], which fails the
//! whole document when one page fails, [`pdf_to_jpg_stream`] yields one
//! `Result<RenderedPage, PageError>` per page, so a caller can keep the good
//! pages and report the bad ones. Pages arrive in page order.
//!
//! Dropping the stream stops rendering after the page in flight.

use crate::error::{ConvertError, PageError};
use crate::output::{Blob, RenderedPage};
use crate::pipeline::render;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<RenderedPage, PageError>> + Send>>;

/// Pages buffered between the renderer and a slow consumer.
const CHANNEL_CAPACITY: usize = 4;

/// Rasterise a PDF, streaming pages as they are ready.
///
/// # Returns
/// - `Ok((total_pages, PageStream))` once the document has been opened
/// - `Err(ConvertError)` — fatal error (not a PDF, corrupt, password, no pdfium)
pub async fn pdf_to_jpg_stream(
    blob: Blob,
    password: Option<String>,
) -> Result<(usize, PageStream), ConvertError> {
    info!("Starting streaming rasterisation: {}", blob.name);

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (opened_tx, opened_rx) = oneshot::channel::<Result<usize, ConvertError>>();

    tokio::task::spawn_blocking(move || {
        let mut opened = Some(opened_tx);
        let outcome = render::render_each_blocking(&blob, password.as_deref(), |total, page| {
            if let Some(signal) = opened.take() {
                let _ = signal.send(Ok(total));
            }
            tx.blocking_send(page)
                .map_err(|_| ConvertError::Cancelled(format!("rasterising '{}'", blob.name)))
        });

        match (opened.take(), outcome) {
            // Failed (or finished an empty document) before the first page.
            (Some(signal), outcome) => {
                let _ = signal.send(outcome);
            }
            (None, Err(e)) => debug!("Streaming rasterisation stopped: {}", e),
            (None, Ok(total)) => debug!("Streamed {} pages", total),
        }
    });

    let total_pages = opened_rx
        .await
        .map_err(|_| ConvertError::Internal("Render task ended without reporting".into()))??;

    Ok((total_pages, Box::pin(ReceiverStream::new(rx))))
}
