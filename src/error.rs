//! Error types for the edgequake-fileconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the transform cannot produce an artifact
//!   (undecodable image, corrupt PDF, invalid page range, too few inputs).
//!   Returned as `Err(ConvertError)` from every conversion entry point and
//!   reported per item by [`crate::workspace::Workspace`].
//!
//! * [`PageError`] — **Non-fatal**: a single page failed to rasterise while
//!   the others are fine. Only the streaming API
//!   ([`crate::stream::pdf_to_jpg_stream`]) surfaces it; the batch API turns
//!   any page failure into a fatal [`ConvertError::RasterisationFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-fileconv library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The declared type is not accepted by the tool.
    #[error("'{name}' has type '{mime}', which {tool} does not accept")]
    UnsupportedType {
        name: String,
        mime: String,
        tool: String,
    },

    /// The bytes could not be decoded as an image.
    #[error("Could not decode image '{name}': {detail}")]
    DecodeFailed { name: String, detail: String },

    /// Encoding the output surface failed.
    #[error("Could not encode {mime} output: {detail}")]
    EncodeFailed { mime: String, detail: String },

    /// The bytes are not a PDF at all.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Merge needs at least two documents.
    #[error("Please select at least {required} PDF files to merge (got {got})")]
    NotEnoughInputs { required: usize, got: usize },

    /// The page range does not select any page of the document.
    #[error("Invalid page range '{range}' (document has {total} pages)")]
    InvalidRange { range: String, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Building or saving the output document failed.
    #[error("Could not build PDF document: {0}")]
    DocumentBuildFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium, place it next to the binary, or set\n\
PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Task errors ───────────────────────────────────────────────────────
    /// The work was superseded, or its consumer went away, before completing.
    #[error("{0} was cancelled")]
    Cancelled(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// `true` for errors caused by the user's input or settings rather than
    /// by the environment (these map to a blocking alert in an interactive UI).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConvertError::NotEnoughInputs { .. }
                | ConvertError::InvalidRange { .. }
                | ConvertError::InvalidConfig(_)
                | ConvertError::UnsupportedType { .. }
        )
    }
}

/// A non-fatal error for a single rasterised page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered surface could not be encoded as JPEG.
    #[error("Page {page}: JPEG encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } | PageError::EncodeFailed { page, .. } => *page,
        }
    }
}
