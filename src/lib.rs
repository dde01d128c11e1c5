//! # edgequake-fileconv
//!
//! Local image and PDF conversion tools: JPG→PNG/WebP, PNG→JPG, compress,
//! resize, JPG→PDF, merge PDF, split PDF and PDF→JPG.
//!
//! Everything runs in-process. Nothing is uploaded and nothing outlives the
//! process: inputs, previews and results live in memory until their owner
//! drops them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Input     read bytes, declare type from extension, filter per tool
//!  ├─ 2. Transform image codecs (image) or documents (pdfium), spawn_blocking
//!  └─ 3. Output    download name + atomic write
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_fileconv::{transform_file, Tool, TransformOutput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let params = Tool::Compress.default_parameters();
//!     if let TransformOutput::Single(result) =
//!         transform_file(Tool::Compress, "photo.jpg", params).await?
//!     {
//!         println!("{}: {} → {} bytes", result.file_name, result.origin_size, result.size);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For an interactive working set with previews and cancellable,
//! restartable transforms, see [`Workspace`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `fileconv` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-fileconv = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDFium
//!
//! The PDF tools need a PDFium shared library at runtime; see [`engine`].
//! The image tools are pure Rust and work without it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod tool;
pub mod workspace;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CompressionMode, ConversionParameters, ConversionParametersBuilder, Orientation, OutputFormat, PageRange,
    PageSize,
};
pub use convert::{
    convert_batch, images_to_pdf, inspect, merge_pdfs, pdf_to_jpg_with_progress, transform, transform_bytes,
    transform_file, transform_sync, BatchItem,
};
pub use error::{ConvertError, PageError};
pub use output::{Blob, ConversionResult, DocumentInfo, RenderedPage, TransformOutput};
pub use pipeline::output::{deliver, write_output};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{pdf_to_jpg_stream, PageStream};
pub use tool::Tool;
pub use workspace::{ItemEvent, ItemFailure, ItemId, PendingItem, PreviewHandle, PreviewRegistry, Workspace};
