//! Pipeline stages for the conversion tools.
//!
//! Each submodule implements one step. Stages share nothing but the
//! [`crate::output::Blob`] they pass along, so each is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ raster ───────────┐
//! input ─────┼─▶ document (pdfium) ┼──▶ output
//! (path/MIME)└─▶ render (pdfium) ──┘    (atomic write)
//!                   │
//!                encode (JPEG/PNG/WebP, data URIs)
//! ```
//!
//! 1. [`input`]    — read files, attach declared types, filter per tool
//! 2. [`raster`]   — decode, resize, re-encode; the image tools
//! 3. [`document`] — merge, split, JPG→PDF; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 4. [`render`]   — rasterise PDF pages to JPEG
//! 5. [`encode`]   — shared codecs: quality mapping, white flattening
//! 6. [`output`]   — write artifacts under their download names

pub mod document;
pub mod encode;
pub mod input;
pub mod output;
pub mod raster;
pub mod render;
