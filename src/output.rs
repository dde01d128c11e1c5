//! Result types shared by every tool.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable file contents plus the metadata a file picker would attach.
///
/// Cloning is cheap: the bytes are reference-counted and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub name: String,
    pub mime: String,
    pub data: Arc<[u8]>,
}

impl Blob {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Output of one transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Suggested download name.
    pub file_name: String,
    /// MIME type of `data`.
    pub mime: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Byte length of `data`.
    pub size: usize,
    /// Byte length of the source (sum of sources for multi-input tools).
    pub origin_size: usize,
    /// Pixel dimensions for image outputs.
    pub dimensions: Option<(u32, u32)>,
    /// Quality actually used by a lossy encoder.
    pub quality: Option<f32>,
    /// Number of pages for document outputs.
    pub page_count: Option<usize>,
}

impl ConversionResult {
    /// `1 − size / origin_size`; positive when the output is smaller.
    ///
    /// `None` for an empty origin.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.origin_size == 0 {
            return None;
        }
        Some(1.0 - self.size as f64 / self.origin_size as f64)
    }
}

/// One page of a rasterised PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPage {
    /// 1-indexed page number.
    pub page_num: usize,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub jpeg: Vec<u8>,
}

impl RenderedPage {
    /// Download name for this page, e.g. `page-3.jpg`.
    pub fn file_name(&self) -> String {
        format!("page-{}.jpg", self.page_num)
    }
}

/// What a per-item transform attaches to its [`crate::workspace::PendingItem`].
#[derive(Debug, Clone)]
pub enum TransformOutput {
    /// Image conversion or PDF split.
    Single(ConversionResult),
    /// PDF→JPG.
    Pages(Vec<RenderedPage>),
}

impl TransformOutput {
    /// Total bytes held by this output.
    pub fn size(&self) -> usize {
        match self {
            TransformOutput::Single(r) => r.size,
            TransformOutput::Pages(pages) => pages.iter().map(|p| p.jpeg.len()).sum(),
        }
    }
}

/// Document information read without transforming anything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
