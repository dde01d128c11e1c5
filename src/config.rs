//! Configuration types for the conversion tools.
//!
//! Every user-adjustable knob lives in [`ConversionParameters`], built via its
//! [`ConversionParametersBuilder`]. Each tool reads only the subset it needs
//! (resize reads the width fields, split reads the page range, JPG→PDF reads
//! the layout fields). Parameters are copied into a transform when it starts,
//! so editing them afterwards never changes a result that already exists.

use crate::error::ConvertError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Parameters for a single transform.
///
/// # Example
/// ```rust
/// use edgequake_fileconv::{ConversionParameters, OutputFormat};
///
/// let params = ConversionParameters::builder()
///     .quality(0.7)
///     .output_format(OutputFormat::WebP)
///     .build()
///     .unwrap();
/// assert_eq!(params.quality, 0.7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionParameters {
    /// Output quality on a 0–1 scale. Range: (0, 1]. Default: 0.85.
    ///
    /// JPEG and WebP output honour it; PNG output ignores it.
    pub quality: f32,

    /// Output format for tools that offer a choice. `None` uses the tool's
    /// default target (PNG for JPG→PNG, JPEG for PNG→JPG, the source format
    /// for resize).
    pub output_format: Option<OutputFormat>,

    /// Compression strategy used by the compress tool. Default: by quality.
    pub compression: CompressionMode,

    /// Target pixel width for resize. Default: 800.
    pub target_width: u32,

    /// Target pixel height for resize when the aspect ratio is unlocked.
    /// `None` falls back to a square of `target_width`.
    pub target_height: Option<u32>,

    /// Keep the source aspect ratio when resizing. Default: true.
    pub keep_aspect_ratio: bool,

    /// Pages to extract when splitting. Default: `1-1`.
    pub page_range: PageRange,

    /// Paper size for JPG→PDF. Default: A4.
    pub page_size: PageSize,

    /// Page orientation for JPG→PDF. Default: portrait.
    pub orientation: Orientation,

    /// Margin on every side of a JPG→PDF page, in millimetres. Range: 0–50.
    pub margin_mm: f32,

    /// User password for encrypted PDF inputs.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ConversionParameters {
    fn default() -> Self {
        Self {
            quality: 0.85,
            output_format: None,
            compression: CompressionMode::default(),
            target_width: 800,
            target_height: None,
            keep_aspect_ratio: true,
            page_range: PageRange::default(),
            page_size: PageSize::default(),
            orientation: Orientation::default(),
            margin_mm: 0.0,
            password: None,
        }
    }
}

impl ConversionParameters {
    /// Create a new builder for `ConversionParameters`.
    pub fn builder() -> ConversionParametersBuilder {
        ConversionParametersBuilder {
            params: Self::default(),
        }
    }

    /// Check the constraints the builder enforces.
    ///
    /// The fields are public and the struct deserialises, so values that
    /// never went through the builder are checked again before a transform.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        if self.target_width == 0 || self.target_height == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "target dimensions must be ≥ 1".into(),
            ));
        }
        if let CompressionMode::MaxSize { max_bytes: 0 } = self.compression {
            return Err(ConvertError::InvalidConfig(
                "maximum output size must be ≥ 1 byte".into(),
            ));
        }
        if !(0.0..=50.0).contains(&self.margin_mm) {
            return Err(ConvertError::InvalidConfig(format!(
                "margin must be 0–50 mm, got {}",
                self.margin_mm
            )));
        }
        Ok(())
    }

    /// Builder seeded with existing values, for tweaking one field.
    pub fn to_builder(&self) -> ConversionParametersBuilder {
        ConversionParametersBuilder {
            params: self.clone(),
        }
    }
}

/// Builder for [`ConversionParameters`].
#[derive(Debug)]
pub struct ConversionParametersBuilder {
    params: ConversionParameters,
}

impl ConversionParametersBuilder {
    pub fn quality(mut self, q: f32) -> Self {
        self.params.quality = if q.is_nan() { 0.85 } else { q.clamp(0.01, 1.0) };
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.params.output_format = Some(format);
        self
    }

    pub fn compression(mut self, mode: CompressionMode) -> Self {
        self.params.compression = mode;
        self
    }

    pub fn target_width(mut self, px: u32) -> Self {
        self.params.target_width = px.max(1);
        self
    }

    pub fn target_height(mut self, px: u32) -> Self {
        self.params.target_height = Some(px.max(1));
        self
    }

    pub fn keep_aspect_ratio(mut self, v: bool) -> Self {
        self.params.keep_aspect_ratio = v;
        self
    }

    pub fn page_range(mut self, range: PageRange) -> Self {
        self.params.page_range = range;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.params.page_size = size;
        self
    }

    pub fn orientation(mut self, o: Orientation) -> Self {
        self.params.orientation = o;
        self
    }

    pub fn margin_mm(mut self, mm: f32) -> Self {
        self.params.margin_mm = if mm.is_nan() { 0.0 } else { mm.clamp(0.0, 50.0) };
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.params.password = Some(pwd.into());
        self
    }

    /// Build the parameters, validating constraints.
    pub fn build(self) -> Result<ConversionParameters, ConvertError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Image encodings the raster pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
}

impl OutputFormat {
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }

    /// Whether the encoder takes a quality factor. PNG is always lossless.
    pub fn honours_quality(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::WebP)
    }

    /// Whether the format can carry an alpha channel.
    pub fn has_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }

    /// Map a declared MIME type to a format, if it is one we can write.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(OutputFormat::Png),
            "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            "image/webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// How the compress tool chooses its JPEG quality.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum CompressionMode {
    /// Encode once at [`ConversionParameters::quality`]. (default)
    #[default]
    Quality,
    /// Search for the highest quality whose output fits in `max_bytes`.
    MaxSize { max_bytes: u64 },
}

/// Paper sizes offered by JPG→PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 215.9 × 279.4 mm (8.5 × 11 in).
    Letter,
}

impl PageSize {
    /// Portrait `(width, height)` in millimetres.
    pub fn portrait_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }

    /// `(width, height)` in millimetres for the given orientation.
    pub fn dimensions_mm(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.portrait_mm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Page orientation for JPG→PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// A `start-end` page range as typed by the user (1-indexed, inclusive).
///
/// Parsing keeps the raw numbers; clamping against the real page count
/// happens in [`PageRange::resolve`] once the document is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: usize,
    /// `None` (or `0`) means "same as start".
    pub end: Option<usize>,
}

impl Default for PageRange {
    fn default() -> Self {
        Self {
            start: 1,
            end: Some(1),
        }
    }
}

static RE_PAGE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d*)\s*)?$").unwrap());

impl PageRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Parse `"start-end"` or a single `"page"`.
    pub fn parse(s: &str) -> Result<Self, ConvertError> {
        let caps = RE_PAGE_RANGE.captures(s).ok_or_else(|| {
            ConvertError::InvalidConfig(format!("page range '{s}' is not of the form start-end"))
        })?;
        let start = caps[1]
            .parse::<usize>()
            .map_err(|e| ConvertError::InvalidConfig(format!("page range '{s}': {e}")))?;
        let end = match caps.get(2).map(|m| m.as_str()) {
            None | Some("") => None,
            Some(e) => Some(
                e.parse::<usize>()
                    .map_err(|err| ConvertError::InvalidConfig(format!("page range '{s}': {err}")))?,
            ),
        };
        Ok(Self { start, end })
    }

    /// Clamp against a document of `total` pages.
    ///
    /// Start is raised to at least 1, a missing end means "just start", and
    /// end is capped at the last page. Fails when start lies beyond the
    /// document or end falls before start.
    pub fn resolve(&self, total: usize) -> Result<RangeInclusive<usize>, ConvertError> {
        let start = self.start.max(1);
        let end = match self.end {
            Some(e) if e > 0 => e.min(total),
            _ => start,
        };
        if start > total || end < start {
            return Err(ConvertError::InvalidRange {
                range: self.to_string(),
                total,
            });
        }
        Ok(start..=end)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(e) => write!(f, "{}-{}", self.start, e),
            None => write!(f, "{}", self.start),
        }
    }
}
