//! The conversion tools and their per-tool rules: accepted input types,
//! default parameters, and download names.

use crate::config::{ConversionParameters, OutputFormat, PageRange};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One single-purpose conversion tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// JPEG → PNG or WebP.
    JpgToPng,
    /// PNG → JPEG on a white background.
    PngToJpg,
    /// Any image → smaller JPEG.
    Compress,
    /// Any image → new pixel width, same format.
    Resize,
    /// JPEG images → one multi-page PDF.
    JpgToPdf,
    /// PDFs → one PDF.
    MergePdf,
    /// One PDF → a page range of it.
    SplitPdf,
    /// One PDF → one JPEG per page.
    PdfToJpg,
}

const JPEG_TYPES: &[&str] = &["image/jpeg", "image/jpg"];
const PNG_TYPES: &[&str] = &["image/png"];
const PDF_TYPES: &[&str] = &["application/pdf"];

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::JpgToPng,
        Tool::PngToJpg,
        Tool::Compress,
        Tool::Resize,
        Tool::JpgToPdf,
        Tool::MergePdf,
        Tool::SplitPdf,
        Tool::PdfToJpg,
    ];

    /// Whether a file of declared type `mime` can be added to this tool.
    pub fn accepts(self, mime: &str) -> bool {
        let mime = mime.trim().to_ascii_lowercase();
        match self {
            Tool::JpgToPng | Tool::JpgToPdf => JPEG_TYPES.contains(&mime.as_str()),
            Tool::PngToJpg => PNG_TYPES.contains(&mime.as_str()),
            Tool::Compress | Tool::Resize => mime.starts_with("image/"),
            Tool::MergePdf | Tool::SplitPdf | Tool::PdfToJpg => PDF_TYPES.contains(&mime.as_str()),
        }
    }

    /// Whether the tool operates on the whole working set at once rather
    /// than item by item.
    pub fn is_whole_set(self) -> bool {
        matches!(self, Tool::JpgToPdf | Tool::MergePdf)
    }

    /// Parameters a fresh tool page starts with.
    pub fn default_parameters(self) -> ConversionParameters {
        let base = ConversionParameters::default();
        match self {
            Tool::JpgToPng => ConversionParameters {
                quality: 0.8,
                output_format: Some(OutputFormat::Png),
                ..base
            },
            Tool::PngToJpg => ConversionParameters {
                quality: 0.85,
                output_format: Some(OutputFormat::Jpeg),
                ..base
            },
            Tool::Compress => ConversionParameters {
                quality: 0.53,
                output_format: Some(OutputFormat::Jpeg),
                ..base
            },
            Tool::Resize => ConversionParameters {
                quality: 0.92,
                target_width: 800,
                ..base
            },
            Tool::SplitPdf => ConversionParameters {
                page_range: PageRange::new(1, 1),
                ..base
            },
            Tool::JpgToPdf | Tool::MergePdf | Tool::PdfToJpg => base,
        }
    }

    /// Download name for a single-item output.
    ///
    /// `range` is the resolved 1-indexed page range for [`Tool::SplitPdf`];
    /// it is ignored by every other tool.
    pub fn output_name(
        self,
        original: &str,
        format: Option<OutputFormat>,
        range: Option<(usize, usize)>,
    ) -> String {
        match self {
            Tool::JpgToPng => {
                let ext = format.unwrap_or(OutputFormat::Png).extension();
                replace_extension(&RE_JPEG_EXT, original, ext)
            }
            Tool::PngToJpg => replace_extension(&RE_PNG_EXT, original, "jpg"),
            Tool::Compress => {
                let renamed = replace_extension(&RE_IMAGE_EXT, original, "jpg");
                format!("compressed-{renamed}")
            }
            Tool::Resize => format!("resized-{original}"),
            Tool::SplitPdf => {
                let (start, end) = range.unwrap_or((1, 1));
                format!("split-{start}-{end}-{original}")
            }
            Tool::MergePdf => "merged-document.pdf".to_string(),
            Tool::JpgToPdf => "converted.pdf".to_string(),
            Tool::PdfToJpg => "page-1.jpg".to_string(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::JpgToPng => "JPG to PNG",
            Tool::PngToJpg => "PNG to JPG",
            Tool::Compress => "Compress image",
            Tool::Resize => "Resize image",
            Tool::JpgToPdf => "JPG to PDF",
            Tool::MergePdf => "Merge PDF",
            Tool::SplitPdf => "Split PDF",
            Tool::PdfToJpg => "PDF to JPG",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

static RE_JPEG_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg)$").unwrap());
static RE_PNG_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.png$").unwrap());
static RE_IMAGE_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|webp|gif|bmp|tiff?)$").unwrap());

/// Swap a matching extension; names without one get the new extension appended.
fn replace_extension(re: &Regex, name: &str, ext: &str) -> String {
    if re.is_match(name) {
        re.replace(name, format!(".{ext}").as_str()).into_owned()
    } else {
        format!("{name}.{ext}")
    }
}
