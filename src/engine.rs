//! PDFium binding.
//!
//! The document and rasterisation pipelines drive the PDFium C library
//! through `pdfium-render`. The library is looked up, first match wins, in:
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to `libpdfium.{so,dylib}` / `pdfium.dll`
//! 2. the current working directory
//! 3. the system library search path
//!
//! A fresh [`Pdfium`] is bound per blocking call; with the `thread_safe`
//! feature pdfium-render serialises access across threads internally.

use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an explicit PDFium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to the first PDFium library found.
pub fn bind() -> Result<Pdfium, ConvertError> {
    let explicit = std::env::var(PDFIUM_LIB_PATH_ENV)
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    let bindings = match explicit {
        Some(path) => {
            debug!("Binding PDFium from {}", path.display());
            Pdfium::bind_to_library(&path).map_err(|e| {
                ConvertError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
            })?
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{:?}", e)))?,
    };

    Ok(Pdfium::new(bindings))
}

/// Whether a PDFium library can be bound in this environment.
pub fn is_available() -> bool {
    bind().is_ok()
}

/// Open `bytes` as a PDF, mapping pdfium's load errors onto [`ConvertError`].
pub fn load_document<'a>(
    pdfium: &'a Pdfium,
    name: &str,
    bytes: &'a [u8],
    password: Option<&str>,
) -> Result<PdfDocument<'a>, ConvertError> {
    pdfium.load_pdf_from_byte_slice(bytes, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ConvertError::WrongPassword {
                    name: name.to_string(),
                }
            } else {
                ConvertError::PasswordRequired {
                    name: name.to_string(),
                }
            }
        } else {
            ConvertError::CorruptPdf {
                name: name.to_string(),
                detail: err_str,
            }
        }
    })
}
