//! Input acquisition: read user-selected files and keep the ones a tool
//! accepts.
//!
//! The declared MIME type comes from the file extension, the same way a
//! browser file picker labels a `File`. Content is only sniffed later, when
//! a decoder actually needs it, so a mislabelled file fails at transform time
//! with a decode error rather than at selection time.

use crate::error::ConvertError;
use crate::output::Blob;
use crate::tool::Tool;
use std::path::Path;
use tracing::debug;

/// Declared MIME type for a file name, based on its extension.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Read a local file into a [`Blob`].
pub async fn load_file(path: impl AsRef<Path>) -> Result<Blob, ConvertError> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    let mime = mime_for_name(&name);
    debug!("Loaded {} ({}, {} bytes)", path.display(), mime, data.len());

    Ok(Blob::new(name, mime, data))
}

/// Keep only the files `tool` accepts, preserving their order.
///
/// Rejected files are dropped without an error.
pub fn accept(tool: Tool, files: impl IntoIterator<Item = Blob>) -> Vec<Blob> {
    files
        .into_iter()
        .filter(|f| {
            let ok = tool.accepts(&f.mime);
            if !ok {
                debug!("{}: ignoring '{}' of type {}", tool, f.name, f.mime);
            }
            ok
        })
        .collect()
}

/// Verify the PDF magic bytes (`%PDF`) before handing bytes to pdfium.
pub fn ensure_pdf(blob: &Blob) -> Result<(), ConvertError> {
    let bytes = blob.bytes();
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(ConvertError::NotAPdf {
            name: blob.name.clone(),
            magic,
        });
    }
    Ok(())
}
