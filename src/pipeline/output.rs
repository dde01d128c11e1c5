//! Output delivery: write artifacts under their download names.
//!
//! Writes are atomic. Bytes go to a temp file in the destination directory
//! which is then renamed over the final path, so a reader never sees a
//! half-written file and an interrupted run leaves nothing behind.

use crate::error::ConvertError;
use crate::output::TransformOutput;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `bytes` to `dir/name`, creating `dir` if needed.
pub async fn write_output(dir: impl AsRef<Path>, name: &str, bytes: Vec<u8>) -> Result<PathBuf, ConvertError> {
    let dir = dir.as_ref().to_path_buf();
    let name = name.to_string();
    tokio::task::spawn_blocking(move || write_output_blocking(&dir, &name, &bytes))
        .await
        .map_err(|e| ConvertError::Internal(format!("Write task panicked: {}", e)))?
}

/// Blocking implementation of [`write_output`].
pub fn write_output_blocking(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ConvertError> {
    let path = dir.join(sanitise_name(name));
    let fail = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(fail)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.flush().map_err(fail)?;
    tmp.persist(&path).map_err(|e| fail(e.error))?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Write every artifact of `output` into `dir`; PDF→JPG pages become
/// `page-{n}.jpg`.
pub async fn deliver(dir: impl AsRef<Path>, output: &TransformOutput) -> Result<Vec<PathBuf>, ConvertError> {
    let dir = dir.as_ref();
    match output {
        TransformOutput::Single(result) => {
            Ok(vec![write_output(dir, &result.file_name, result.data.clone()).await?])
        }
        TransformOutput::Pages(pages) => {
            let mut written = Vec::with_capacity(pages.len());
            for page in pages {
                written.push(write_output(dir, &page.file_name(), page.jpeg.clone()).await?);
            }
            Ok(written)
        }
    }
}

/// Keep only the final path component so a crafted name cannot escape `dir`.
fn sanitise_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "output".to_string())
}
