//! Fetches and extracts the pretrained model archive.
//!
//! The model directory acts as the cache: if it exists the whole step is
//! skipped without touching the network. There is no content verification
//! of an existing directory and no retry on failure.

pub mod download;

use crate::error::{ConvertError, Result};
use std::fs;
use std::path::Path;

/// Ensure the model directory exists, downloading and extracting the
/// release archive if it does not.
///
/// On success the temporary archive file is removed. A failure partway
/// through extraction may leave partially-extracted files behind.
pub fn ensure_model(url: &str, model_dir: &Path, archive_path: &Path) -> Result<()> {
    if model_dir.exists() {
        tracing::info!(
            "Model directory {} already exists, skipping download",
            model_dir.display()
        );
        return Ok(());
    }

    println!("📥 Downloading ONNX model...");
    download::download_file(url, archive_path)?;

    println!("📦 Unzipping...");
    extract_archive(archive_path, model_dir)?;

    fs::remove_file(archive_path)?;

    Ok(())
}

/// Extract all entries of a zip archive into `dest`.
fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ConvertError::Extraction(format!("Failed to open archive: {e}")))?;

    tracing::info!("Extracting {} entries to {}", archive.len(), dest.display());

    archive
        .extract(dest)
        .map_err(|e| ConvertError::Extraction(format!("Failed to extract archive: {e}")))?;

    Ok(())
}
