use crate::error::{ConvertError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Download a URL to a local file with progress indication.
///
/// Streams the body to disk in chunks; no resume, no retry. Any transport
/// or HTTP-status failure surfaces as `ConvertError::Network`.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    tracing::info!("Downloading {url}");

    let response = reqwest::blocking::Client::new()
        .get(url)
        .send()
        .map_err(|e| ConvertError::Network(format!("Request failed: {e}")))?
        .error_for_status()
        .map_err(|e| ConvertError::Network(format!("Server returned error: {e}")))?;

    let total_size = response.content_length();
    let pb = match total_size {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let mut file = fs::File::create(dest)?;
    let mut reader = response;
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| ConvertError::Network(format!("Download interrupted: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }

    pb.finish_and_clear();
    tracing::info!("Downloaded {} bytes to {}", pb.position(), dest.display());

    Ok(())
}
