//! Archive fetcher
//!
//! Streams the archive into a scoped temporary file. The file is deleted
//! when the returned [`DownloadedArchive`] is dropped, whichever way the
//! pipeline exits.

use super::http::{HttpClient, network_error};
use super::url::extract_filename;
use crate::core::error::{FetchError, Result};
use crate::core::output;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A fetched archive living in a temporary file
#[derive(Debug)]
pub struct DownloadedArchive {
    file: NamedTempFile,
    pub filename: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the body
    pub sha256: String,
}

impl DownloadedArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the temporary file now instead of on drop
    pub fn remove(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file
            .close()
            .map_err(|e| FetchError::io(format!("cannot remove {}", path.display()), e))
    }
}

/// Download `url` into a temporary file in `work_dir` (system temp dir if `None`).
///
/// Fails with `Input` for an empty URL, `Network` for a non-success status
/// or transport failure, and `MalformedData` when `expected_sha256` is given
/// and does not match.
pub fn download_archive(
    http: &HttpClient,
    url: &str,
    expected_sha256: Option<&str>,
    work_dir: Option<&Path>,
) -> Result<DownloadedArchive> {
    if url.trim().is_empty() {
        return Err(FetchError::Input(
            "Unable to find SQLite Wasm download link".to_string(),
        ));
    }

    let filename = extract_filename(url);
    let pb = output::spinner(&format!("downloading {}", filename));

    let response = match http.get(url).call() {
        Ok(r) => r,
        Err(e) => {
            pb.finish_and_clear();
            return Err(network_error(url, e));
        }
    };

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        output::upgrade_to_bytes(&pb, len);
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("sqlite-wasm-").suffix(".zip");
    let created = match work_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    };
    let mut file = match created {
        Ok(f) => f,
        Err(e) => {
            pb.finish_and_clear();
            return Err(FetchError::io("cannot create temporary archive", e));
        }
    };

    let mut reader = response.into_reader();
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut size = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(n) => n,
            Err(e) => {
                pb.finish_and_clear();
                return Err(FetchError::Network(format!(
                    "read error while downloading {}: {}",
                    url, e
                )));
            }
        };

        if bytes_read == 0 {
            break;
        }

        let chunk = &buffer[..bytes_read];
        if let Err(e) = file.write_all(chunk) {
            pb.finish_and_clear();
            return Err(FetchError::io(
                format!("write error for {}", file.path().display()),
                e,
            ));
        }
        hasher.update(chunk);

        size += bytes_read as u64;
        pb.set_position(size);
    }

    pb.finish_and_clear();

    file.flush()
        .map_err(|e| FetchError::io("cannot flush temporary archive", e))?;

    let sha256 = hex::encode(hasher.finalize());
    if let Some(expected) = expected_sha256 {
        let expected = expected.trim().to_lowercase();
        if sha256 != expected {
            return Err(FetchError::MalformedData(format!(
                "SHA256 integrity check failed for '{}'\n  expected: {}\n  got:      {}",
                filename, expected, sha256
            )));
        }
    }

    output::detail(&format!("downloaded {} ({} bytes)", filename, size));

    Ok(DownloadedArchive {
        file,
        filename,
        size,
        sha256,
    })
}
