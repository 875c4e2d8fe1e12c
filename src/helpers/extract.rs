//! Filtered zip extraction
//!
//! Only browser-relevant files leave the archive. For every entry:
//!
//! 1. the first `strip_components` path segments are removed (the upstream
//!    zip nests everything under a versioned root directory),
//! 2. the remaining path must contain the marker (`jswasm`),
//! 3. its extension must be in the allow-set (`wasm`, `mjs`, `js`).
//!
//! Entries failing any step are skipped silently, as are directory entries
//! and paths that would escape the destination.

use crate::core::error::{FetchError, Result};
use crate::core::output;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

/// Which entries to materialize and how to rename them
#[derive(Debug, Clone)]
pub struct ExtractFilter {
    pub marker: String,
    /// Without leading dot, matched case-sensitively
    pub extensions: Vec<String>,
    pub strip_components: usize,
}

impl ExtractFilter {
    /// True if a (stripped, `/`-separated) path passes both predicates
    pub fn matches(&self, rel_path: &str) -> bool {
        rel_path.contains(&self.marker) && self.has_allowed_extension(rel_path)
    }

    fn has_allowed_extension(&self, rel_path: &str) -> bool {
        Path::new(rel_path)
            .extension()
            .map(|e| e.to_string_lossy())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed.as_str() == ext))
    }
}

/// A file written to the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Path relative to the destination, `/`-separated
    pub path: String,
    pub size: u64,
}

/// Drop the first `n` segments of an already-sanitized relative path.
///
/// Returns `None` when nothing is left.
pub fn strip_path(path: &Path, n: usize) -> Option<PathBuf> {
    let rest: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(n)
        .collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Extract the entries of a zip archive that pass `filter` into `dest`.
///
/// Returns the materialized files in archive order.
pub fn extract_filtered(
    archive_path: &Path,
    dest: &Path,
    filter: &ExtractFilter,
) -> Result<Vec<ExtractedFile>> {
    let file = File::open(archive_path)
        .map_err(|e| FetchError::io(format!("cannot open {}", archive_path.display()), e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| FetchError::MalformedData(format!("zip read error: {}", e)))?;

    std::fs::create_dir_all(dest)
        .map_err(|e| FetchError::io(format!("cannot create directory {}", dest.display()), e))?;

    let pb = output::spinner(&format!("extracting into {}", dest.display()));
    let result = extract_entries(&mut archive, dest, filter);
    pb.finish_and_clear();
    result
}

fn extract_entries(
    archive: &mut zip::ZipArchive<File>,
    dest: &Path,
    filter: &ExtractFilter,
) -> Result<Vec<ExtractedFile>> {
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| FetchError::MalformedData(format!("zip entry error: {}", e)))?;

        if entry.is_dir() {
            continue;
        }

        // Skip entries with unsafe paths
        let Some(enclosed) = entry.enclosed_name() else {
            continue;
        };
        let Some(rel) = strip_path(&enclosed, filter.strip_components) else {
            continue;
        };
        let rel_str = to_slash_path(&rel);
        if !filter.matches(&rel_str) {
            continue;
        }

        let outpath = dest.join(&rel);
        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FetchError::io(format!("cannot create directory {}", parent.display()), e)
            })?;
        }

        let mut outfile = File::create(&outpath)
            .map_err(|e| FetchError::io(format!("cannot create {}", outpath.display()), e))?;
        let size = std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| FetchError::io(format!("write error for {}", outpath.display()), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }

        extracted.push(ExtractedFile {
            path: rel_str,
            size,
        });
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use std::io::Write;
    use tempfile::TempDir;

    fn default_filter() -> ExtractFilter {
        ExtractFilter {
            marker: "jswasm".into(),
            extensions: vec!["mjs".into(), "wasm".into(), "js".into()],
            strip_components: 1,
        }
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, body) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(body).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_filter_predicates() {
        let f = default_filter();
        assert!(f.matches("jswasm/sqlite3.wasm"));
        assert!(f.matches("jswasm/sqlite3.mjs"));
        assert!(f.matches("jswasm/sqlite3-opfs-async-proxy.js"));
        assert!(!f.matches("jswasm/SQLITE3.WASM"));
        assert!(!f.matches("jswasm/sqlite3.Mjs"));
        assert!(!f.matches("jswasm/README.txt"));
        assert!(!f.matches("jswasm/sqlite3.mjs.map"));
        assert!(!f.matches("common/sqlite3.js"));
        assert!(!f.matches("jswasm/noext"));
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(
            strip_path(Path::new("foo/jswasm/a.wasm"), 1),
            Some(PathBuf::from("jswasm/a.wasm"))
        );
        assert_eq!(
            strip_path(Path::new("foo/jswasm/a.wasm"), 0),
            Some(PathBuf::from("foo/jswasm/a.wasm"))
        );
        assert_eq!(strip_path(Path::new("top.wasm"), 1), None);
    }

    #[test]
    fn test_extract_only_matching_entries() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("a.zip");
        write_zip(
            &archive,
            &[
                ("foo/", b""),
                ("foo/jswasm/", b""),
                ("foo/jswasm/a.wasm", b"\0asm"),
                ("foo/jswasm/b.mjs", b"export {}"),
                ("foo/jswasm/notes.txt", b"skip"),
                ("foo/other/c.txt", b"skip"),
                ("foo/other/d.js", b"skip"),
            ],
        );

        let dest = dir.path().join("out");
        let files = extract_filtered(&archive, &dest, &default_filter()).unwrap();

        assert_eq!(
            files,
            vec![
                ExtractedFile {
                    path: "jswasm/a.wasm".into(),
                    size: 4
                },
                ExtractedFile {
                    path: "jswasm/b.mjs".into(),
                    size: 9
                },
            ]
        );
        assert_eq!(std::fs::read(dest.join("jswasm/a.wasm")).unwrap(), b"\0asm");
        assert!(dest.join("jswasm/b.mjs").exists());
        assert!(!dest.join("jswasm/notes.txt").exists());
        assert!(!dest.join("other").exists());
        assert!(!dest.join("foo").exists());
    }

    #[test]
    fn test_extract_skips_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("a.zip");
        write_zip(
            &archive,
            &[
                ("foo/../../jswasm/evil.js", b"bad"),
                ("foo/jswasm/good.js", b"ok"),
            ],
        );

        let dest = dir.path().join("out");
        let files = extract_filtered(&archive, &dest, &default_filter()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "jswasm/good.js");
        assert!(!dir.path().join("jswasm").exists());
    }

    #[test]
    fn test_not_a_zip_is_malformed() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("a.zip");
        std::fs::write(&archive, b"<html>not a zip</html>").unwrap();

        let err = extract_filtered(&archive, &dir.path().join("out"), &default_filter())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
    }

    #[test]
    fn test_missing_archive_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = extract_filtered(
            &dir.path().join("nope.zip"),
            &dir.path().join("out"),
            &default_filter(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
