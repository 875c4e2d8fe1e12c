//! Test fixtures - archives, descriptors and mock endpoints.

use sqlite_wasm_fetch::Config;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LISTING_PATH: &str = "/repos/utelle/SQLite3MultipleCiphers/releases";
pub const URL_TEMPLATE_SUFFIX: &str =
    "/download/v{version}/sqlite3mc-{version}-sqlite-{sqlite_version}-wasm.zip";

/// A descriptor the way the npm package ships it.
pub const PACKAGE_JSON: &str = r#"{
  "name": "sqlite3mc-wasm",
  "version": "0.0.1",
  "description": "SQLite3 Multiple Ciphers Wasm build for the browser",
  "type": "module",
  "files": [
    "sqlite-wasm"
  ]
}
"#;

/// Build a zip archive in memory. Names ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, body) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// The archive from the canonical scenario: two browser files, one other.
pub fn sample_archive() -> Vec<u8> {
    zip_bytes(&[
        ("foo/", b""),
        ("foo/jswasm/", b""),
        ("foo/jswasm/a.wasm", b"\0asm\x01\0\0\0"),
        ("foo/jswasm/b.mjs", b"export default {};"),
        ("foo/other/c.txt", b"not for the browser"),
    ])
}

/// Temp workspace holding the descriptor, destination and work dir.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), PACKAGE_JSON).unwrap();
        std::fs::create_dir_all(dir.path().join("work")).unwrap();
        Self { dir }
    }

    pub fn descriptor(&self) -> PathBuf {
        self.dir.path().join("package.json")
    }

    pub fn dest(&self) -> PathBuf {
        self.dir.path().join("sqlite-wasm")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    pub fn descriptor_text(&self) -> String {
        std::fs::read_to_string(self.descriptor()).unwrap()
    }

    /// Config pointing every endpoint at `server`
    pub fn config(&self, server: &MockServer) -> Config {
        Config {
            api_base: server.uri(),
            url_template: format!("{}{}", server.uri(), URL_TEMPLATE_SUFFIX),
            descriptor: self.descriptor(),
            dest: self.dest(),
            work_dir: Some(self.work_dir()),
            ..Config::default()
        }
    }
}

/// Files left in a directory (non-recursive).
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Mount the release listing.
pub async fn mount_listing(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount the archive for `version` with the given status and body.
pub async fn mount_archive(server: &MockServer, version: &str, status: u16, body: Vec<u8>) {
    let archive_path = format!(
        "/download/v{version}/sqlite3mc-{version}-sqlite-3.50.4-wasm.zip"
    );
    Mock::given(method("GET"))
        .and(path(archive_path))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
        .mount(server)
        .await;
}
