//! Version metadata updater
//!
//! The descriptor is a JSON document (normally `package.json`) whose
//! `version` field mirrors the upstream release. Updating is split in two:
//! [`with_version`] is a pure transformation of the parsed document, and
//! [`write_descriptor`] persists it. Key order and every other field are
//! kept; output is 2-space pretty JSON with a trailing newline.

use crate::core::error::{FetchError, Result};
use crate::core::output;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

/// Parse descriptor text. `origin` is only used in messages.
pub fn parse_descriptor(text: &str, origin: &Path) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| FetchError::Io(format!("cannot parse {}: {}", origin.display(), e)))
}

/// Read and parse a descriptor file
pub fn read_descriptor(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| FetchError::io(format!("cannot read {}", path.display()), e))?;
    parse_descriptor(&text, path)
}

/// Current `version` field, if it is a string
pub fn current_version(descriptor: &Value) -> Option<&str> {
    descriptor.get("version").and_then(Value::as_str)
}

/// Return `descriptor` with only its `version` field replaced.
///
/// An existing `version` key keeps its position; a missing one is appended.
pub fn with_version(descriptor: Value, version: &str) -> Result<Value> {
    match descriptor {
        Value::Object(mut map) => {
            map.insert("version".to_string(), Value::String(version.to_string()));
            Ok(Value::Object(map))
        }
        other => Err(FetchError::MalformedData(format!(
            "descriptor must be a JSON object, found {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize the way `JSON.stringify(doc, null, 2) + "\n"` does
pub fn render_descriptor(descriptor: &Value) -> Result<String> {
    let mut text = serde_json::to_string_pretty(descriptor)
        .map_err(|e| FetchError::MalformedData(format!("cannot serialize descriptor: {}", e)))?;
    text.push('\n');
    Ok(text)
}

/// Write the full descriptor back to `path`
pub fn write_descriptor(path: &Path, descriptor: &Value) -> Result<()> {
    let text = render_descriptor(descriptor)?;
    write_bytes(path, text.as_bytes())
}

/// Replace `path` with `bytes` through a sibling temp file.
///
/// A crash can leave the temp file behind but never a half-written target.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| FetchError::io(format!("cannot create temp file in {}", dir.display()), e))?;
    tmp.write_all(bytes)
        .map_err(|e| FetchError::io(format!("cannot write {}", path.display()), e))?;

    // Temp files are created 0600; keep the target's mode
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| FetchError::io(format!("cannot set permissions on {}", path.display()), e))?;
    }

    tmp.persist(path)
        .map_err(|e| FetchError::io(format!("cannot replace {}", path.display()), e.error))?;
    Ok(())
}

/// Read, update and rewrite the descriptor at `path`.
///
/// Returns the previous version, if any. Failures are logged before being
/// returned so the caller can abort.
pub fn update_version(path: &Path, version: &str) -> Result<Option<String>> {
    let result = read_descriptor(path).and_then(|doc| {
        let previous = current_version(&doc).map(str::to_owned);
        write_descriptor(path, &with_version(doc, version)?)?;
        Ok(previous)
    });

    match &result {
        Ok(_) => output::detail(&format!(
            "updated {} version to: {}",
            path.display(),
            version
        )),
        Err(e) => output::error(&format!("Failed to update {}: {}", path.display(), e)),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use serde_json::json;
    use tempfile::TempDir;

    const PACKAGE_JSON: &str = r#"{
  "name": "@example/sqlite3mc-wasm",
  "version": "2.2.3",
  "type": "module",
  "files": [
    "sqlite-wasm"
  ],
  "scripts": {
    "build": "sqlite-wasm-fetch"
  }
}
"#;

    #[test]
    fn test_with_version_replaces_only_version() {
        let doc = parse_descriptor(PACKAGE_JSON, Path::new("package.json")).unwrap();
        let updated = with_version(doc.clone(), "2.2.4").unwrap();

        assert_eq!(current_version(&updated), Some("2.2.4"));
        let (mut a, mut b) = (doc, updated);
        a.as_object_mut().unwrap().remove("version");
        b.as_object_mut().unwrap().remove("version");
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_preserves_order_and_formatting() {
        let doc = parse_descriptor(PACKAGE_JSON, Path::new("package.json")).unwrap();
        let rendered = render_descriptor(&with_version(doc, "2.2.4").unwrap()).unwrap();
        assert_eq!(rendered, PACKAGE_JSON.replace("2.2.3", "2.2.4"));
    }

    #[test]
    fn test_with_version_appends_missing_field() {
        let updated = with_version(json!({"name": "x"}), "1.0.0").unwrap();
        let keys: Vec<_> = updated.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "version"]);
    }

    #[test]
    fn test_with_version_rejects_non_object() {
        let err = with_version(json!(["version"]), "1.0.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_update_version_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, PACKAGE_JSON).unwrap();

        let previous = update_version(&path, "2.2.4").unwrap();
        assert_eq!(previous.as_deref(), Some("2.2.3"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, PACKAGE_JSON.replace("2.2.3", "2.2.4"));
    }

    #[test]
    fn test_update_version_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = update_version(&dir.path().join("package.json"), "1.0.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_update_version_unparsable_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = update_version(&path, "1.0.0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        // Untouched on failure
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_bytes_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_bytes(&path, b"{\"a\":1}").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"a\":1}");
    }
}
