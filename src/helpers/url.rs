//! Download URL builder
//!
//! The archive URL is a fixed template with three placeholders:
//! `{version}`, `{sqlite_version}` and `{repo}`. Anything else in braces is
//! left as written.

use crate::core::error::{FetchError, Result};

/// Values interpolated into the download template
#[derive(Debug, Clone, Copy)]
pub struct UrlVars<'a> {
    pub version: &'a str,
    pub sqlite_version: &'a str,
    pub repo: &'a str,
}

/// Build the archive URL for a resolved version.
///
/// Pure: the same inputs always give the same URL.
///
/// # Example
/// ```
/// use sqlite_wasm_fetch::helpers::url::{build_download_url, UrlVars};
///
/// let url = build_download_url(
///     "https://github.com/{repo}/releases/download/v{version}/sqlite3mc-{version}-sqlite-{sqlite_version}-wasm.zip",
///     UrlVars { version: "2.2.4", sqlite_version: "3.50.4", repo: "utelle/SQLite3MultipleCiphers" },
/// ).unwrap();
/// assert_eq!(
///     url,
///     "https://github.com/utelle/SQLite3MultipleCiphers/releases/download/v2.2.4/sqlite3mc-2.2.4-sqlite-3.50.4-wasm.zip"
/// );
/// ```
pub fn build_download_url(template: &str, vars: UrlVars<'_>) -> Result<String> {
    if vars.version.trim().is_empty() {
        return Err(FetchError::Input(
            "cannot build download URL without a resolved version".to_string(),
        ));
    }

    let url = template
        .replace("{version}", vars.version)
        .replace("{sqlite_version}", vars.sqlite_version)
        .replace("{repo}", vars.repo);

    validate_url_scheme(&url)?;
    Ok(url)
}

/// Only plain HTTP(S) downloads are supported
pub fn validate_url_scheme(url: &str) -> Result<()> {
    let lower = url.to_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        return Ok(());
    }
    Err(FetchError::Input(format!(
        "URL must use http:// or https://\n  got: {}",
        url
    )))
}

/// Last path segment of a URL, without query or fragment.
///
/// Falls back to "download" when the URL has no usable file name.
pub fn extract_filename(url: &str) -> String {
    let clean_url = url.split('?').next().unwrap_or(url);
    let clean_url = clean_url.split('#').next().unwrap_or(clean_url);

    clean_url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .map(str::to_owned)
        .unwrap_or_else(|| "download".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{DEFAULT_REPO, DEFAULT_SQLITE_VERSION, DEFAULT_URL_TEMPLATE};
    use crate::core::error::ErrorKind;

    fn vars(version: &str) -> UrlVars<'_> {
        UrlVars {
            version,
            sqlite_version: DEFAULT_SQLITE_VERSION,
            repo: DEFAULT_REPO,
        }
    }

    #[test]
    fn test_default_template() {
        let url = build_download_url(DEFAULT_URL_TEMPLATE, vars("4.2.0")).unwrap();
        assert_eq!(
            url,
            "https://github.com/utelle/SQLite3MultipleCiphers/releases/download/v4.2.0/sqlite3mc-4.2.0-sqlite-3.50.4-wasm.zip"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = build_download_url(DEFAULT_URL_TEMPLATE, vars("2.2.4")).unwrap();
        let b = build_download_url(DEFAULT_URL_TEMPLATE, vars("2.2.4")).unwrap();
        assert_eq!(a, b);
        let c = build_download_url(DEFAULT_URL_TEMPLATE, vars("2.2.5")).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_empty_version_is_input_error() {
        let err = build_download_url(DEFAULT_URL_TEMPLATE, vars("")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        let err = build_download_url(DEFAULT_URL_TEMPLATE, vars("  ")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_unknown_placeholder_left_alone() {
        let url = build_download_url("http://h/{version}/{other}.zip", vars("1.0")).unwrap();
        assert_eq!(url, "http://h/1.0/{other}.zip");
    }

    #[test]
    fn test_non_http_template_rejected() {
        let err = build_download_url("file:///tmp/{version}.zip", vars("1.0")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("https://example.com/dl/sqlite3mc-2.2.4-wasm.zip?raw=1#x"),
            "sqlite3mc-2.2.4-wasm.zip"
        );
        assert_eq!(extract_filename("https://example.com/"), "download");
        assert_eq!(extract_filename("https://"), "download");
    }
}
