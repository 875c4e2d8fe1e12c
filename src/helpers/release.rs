//! Release resolver
//!
//! Lists the repository's GitHub releases and turns the newest tag into a
//! bare version string. The API returns releases newest-first, so the first
//! element is taken as-is.

use super::http::{HttpClient, github_error};
use crate::core::error::{FetchError, Result};
use serde::Deserialize;

/// One entry of the GitHub release listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
}

/// Latest release with its tag already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub tag: String,
    pub version: String,
}

/// Strip the leading non-numeric prefix of a tag.
///
/// `"v4.2.0"` -> `"4.2.0"`, `"release-2.1"` -> `"2.1"`, `"4.2.0"` unchanged.
pub fn parse_version(tag: &str) -> String {
    tag.trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .to_string()
}

/// Fetch the raw listing. `None` means the API answered with `null`.
pub fn fetch_releases(http: &HttpClient, url: &str) -> Result<Option<Vec<Release>>> {
    let response = http
        .github_request(url)
        .call()
        .map_err(|e| github_error(url, e))?;

    response
        .into_json::<Option<Vec<Release>>>()
        .map_err(|e| FetchError::MalformedData(format!("Failed to parse release listing: {}", e)))
}

/// Pick the newest release and derive its version.
///
/// Fails with `NotFound` for an empty or absent listing and with
/// `MalformedData` when the first release has no usable tag.
pub fn select_latest(releases: Option<Vec<Release>>, repo: &str) -> Result<ResolvedRelease> {
    let first = releases
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NotFound(format!("No releases found for {} repository", repo)))?;

    let tag = first
        .tag_name
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            FetchError::MalformedData("Unable to find tag name in latest release".to_string())
        })?;

    let version = parse_version(&tag);
    if version.is_empty() {
        return Err(FetchError::MalformedData(format!(
            "Latest release tag '{}' contains no version number",
            tag
        )));
    }

    Ok(ResolvedRelease { tag, version })
}

/// List releases at `url` and resolve the newest one
pub fn resolve_latest(http: &HttpClient, url: &str, repo: &str) -> Result<ResolvedRelease> {
    select_latest(fetch_releases(http, url)?, repo)
}
