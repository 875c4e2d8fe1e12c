//! Layered configuration
//!
//! Resolution order (later wins): built-in defaults, TOML config files,
//! environment variables, then CLI flags applied by the binary.
//!
//! Config files are read from `$XDG_CONFIG_DIRS/sqlite-wasm-fetch/config.toml`,
//! `$XDG_CONFIG_HOME/sqlite-wasm-fetch/config.toml` and `./sqlite-wasm-fetch.toml`,
//! in that order. An explicit `--config` path replaces the search.
//!
//! ```toml
//! repo = "utelle/SQLite3MultipleCiphers"
//! sqlite_version = "3.50.4"
//! dest = "sqlite-wasm"
//! rollback_on_failure = true
//!
//! [[copy]]
//! from = "node_modules/module-workers-polyfill/module-workers-polyfill.min.js"
//! to = "demo/module-workers-polyfill.min.js"
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REPO: &str = "utelle/SQLite3MultipleCiphers";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_URL_TEMPLATE: &str = "https://github.com/{repo}/releases/download/v{version}/sqlite3mc-{version}-sqlite-{sqlite_version}-wasm.zip";
pub const DEFAULT_SQLITE_VERSION: &str = "3.50.4";
pub const DEFAULT_DESCRIPTOR: &str = "package.json";
pub const DEFAULT_DEST: &str = "sqlite-wasm";
pub const DEFAULT_MARKER: &str = "jswasm";
pub const DEFAULT_EXTENSIONS: &[&str] = &["mjs", "wasm", "js"];
pub const DEFAULT_STRIP_COMPONENTS: usize = 1;

/// Default HTTP timeout in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const CONFIG_DIR_NAME: &str = "sqlite-wasm-fetch";
const LOCAL_CONFIG_FILE: &str = "sqlite-wasm-fetch.toml";

/// What happens to an already-rewritten descriptor when a later stage fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataPolicy {
    /// Leave the new version in place
    #[default]
    Keep,
    /// Restore the descriptor's original bytes
    Rollback,
}

/// A file copied after extraction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetCopy {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl AssetCopy {
    /// Parse a `FROM:TO` pair as given on the command line
    pub fn parse(spec: &str) -> Result<Self> {
        let Some((from, to)) = spec.split_once(':') else {
            bail!("Invalid copy spec '{}' (expected FROM:TO)", spec);
        };
        if from.trim().is_empty() || to.trim().is_empty() {
            bail!("Invalid copy spec '{}' (empty FROM or TO)", spec);
        }
        Ok(Self {
            from: PathBuf::from(from.trim()),
            to: PathBuf::from(to.trim()),
        })
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub repository in "owner/repo" form
    pub repo: String,
    pub api_base: String,
    /// Download URL template; see [`crate::helpers::url`]
    pub url_template: String,
    pub sqlite_version: String,
    pub descriptor: PathBuf,
    pub dest: PathBuf,
    /// Substring an archive path must contain to be extracted
    pub marker: String,
    /// Allowed extensions, without leading dot
    pub extensions: Vec<String>,
    pub strip_components: usize,
    /// Expected SHA-256 of the archive, if pinned
    pub sha256: Option<String>,
    pub metadata_policy: MetadataPolicy,
    pub copies: Vec<AssetCopy>,
    /// Directory for the temporary archive (system temp dir if unset)
    pub work_dir: Option<PathBuf>,
    pub http_timeout: Duration,
    pub github_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.to_owned(),
            api_base: DEFAULT_API_BASE.to_owned(),
            url_template: DEFAULT_URL_TEMPLATE.to_owned(),
            sqlite_version: DEFAULT_SQLITE_VERSION.to_owned(),
            descriptor: PathBuf::from(DEFAULT_DESCRIPTOR),
            dest: PathBuf::from(DEFAULT_DEST),
            marker: DEFAULT_MARKER.to_owned(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            strip_components: DEFAULT_STRIP_COMPONENTS,
            sha256: None,
            metadata_policy: MetadataPolicy::Keep,
            copies: Vec::new(),
            work_dir: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            github_token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    repo: Option<String>,
    api_base: Option<String>,
    url_template: Option<String>,
    sqlite_version: Option<String>,
    descriptor: Option<PathBuf>,
    dest: Option<PathBuf>,
    marker: Option<String>,
    extensions: Option<Vec<String>>,
    strip_components: Option<usize>,
    sha256: Option<String>,
    rollback_on_failure: Option<bool>,
    http_timeout_secs: Option<u64>,
    work_dir: Option<PathBuf>,
    copy: Option<Vec<AssetCopy>>,
}

impl ConfigToml {
    fn merge(&mut self, other: ConfigToml) {
        if other.repo.is_some() {
            self.repo = other.repo;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.url_template.is_some() {
            self.url_template = other.url_template;
        }
        if other.sqlite_version.is_some() {
            self.sqlite_version = other.sqlite_version;
        }
        if other.descriptor.is_some() {
            self.descriptor = other.descriptor;
        }
        if other.dest.is_some() {
            self.dest = other.dest;
        }
        if other.marker.is_some() {
            self.marker = other.marker;
        }
        if other.extensions.is_some() {
            self.extensions = other.extensions;
        }
        if other.strip_components.is_some() {
            self.strip_components = other.strip_components;
        }
        if other.sha256.is_some() {
            self.sha256 = other.sha256;
        }
        if other.rollback_on_failure.is_some() {
            self.rollback_on_failure = other.rollback_on_failure;
        }
        if other.http_timeout_secs.is_some() {
            self.http_timeout_secs = other.http_timeout_secs;
        }
        if other.work_dir.is_some() {
            self.work_dir = other.work_dir;
        }
        match (&mut self.copy, other.copy) {
            (Some(dst), Some(src)) => dst.extend(src),
            (None, Some(src)) => self.copy = Some(src),
            _ => {}
        }
    }

    fn apply_to(self, cfg: &mut Config) {
        if let Some(v) = self.repo {
            cfg.repo = v;
        }
        if let Some(v) = self.api_base {
            cfg.api_base = v;
        }
        if let Some(v) = self.url_template {
            cfg.url_template = v;
        }
        if let Some(v) = self.sqlite_version {
            cfg.sqlite_version = v;
        }
        if let Some(v) = self.descriptor {
            cfg.descriptor = v;
        }
        if let Some(v) = self.dest {
            cfg.dest = v;
        }
        if let Some(v) = self.marker {
            cfg.marker = v;
        }
        if let Some(v) = self.extensions {
            cfg.extensions = normalize_extensions(&v);
        }
        if let Some(v) = self.strip_components {
            cfg.strip_components = v;
        }
        if let Some(v) = self.sha256 {
            cfg.sha256 = Some(v.to_lowercase());
        }
        if let Some(rollback) = self.rollback_on_failure {
            cfg.metadata_policy = if rollback {
                MetadataPolicy::Rollback
            } else {
                MetadataPolicy::Keep
            };
        }
        if let Some(secs) = self.http_timeout_secs {
            cfg.http_timeout = clamp_timeout(secs);
        }
        if self.work_dir.is_some() {
            cfg.work_dir = self.work_dir;
        }
        if let Some(v) = self.copy {
            cfg.copies = v;
        }
    }
}

/// Drop surrounding whitespace and leading dots: [" .wasm", "mjs"] -> ["wasm", "mjs"]
pub fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_owned())
        .filter(|e| !e.is_empty())
        .collect()
}

// Clamp to reasonable range (5-300 seconds)
fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(5, 300))
}

fn split_xdg_config_dirs() -> Vec<PathBuf> {
    let raw = std::env::var("XDG_CONFIG_DIRS").unwrap_or_else(|_| "/etc/xdg".to_owned());
    raw.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn xdg_config_home() -> PathBuf {
    if let Ok(raw) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".").join(".config"))
}

fn find_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for dir in split_xdg_config_dirs() {
        paths.push(dir.join(CONFIG_DIR_NAME).join("config.toml"));
    }
    paths.push(xdg_config_home().join(CONFIG_DIR_NAME).join("config.toml"));
    paths.push(PathBuf::from(LOCAL_CONFIG_FILE));
    paths
}

fn read_toml(path: &Path) -> Result<ConfigToml> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str::<ConfigToml>(&text)
        .with_context(|| format!("Invalid TOML in {}", path.display()))
}

impl Config {
    /// Load defaults, config files and environment.
    ///
    /// With `explicit`, only that file is read and it must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut merged = ConfigToml::default();
        match explicit {
            Some(path) => merged.merge(read_toml(path)?),
            None => {
                for path in find_config_files() {
                    if path.exists() {
                        merged.merge(read_toml(&path)?);
                    }
                }
            }
        }

        let mut cfg = Config::default();
        merged.apply_to(&mut cfg);
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Parse a single TOML document on top of the defaults (no env)
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let parsed: ConfigToml = toml::from_str(text).context("Invalid TOML")?;
        let mut cfg = Config::default();
        parsed.apply_to(&mut cfg);
        Ok(cfg)
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// - `GITHUB_TOKEN`: bearer token for the releases API
    /// - `SQLITE_WASM_FETCH_HTTP_TIMEOUT`: seconds, clamped to 5-300
    /// - `SQLITE_WASM_FETCH_API_BASE`: API base URL
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(token) = get("GITHUB_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.github_token = Some(token.trim().to_owned());
        }
        if let Some(secs) = get("SQLITE_WASM_FETCH_HTTP_TIMEOUT").and_then(|s| s.parse().ok()) {
            self.http_timeout = clamp_timeout(secs);
        }
        if let Some(base) = get("SQLITE_WASM_FETCH_API_BASE").filter(|b| !b.is_empty()) {
            self.api_base = base;
        }
    }

    /// Release listing endpoint for the configured repository
    pub fn releases_url(&self) -> String {
        format!(
            "{}/repos/{}/releases",
            self.api_base.trim_end_matches('/'),
            self.repo
        )
    }
}
