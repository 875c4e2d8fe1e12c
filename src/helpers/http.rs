//! HTTP plumbing shared by the release resolver and the archive fetcher
//!
//! ## GitHub Authentication
//!
//! Set `GITHUB_TOKEN` to raise the API rate limit from 60/hr to 5000/hr:
//! ```bash
//! export GITHUB_TOKEN="ghp_xxxxxxxxxxxxxxxxxxxx"
//! ```

use crate::core::config::Config;
use crate::core::error::FetchError;
use std::time::Duration;

const USER_AGENT: &str = concat!("sqlite-wasm-fetch/", env!("CARGO_PKG_VERSION"));

/// Request factory carrying timeout and credentials
#[derive(Debug, Clone)]
pub struct HttpClient {
    timeout: Duration,
    github_token: Option<String>,
}

impl HttpClient {
    pub fn new(timeout: Duration, github_token: Option<String>) -> Self {
        Self {
            timeout,
            github_token,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.http_timeout, cfg.github_token.clone())
    }

    /// Plain GET with timeout and user agent
    pub fn get(&self, url: &str) -> ureq::Request {
        ureq::get(url)
            .timeout(self.timeout)
            .set("User-Agent", USER_AGENT)
    }

    /// GitHub API GET with proper headers and optional auth
    pub fn github_request(&self, url: &str) -> ureq::Request {
        let mut request = self
            .get(url)
            .set("Accept", "application/vnd.github.v3+json");

        if let Some(token) = &self.github_token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        request
    }
}

/// Map a ureq failure to a `Network` error naming the URL once
pub fn network_error(url: &str, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(403, _) => {
            FetchError::Network(format!("Access to {} denied (HTTP 403)", url))
        }
        ureq::Error::Status(404, _) => FetchError::Network(format!("{} not found (HTTP 404)", url)),
        ureq::Error::Status(code, _) => {
            FetchError::Network(format!("Unable to download {} (HTTP {})", url, code))
        }
        ureq::Error::Transport(t) => {
            // Transport's Display repeats the URL, so build the message from its parts
            let reason = match t.message() {
                Some(msg) => format!("{}: {}", t.kind(), msg),
                None => t.kind().to_string(),
            };
            FetchError::Network(format!("Request to {} failed: {}", url, reason))
        }
    }
}

/// Like [`network_error`], with the rate-limit hint a GitHub API 403 deserves
pub fn github_error(url: &str, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(403, _) => FetchError::Network(format!(
            "GitHub API rate limit exceeded for {}. Try again later or set GITHUB_TOKEN.",
            url
        )),
        other => network_error(url, other),
    }
}
