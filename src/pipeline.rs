//! Artifact acquisition pipeline
//!
//! One sequential run:
//!
//! ```text
//! Idle -> ResolvingVersion -> MetadataUpdated -> Downloading -> Extracting -> Cleanup -> Done
//! ```
//!
//! Any stage can fail; the first failure ends the run and is returned as a
//! [`PipelineFailure`] naming the stage the run was in. There are no retries.
//!
//! The descriptor is rewritten before the archive is fetched. Whether a
//! later failure restores it is decided by [`MetadataPolicy`]. The
//! temporary archive is removed on every exit path.

use crate::core::config::{AssetCopy, Config, MetadataPolicy};
use crate::core::error::{ErrorKind, FetchError};
use crate::core::lock::acquire_descriptor_lock;
use crate::core::output;
use crate::helpers::assets::copy_assets;
use crate::helpers::descriptor;
use crate::helpers::download::download_archive;
use crate::helpers::extract::{ExtractFilter, ExtractedFile, extract_filtered};
use crate::helpers::http::HttpClient;
use crate::helpers::release::{ResolvedRelease, resolve_latest};
use crate::helpers::url::{UrlVars, build_download_url};
use semver::Version;
use std::fmt;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ResolvingVersion,
    MetadataUpdated,
    Downloading,
    Extracting,
    Cleanup,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ResolvingVersion => "resolving version",
            Self::MetadataUpdated => "metadata updated",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal `Failed` state of a run
#[derive(Debug)]
pub struct PipelineFailure {
    /// State the run was in when it failed
    pub stage: Stage,
    pub error: FetchError,
    /// True if the descriptor was restored to its pre-run bytes
    pub metadata_rolled_back: bool,
}

impl PipelineFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error.kind(), self.error)
    }
}

impl std::error::Error for PipelineFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub release: ResolvedRelease,
    pub previous_version: Option<String>,
    pub url: String,
    pub archive_size: u64,
    pub archive_sha256: String,
    pub files: Vec<ExtractedFile>,
    pub copied: Vec<AssetCopy>,
}

/// Run the whole pipeline with `cfg`
pub fn run(cfg: &Config) -> Result<RunReport, PipelineFailure> {
    Pipeline::new(cfg).run()
}

/// A single acquisition run
pub struct Pipeline<'a> {
    cfg: &'a Config,
    http: HttpClient,
    stage: Stage,
    /// Descriptor bytes before the run, kept for rollback
    snapshot: Option<Vec<u8>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(cfg: &'a Config) -> Self {
        Self {
            cfg,
            http: HttpClient::from_config(cfg),
            stage: Stage::Idle,
            snapshot: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub fn run(mut self) -> Result<RunReport, PipelineFailure> {
        // Held until rollback, if any, has finished
        let _lock = match acquire_descriptor_lock(&self.cfg.descriptor) {
            Ok(lock) => lock,
            Err(error) => {
                return Err(PipelineFailure {
                    stage: self.stage,
                    error,
                    metadata_rolled_back: false,
                });
            }
        };

        match self.run_stages() {
            Ok(report) => Ok(report),
            Err(error) => {
                let metadata_rolled_back = self.rollback_if_needed();
                Err(PipelineFailure {
                    stage: self.stage,
                    error,
                    metadata_rolled_back,
                })
            }
        }
    }

    fn run_stages(&mut self) -> Result<RunReport, FetchError> {
        let cfg = self.cfg;

        self.enter(Stage::ResolvingVersion);
        output::action(&format!("Resolving latest release of {}", cfg.repo));
        let release = resolve_latest(&self.http, &cfg.releases_url(), &cfg.repo)?;
        output::detail(&format!(
            "latest release: {} (version {})",
            release.tag, release.version
        ));

        if cfg.metadata_policy == MetadataPolicy::Rollback {
            self.snapshot = Some(std::fs::read(&cfg.descriptor).map_err(|e| {
                FetchError::io(format!("cannot read {}", cfg.descriptor.display()), e)
            })?);
        }
        let previous_version = descriptor::update_version(&cfg.descriptor, &release.version)?;
        self.enter(Stage::MetadataUpdated);

        let url = build_download_url(
            &cfg.url_template,
            UrlVars {
                version: &release.version,
                sqlite_version: &cfg.sqlite_version,
                repo: &cfg.repo,
            },
        )?;
        output::info(&format!("Found SQLite Wasm download link: {}", url));

        self.enter(Stage::Downloading);
        output::action("Downloading and unzipping SQLite Wasm...");
        let archive = download_archive(
            &self.http,
            &url,
            cfg.sha256.as_deref(),
            cfg.work_dir.as_deref(),
        )?;

        self.enter(Stage::Extracting);
        let filter = ExtractFilter {
            marker: cfg.marker.clone(),
            extensions: cfg.extensions.clone(),
            strip_components: cfg.strip_components,
        };
        let files = extract_filtered(archive.path(), &cfg.dest, &filter)?;
        if files.is_empty() {
            output::warning(&format!(
                "no entries in {} matched '{}' with extensions [{}]",
                archive.filename,
                cfg.marker,
                cfg.extensions.join(", ")
            ));
        }
        copy_assets(&cfg.copies)?;

        self.enter(Stage::Cleanup);
        let archive_size = archive.size;
        let archive_sha256 = archive.sha256.clone();
        archive.remove()?;

        self.enter(Stage::Done);
        Ok(RunReport {
            release,
            previous_version,
            url,
            archive_size,
            archive_sha256,
            files,
            copied: cfg.copies.clone(),
        })
    }

    /// Restore the descriptor when the policy asks for it and it was written
    fn rollback_if_needed(&mut self) -> bool {
        if self.cfg.metadata_policy != MetadataPolicy::Rollback
            || matches!(self.stage, Stage::Idle | Stage::ResolvingVersion)
        {
            return false;
        }
        let Some(bytes) = self.snapshot.take() else {
            return false;
        };

        match descriptor::write_bytes(&self.cfg.descriptor, &bytes) {
            Ok(()) => {
                output::warning(&format!(
                    "restored {} after failed run",
                    self.cfg.descriptor.display()
                ));
                true
            }
            Err(e) => {
                output::warning(&format!(
                    "could not restore {}: {}",
                    self.cfg.descriptor.display(),
                    e
                ));
                false
            }
        }
    }
}

/// How the local descriptor relates to the latest upstream release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    UpdateAvailable,
    /// Local version is newer than upstream
    LocalNewer,
    /// Versions differ and at least one is not semver
    Differs,
    /// Descriptor has no version field
    Unversioned,
}

/// Result of [`check`]
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub release: ResolvedRelease,
    pub local_version: Option<String>,
    pub status: UpdateStatus,
}

/// Compare a local version string with the upstream one
pub fn compare_versions(local: Option<&str>, upstream: &str) -> UpdateStatus {
    let Some(local) = local else {
        return UpdateStatus::Unversioned;
    };
    match (Version::parse(local), Version::parse(upstream)) {
        (Ok(l), Ok(u)) if l == u => UpdateStatus::UpToDate,
        (Ok(l), Ok(u)) if l < u => UpdateStatus::UpdateAvailable,
        (Ok(_), Ok(_)) => UpdateStatus::LocalNewer,
        _ if local == upstream => UpdateStatus::UpToDate,
        _ => UpdateStatus::Differs,
    }
}

/// Resolve the latest release and compare it with the descriptor.
///
/// Never writes anything.
pub fn check(cfg: &Config) -> Result<CheckReport, FetchError> {
    let http = HttpClient::from_config(cfg);
    let release = resolve_latest(&http, &cfg.releases_url(), &cfg.repo)?;
    let doc = descriptor::read_descriptor(&cfg.descriptor)?;
    let local_version = descriptor::current_version(&doc).map(str::to_owned);
    let status = compare_versions(local_version.as_deref(), &release.version);

    Ok(CheckReport {
        release,
        local_version,
        status,
    })
}
