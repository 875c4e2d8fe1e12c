//! sqlite-wasm-fetch CLI
//!
//! Usage:
//!   sqlite-wasm-fetch [fetch]      Download the latest release into ./sqlite-wasm
//!   sqlite-wasm-fetch check        Compare package.json with the latest release

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use sqlite_wasm_fetch::config::{AssetCopy, MetadataPolicy, normalize_extensions};
use sqlite_wasm_fetch::pipeline::{self, UpdateStatus};
use sqlite_wasm_fetch::{Config, output};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sqlite-wasm-fetch")]
#[command(about = "Fetch the SQLite3 Multiple Ciphers WebAssembly build for browser use")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (replaces the default search)
    #[arg(short, long, global = true, env = "SQLITE_WASM_FETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Package descriptor whose version is updated
    #[arg(short, long, global = true)]
    descriptor: Option<PathBuf>,

    /// GitHub repository in owner/repo form
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, download and extract the latest release (default)
    Fetch(FetchArgs),

    /// Show whether the descriptor is behind the latest release
    Check,
}

#[derive(Args, Default)]
struct FetchArgs {
    /// Extraction directory
    #[arg(short = 'o', long)]
    dest: Option<PathBuf>,

    /// Download URL template ({version}, {sqlite_version}, {repo})
    #[arg(long)]
    url_template: Option<String>,

    /// SQLite version embedded in the archive name
    #[arg(long)]
    sqlite_version: Option<String>,

    /// Path marker an entry must contain to be extracted
    #[arg(long)]
    marker: Option<String>,

    /// Allowed extensions, comma separated
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Leading path segments removed from each entry
    #[arg(long)]
    strip_components: Option<usize>,

    /// Expected SHA-256 of the archive
    #[arg(long)]
    sha256: Option<String>,

    /// Directory for the temporary archive
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Restore the descriptor if a later stage fails
    #[arg(long)]
    rollback_on_failure: bool,

    /// Extra file to copy after extraction, as FROM:TO (repeatable)
    #[arg(long = "copy", value_name = "FROM:TO")]
    copies: Vec<String>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);

    let mut cfg = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(descriptor) = cli.descriptor {
        cfg.descriptor = descriptor;
    }
    if let Some(repo) = cli.repo {
        cfg.repo = repo;
    }

    match cli.command.unwrap_or(Commands::Fetch(FetchArgs::default())) {
        Commands::Fetch(args) => {
            apply_fetch_args(&mut cfg, args)?;
            Ok(fetch(&cfg))
        }
        Commands::Check => Ok(check(&cfg)),
    }
}

fn apply_fetch_args(cfg: &mut Config, args: FetchArgs) -> Result<()> {
    if let Some(dest) = args.dest {
        cfg.dest = dest;
    }
    if let Some(template) = args.url_template {
        cfg.url_template = template;
    }
    if let Some(version) = args.sqlite_version {
        cfg.sqlite_version = version;
    }
    if let Some(marker) = args.marker {
        cfg.marker = marker;
    }
    if let Some(exts) = args.extensions {
        cfg.extensions = normalize_extensions(&exts);
    }
    if let Some(n) = args.strip_components {
        cfg.strip_components = n;
    }
    if let Some(sha) = args.sha256 {
        cfg.sha256 = Some(sha.to_lowercase());
    }
    if args.work_dir.is_some() {
        cfg.work_dir = args.work_dir;
    }
    if args.rollback_on_failure {
        cfg.metadata_policy = MetadataPolicy::Rollback;
    }
    for spec in &args.copies {
        cfg.copies.push(AssetCopy::parse(spec)?);
    }
    Ok(())
}

fn fetch(cfg: &Config) -> ExitCode {
    match pipeline::run(cfg) {
        Ok(report) => {
            output::success(&format!(
                "Downloaded and unzipped SQLite3MC {} into {}",
                report.release.version,
                cfg.dest.display()
            ));
            for file in &report.files {
                output::list_item(&file.path);
            }
            for copy in &report.copied {
                output::list_item(&format!(
                    "{} -> {}",
                    copy.from.display(),
                    copy.to.display()
                ));
            }
            output::detail(&format!(
                "archive sha256 {} ({} bytes)",
                report.archive_sha256, report.archive_size
            ));
            ExitCode::SUCCESS
        }
        Err(failure) => {
            output::error(&failure.to_string());
            output::detail(&format!("failed while {}", failure.stage));
            if failure.metadata_rolled_back {
                output::detail(&format!("{} was restored", cfg.descriptor.display()));
            }
            ExitCode::FAILURE
        }
    }
}

fn check(cfg: &Config) -> ExitCode {
    let report = match pipeline::check(cfg) {
        Ok(r) => r,
        Err(e) => {
            output::error(&format!("{}: {}", e.kind(), e));
            return ExitCode::FAILURE;
        }
    };

    let local = report.local_version.as_deref().unwrap_or("(none)");
    let upstream = &report.release.version;
    match report.status {
        UpdateStatus::UpToDate => {
            output::success(&format!("{} is up to date ({})", cfg.descriptor.display(), local))
        }
        UpdateStatus::UpdateAvailable | UpdateStatus::Differs | UpdateStatus::Unversioned => {
            output::info(&format!(
                "update available: {} -> {}",
                local.dimmed(),
                upstream.green()
            ))
        }
        UpdateStatus::LocalNewer => output::warning(&format!(
            "local version {} is newer than upstream {}",
            local, upstream
        )),
    }
    ExitCode::SUCCESS
}
