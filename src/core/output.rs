//! Colored output and progress reporting
//!
//! Uses owo-colors for terminal colors and indicatif for progress bars.
//! Everything except errors can be silenced with [`set_quiet`].

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Standard spinner characters
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard tick interval for spinners
const TICK_INTERVAL_MS: u64 = 80;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress everything except errors and warnings
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print an action header (blue, bold)
/// Example: "==> Resolving latest release"
pub fn action(message: &str) {
    if !quiet() {
        println!("{} {}", "==>".blue().bold(), message.bold());
    }
}

/// Print a detail line (dimmed)
/// Example: "     downloading https://..."
pub fn detail(message: &str) {
    if !quiet() {
        println!("     {}", message.dimmed());
    }
}

/// Print an extracted/copied file
/// Example: "  ‣ jswasm/sqlite3.wasm"
pub fn list_item(path: &str) {
    if !quiet() {
        println!("  {} {}", "‣".cyan(), path);
    }
}

/// Print a success message (green)
pub fn success(message: &str) {
    if !quiet() {
        println!("{} {}", "==>".green().bold(), message.green());
    }
}

/// Print an info message (cyan)
pub fn info(message: &str) {
    if !quiet() {
        println!("{} {}", "::".cyan(), message);
    }
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Create a spinner with standard styling.
/// Hidden in quiet mode.
pub fn spinner(message: &str) -> ProgressBar {
    if quiet() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("     {spinner:.cyan} {msg}")
            .unwrap()
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(TICK_INTERVAL_MS));
    pb
}

/// Upgrade a spinner to a byte progress bar once content length is known.
pub fn upgrade_to_bytes(pb: &ProgressBar, total_bytes: u64) {
    pb.set_length(total_bytes);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("     {spinner:.cyan} [{bar:30.cyan/dim}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("━╸━"),
    );
}
