//! Descriptor lock management
//!
//! Provides exclusive locking so two runs never rewrite the same
//! descriptor at once.

use super::error::{FetchError, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Lock files older than this get a hint in the "already being updated" error
const OLD_LOCK_AGE_SECS: u64 = 3600;

/// Lock file path for a descriptor: `package.json` -> `package.json.lock`
pub fn lock_path_for(descriptor: &Path) -> PathBuf {
    let mut name: OsString = descriptor
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("descriptor"));
    name.push(".lock");
    descriptor.with_file_name(name)
}

/// Age of a lock file in seconds, if it can be determined
fn lock_age_secs(lock_path: &Path) -> Option<u64> {
    let modified = std::fs::metadata(lock_path).ok()?.modified().ok()?;
    let age = std::time::SystemTime::now().duration_since(modified).ok()?;
    Some(age.as_secs())
}

/// Acquire an exclusive lock on a descriptor file.
/// Returns a guard that releases the lock when dropped.
///
/// A lock file left behind by a dead process is reused: the OS released
/// its `fs2` lock when the process exited. A lock held by a live process
/// is never taken over, however old the file is.
pub fn acquire_descriptor_lock(descriptor: &Path) -> Result<DescriptorLock> {
    let lock_path = lock_path_for(descriptor);

    // Opened without truncation so a held lock file is left untouched
    let lock_file = File::options()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| {
            FetchError::io(
                format!("cannot create lock file {}", lock_path.display()),
                e,
            )
        })?;

    if lock_file.try_lock_exclusive().is_err() {
        let age = match lock_age_secs(&lock_path) {
            Some(secs) if secs > OLD_LOCK_AGE_SECS => {
                format!(" (lock held for {} minutes)", secs / 60)
            }
            _ => String::new(),
        };
        return Err(FetchError::Io(format!(
            "'{}' is already being updated by another process{}. \
             If this is incorrect, delete '{}'",
            descriptor.display(),
            age,
            lock_path.display()
        )));
    }

    Ok(DescriptorLock {
        _file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for the descriptor lock - releases lock and deletes lock file when dropped
#[derive(Debug)]
pub struct DescriptorLock {
    _file: File,
    path: PathBuf,
}

impl Drop for DescriptorLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
