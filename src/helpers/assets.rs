//! Post-extraction file copies
//!
//! Used for files the demo needs next to the extracted build, such as the
//! module-workers polyfill shipped in `node_modules`.

use crate::core::config::AssetCopy;
use crate::core::error::{FetchError, Result};

/// Copy every `from` to its `to`, creating parent directories.
///
/// Returns the number of bytes copied per entry, in order.
pub fn copy_assets(copies: &[AssetCopy]) -> Result<Vec<u64>> {
    copies.iter().map(copy_asset).collect()
}

fn copy_asset(copy: &AssetCopy) -> Result<u64> {
    if !copy.from.is_file() {
        return Err(FetchError::Io(format!(
            "cannot copy {}: no such file",
            copy.from.display()
        )));
    }

    if let Some(parent) = copy.to.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            FetchError::io(format!("cannot create directory {}", parent.display()), e)
        })?;
    }

    std::fs::copy(&copy.from, &copy.to).map_err(|e| {
        FetchError::io(
            format!(
                "cannot copy {} to {}",
                copy.from.display(),
                copy.to.display()
            ),
            e,
        )
    })
}
