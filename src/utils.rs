//! Utility functions for file operations

use crate::error::Result;
use std::fs;
use std::path::Path;

/// Write a file atomically via a temp sibling and rename
///
/// Creates the parent directory if needed. The content lands in a `.tmp`
/// sibling first and is renamed into place, so a crash mid-write never leaves
/// a truncated file at the final path.
///
/// # Examples
///
/// ```no_run
/// use tweet_relay::utils::write_atomic;
/// use std::path::Path;
///
/// # fn example() -> tweet_relay::Result<()> {
/// write_atomic(Path::new("./data/notified.json"), "[]")?;
/// # Ok(())
/// # }
/// ```
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
