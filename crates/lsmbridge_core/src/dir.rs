//! On-disk layout of the engine root.
//!
//! ```text
//! <path>/
//! ├─ LOCK              # held by the engine while open
//! ├─ 512/              # one directory per space id
//! │  └─ *.db
//! └─ 513/
//! ```

use crate::types::SpaceId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns the directory holding the data of `space_id`.
#[must_use]
pub fn space_dir(root: &Path, space_id: SpaceId) -> PathBuf {
    root.join(space_id.to_string())
}

/// Removes a space directory: unlinks every entry whose name does not start
/// with `.`, then removes the directory itself.
///
/// Hidden entries are left alone, so a directory containing them is not
/// removed and the final `remove_dir` fails.
///
/// Returns the number of files unlinked.
///
/// # Errors
///
/// Returns the first I/O error. Files unlinked before the error stay
/// unlinked.
pub fn remove_space_dir(path: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        fs::remove_file(entry.path())?;
        removed += 1;
    }
    fs::remove_dir(path)?;
    Ok(removed)
}
