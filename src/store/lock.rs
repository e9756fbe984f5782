use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::{MigrateError, Result};

/// Take an exclusive, non-blocking lock on `path`, creating the file if needed.
/// The lock lives as long as the returned handle.
pub fn acquire(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    file.try_lock_exclusive()
        .map_err(|_| MigrateError::Locked(path.display().to_string()))?;

    Ok(file)
}
