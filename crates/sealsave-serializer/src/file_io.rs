//! Whole-file reads and overwriting writes, sync and async.

use std::{fs, io::Write, path::Path};

use sealsave_core::SaveError;
use tempfile::NamedTempFile;

/// Replace the file at `path` atomically (temp file + rename).
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), SaveError> {
    let parent = parent_dir(path)?;
    fs::create_dir_all(parent).map_err(|e| SaveError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| SaveError::io(path, e))?;
    tmp.write_all(contents).map_err(|e| SaveError::io(path, e))?;
    tmp.flush().map_err(|e| SaveError::io(path, e))?;
    tmp.persist(path).map_err(|e| SaveError::io(path, e.error))?;
    Ok(())
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, SaveError> {
    fs::read(path).map_err(|e| SaveError::io(path, e))
}

/// Truncating async write; last writer wins on a shared path.
pub async fn write_file_async(path: &Path, contents: &[u8]) -> Result<(), SaveError> {
    let parent = parent_dir(path)?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| SaveError::io(parent, e))?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| SaveError::io(path, e))
}

pub async fn read_file_async(path: &Path) -> Result<Vec<u8>, SaveError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SaveError::io(path, e))
}

fn parent_dir(path: &Path) -> Result<&Path, SaveError> {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .ok_or_else(|| SaveError::validation(format!("invalid save path: {}", path.display())))
}
