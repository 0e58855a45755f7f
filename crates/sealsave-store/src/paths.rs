use std::path::{Path, PathBuf};

use sealsave_core::SaveError;

/// Extension of every saved file.
pub const FILE_EXTENSION: &str = "dat";

/// `{root}/{file_name}.dat`
pub fn file_path(root: &Path, file_name: &str) -> Result<PathBuf, SaveError> {
    validate_name(file_name, "file name")?;
    Ok(root.join(format!("{file_name}.{FILE_EXTENSION}")))
}

/// `{root}/{base_name}_{record_name}.dat`
pub fn item_path(root: &Path, base_name: &str, record_name: &str) -> Result<PathBuf, SaveError> {
    validate_name(base_name, "base file name")?;
    validate_name(record_name, "record name")?;
    file_path(root, &format!("{base_name}_{record_name}"))
}

fn validate_name(name: &str, what: &str) -> Result<(), SaveError> {
    if name.trim().is_empty() {
        return Err(SaveError::validation(format!("{what} is empty")));
    }
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(SaveError::validation(format!(
            "{what} `{name}` must not contain path separators"
        )));
    }
    Ok(())
}
