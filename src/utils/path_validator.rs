use crate::error::{BumpError, Result};
use std::path::{Path, PathBuf};

/// Path checks applied before any project file is rewritten.
pub struct PathValidator;

impl PathValidator {
    /// Validates and canonicalises a directory path (plugin root or project).
    pub fn validate_directory(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            BumpError::ProjectValidation(format!("Invalid path '{}': {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(BumpError::ProjectValidation(format!(
                "Path '{}' is not a directory",
                canonical.display()
            )));
        }

        Ok(canonical)
    }

    /// Ensures the file resolves to a location inside `base_dir`.
    pub fn validate_file_path(
        file_path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file_path = file_path.as_ref();
        let base_dir = base_dir.as_ref();

        let canonical_file = file_path
            .canonicalize()
            .map_err(|e| BumpError::file_access(file_path, e))?;

        let canonical_base = base_dir
            .canonicalize()
            .map_err(|e| BumpError::file_access(base_dir, e))?;

        if !canonical_file.starts_with(&canonical_base) {
            return Err(BumpError::ProjectValidation(format!(
                "'{}' resolves outside '{}'",
                file_path.display(),
                canonical_base.display()
            )));
        }

        Ok(canonical_file)
    }
}
