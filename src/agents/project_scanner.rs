use crate::error::{BumpError, Result};
use crate::utils::PathValidator;
use std::fs;
use std::path::{Path, PathBuf};

/// Finds the plugin projects under a plugin root directory.
pub struct ProjectScanner {
    root: PathBuf,
    filter: String,
}

impl ProjectScanner {
    pub fn new<P: AsRef<Path>>(root: P, filter: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            filter: filter.into(),
        }
    }

    /// Immediate subdirectories whose name contains the filter, sorted.
    /// An empty filter selects every subdirectory.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let root = PathValidator::validate_directory(&self.root)?;

        let entries = fs::read_dir(&root).map_err(|e| BumpError::file_access(&root, e))?;

        let mut projects = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| BumpError::file_access(&root, e))?.path();
            if !path.is_dir() {
                continue;
            }

            let matches = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains(self.filter.as_str()));
            if matches {
                projects.push(path);
            }
        }

        projects.sort();
        Ok(projects)
    }
}
