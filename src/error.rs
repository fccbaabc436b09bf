use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BumpError {
    #[error("Release catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Cannot access '{}': {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Property '{key}' not found in '{}'", .path.display())]
    MissingProperty { key: String, path: PathBuf },

    #[error("Cannot pick a maximum from an empty set of {0}")]
    EmptyInput(&'static str),

    #[error("Invalid version '{input}': {reason}")]
    VersionParse { input: String, reason: String },

    #[error("Invalid patch rule: {0}")]
    InvalidRule(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("{failed} of {total} project(s) failed to update")]
    ProjectsFailed { failed: usize, total: usize },
}

impl BumpError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BumpError::FileAccess {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BumpError>;
