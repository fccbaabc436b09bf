pub mod jetbrains;
pub mod version;

pub use jetbrains::JetBrainsCatalog;
pub use version::{Version, max_of, next_plugin_version};

use crate::error::Result;

/// Source of published platform versions.
pub trait ReleaseCatalog {
    fn available_versions(&self) -> Result<Vec<Version>>;
}

/// Newest version published by the catalog.
pub fn latest_release(catalog: &dyn ReleaseCatalog) -> Result<Version> {
    let versions = catalog.available_versions()?;
    max_of(&versions)
}
