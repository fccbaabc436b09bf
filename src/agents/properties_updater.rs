use crate::agents::context::{UpgradeContext, VersionChange};
use crate::catalog::{Version, next_plugin_version};
use crate::config::ProjectFiles;
use crate::error::{BumpError, Result};
use crate::utils::line_patcher::line_body;
use crate::utils::{LinePatcher, PatchRule};
use regex::Regex;
use std::path::Path;
use tracing::debug;

pub const PLUGIN_VERSION: &str = "pluginVersion";
pub const PLUGIN_VERIFIER_IDE_VERSIONS: &str = "pluginVerifierIdeVersions";
pub const PLATFORM_VERSION: &str = "platformVersion";

/// One `key = value` line of the properties file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: &'static str,
    /// Text between key and value, e.g. `" = "`
    pub separator: String,
    pub version: Version,
}

impl PropertyEntry {
    /// The exact `key = value` text found in the file.
    pub fn literal(&self) -> String {
        self.literal_with(&self.version)
    }

    pub fn literal_with(&self, version: &Version) -> String {
        format!("{}{}{}", self.key, self.separator, version)
    }

    fn rewrite_to(&self, version: &Version) -> Result<PatchRule> {
        PatchRule::replace(self.literal(), self.literal_with(version))
    }
}

/// The three properties read from a plugin's properties file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySet {
    pub plugin_version: PropertyEntry,
    pub plugin_verifier_ide_versions: PropertyEntry,
    pub platform_version: PropertyEntry,
}

impl PropertySet {
    /// Scan `lines` for the known keys. The first line for a key wins.
    pub fn parse(lines: &[String], path: &Path) -> Result<Self> {
        Ok(Self {
            plugin_version: find_entry(lines, PLUGIN_VERSION, path)?,
            plugin_verifier_ide_versions: find_entry(lines, PLUGIN_VERIFIER_IDE_VERSIONS, path)?,
            platform_version: find_entry(lines, PLATFORM_VERSION, path)?,
        })
    }
}

fn find_entry(lines: &[String], key: &'static str, path: &Path) -> Result<PropertyEntry> {
    let pattern = Regex::new(&format!(r"^\s*{}(\s*=\s*)(\S+)", regex::escape(key)))
        .map_err(|e| BumpError::InvalidRule(format!("Regex error: {e}")))?;

    let mut matches = lines
        .iter()
        .filter_map(|line| pattern.captures(line_body(line)));

    let captures = matches.next().ok_or_else(|| BumpError::MissingProperty {
        key: key.to_string(),
        path: path.to_path_buf(),
    })?;

    let duplicates = matches.count();
    if duplicates > 0 {
        debug!(key, duplicates, path = %path.display(), "ignoring later duplicate property lines");
    }

    Ok(PropertyEntry {
        key,
        separator: captures[1].to_string(),
        version: Version::parse(&captures[2])?,
    })
}

/// Moves the build properties of one project to a new platform version.
pub struct PropertiesUpdater {
    patcher: LinePatcher,
}

impl PropertiesUpdater {
    pub fn new<P: AsRef<Path>>(project_path: P, files: &ProjectFiles) -> Self {
        Self {
            patcher: LinePatcher::new(project_path.as_ref().join(&files.properties)),
        }
    }

    /// Rewrite plugin, verifier and platform versions for `new_platform`.
    ///
    /// The returned context carries the platform version found *before* the
    /// update, which later steps need to locate the old tokens.
    pub fn update(&self, new_platform: &Version) -> Result<UpgradeContext> {
        let lines = self.patcher.read_lines()?;
        let properties = PropertySet::parse(&lines, self.patcher.path())?;
        let current_platform = properties.platform_version.version.clone();

        if current_platform == *new_platform {
            debug!(
                path = %self.patcher.path().display(),
                version = %current_platform,
                "platform version already current"
            );
            return Ok(UpgradeContext::unchanged(current_platform));
        }

        let next_plugin = next_plugin_version(
            &properties.plugin_version.version,
            &current_platform,
            new_platform,
        );

        let rules = [
            properties.plugin_version.rewrite_to(&next_plugin)?,
            properties
                .plugin_verifier_ide_versions
                .rewrite_to(new_platform)?,
            properties.platform_version.rewrite_to(new_platform)?,
        ];
        self.patcher.apply_to(&lines, &rules)?;

        Ok(UpgradeContext {
            previous_platform_version: current_platform,
            new_platform_version: new_platform.clone(),
            plugin_version: Some(VersionChange {
                from: properties.plugin_version.version,
                to: next_plugin,
            }),
        })
    }
}
