use crate::error::{BumpError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "ij-bump.toml";
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Settings for one run. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory whose immediate subdirectories are plugin projects
    pub plugin_root: String,
    /// Only subdirectories whose path contains this substring are updated
    pub directory_filter: String,
    pub catalog: CatalogSettings,
    pub files: ProjectFiles,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSettings {
    pub url: String,
    pub product_code: String,
    pub release_type: String,
}

/// Names and markers of the files patched inside each project.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectFiles {
    pub properties: String,
    pub changelog: String,
    pub changelog_marker: String,
    pub changelog_note: String,
    pub workflow_dir: String,
    pub verifier_action: String,
    pub ide_identifiers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugin_root: "~/GitHub/jetbrains/plugins".to_string(),
            directory_filter: "sample-intellij-plugin".to_string(),
            catalog: CatalogSettings::default(),
            files: ProjectFiles::default(),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            url: "https://data.services.jetbrains.com/products".to_string(),
            product_code: "IIU".to_string(),
            release_type: "release".to_string(),
        }
    }
}

impl Default for ProjectFiles {
    fn default() -> Self {
        Self {
            properties: "gradle.properties".to_string(),
            changelog: "CHANGELOG.md".to_string(),
            changelog_marker: "### Changed".to_string(),
            changelog_note: "- Upgrading IntelliJ to {version}".to_string(),
            workflow_dir: ".github/workflows".to_string(),
            verifier_action: "uses: ChrisCarini/intellij-platform-plugin-verifier-action"
                .to_string(),
            ide_identifiers: vec!["ideaIC".to_string(), "ideaIU".to_string()],
        }
    }
}

impl Config {
    /// Load from an explicit path, else `ij-bump.toml` in the working
    /// directory if present, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let content = fs::read_to_string(&path).map_err(|e| BumpError::file_access(&path, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            BumpError::Config(msg) => BumpError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| BumpError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let files = &self.files;

        if !files.changelog_note.contains(VERSION_PLACEHOLDER) {
            return Err(BumpError::Config(format!(
                "changelog_note must contain {VERSION_PLACEHOLDER}"
            )));
        }

        let single_line = [
            ("changelog_marker", &files.changelog_marker),
            ("changelog_note", &files.changelog_note),
            ("verifier_action", &files.verifier_action),
        ];
        for (name, value) in single_line {
            if value.is_empty() || value.contains('\n') {
                return Err(BumpError::Config(format!(
                    "{name} must be a non-empty single line"
                )));
            }
        }

        if files
            .ide_identifiers
            .iter()
            .any(|id| id.is_empty() || id.contains(char::is_whitespace))
        {
            return Err(BumpError::Config(
                "ide_identifiers must be non-empty and contain no whitespace".to_string(),
            ));
        }

        Ok(())
    }

    /// Plugin root with `~` expanded.
    pub fn plugin_root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.plugin_root).into_owned())
    }
}

impl ProjectFiles {
    pub fn render_note(&self, version: &str) -> String {
        self.changelog_note.replace(VERSION_PLACEHOLDER, version)
    }
}
