use crate::agents::changelog_updater::ChangelogOutcome;
use crate::agents::workflow_updater::WorkflowOutcome;
use crate::catalog::Version;

/// A version moving from one value to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub from: Version,
    pub to: Version,
}

impl VersionChange {
    pub fn is_bump(&self) -> bool {
        self.from != self.to
    }
}

/// State handed from the properties step to the changelog and workflow
/// steps of a single project. Dropped once the project is done.
#[derive(Debug, Clone)]
pub struct UpgradeContext {
    /// Platform version found in the properties file before this run
    pub previous_platform_version: Version,
    pub new_platform_version: Version,
    /// `None` when the properties file was already on the new platform
    pub plugin_version: Option<VersionChange>,
}

impl UpgradeContext {
    pub fn unchanged(current_platform: Version) -> Self {
        Self {
            new_platform_version: current_platform.clone(),
            previous_platform_version: current_platform,
            plugin_version: None,
        }
    }

    pub fn platform_changed(&self) -> bool {
        self.previous_platform_version != self.new_platform_version
    }
}

/// Everything that happened to one project during a run.
#[derive(Debug, Clone)]
pub struct ProjectReport {
    pub context: UpgradeContext,
    pub changelog: ChangelogOutcome,
    pub workflows: WorkflowOutcome,
}

impl ProjectReport {
    pub fn is_empty(&self) -> bool {
        !self.context.platform_changed()
            && self.changelog != ChangelogOutcome::Inserted
            && self.workflows.rewritten.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_context_reports_no_platform_change() {
        let version = Version::parse("2023.2").unwrap();
        let context = UpgradeContext::unchanged(version.clone());
        assert!(!context.platform_changed());
        assert_eq!(context.previous_platform_version, version);
        assert!(context.plugin_version.is_none());
    }

    #[test]
    fn version_change_detects_bump() {
        let change = VersionChange {
            from: Version::parse("0.2.6").unwrap(),
            to: Version::parse("0.2.6").unwrap(),
        };
        assert!(!change.is_bump());
    }
}
