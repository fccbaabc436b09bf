use crate::catalog::Version;
use crate::config::ProjectFiles;
use crate::error::Result;
use crate::utils::line_patcher::line_body;
use crate::utils::{LinePatcher, PatchRule};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogOutcome {
    Inserted,
    AlreadyPresent,
    /// No pending-changes header in the document; nothing was written
    MarkerMissing,
}

/// Adds the platform upgrade note under the pending changes header.
pub struct ChangelogUpdater {
    patcher: LinePatcher,
    files: ProjectFiles,
}

impl ChangelogUpdater {
    pub fn new<P: AsRef<Path>>(project_path: P, files: &ProjectFiles) -> Self {
        Self {
            patcher: LinePatcher::new(project_path.as_ref().join(&files.changelog)),
            files: files.clone(),
        }
    }

    pub fn note_for(&self, version: &Version) -> String {
        self.files.render_note(version.as_str())
    }

    pub fn update(&self, new_platform: &Version) -> Result<ChangelogOutcome> {
        let note = self.note_for(new_platform);
        let lines = self.patcher.read_lines()?;

        if lines.iter().any(|line| line_body(line) == note) {
            return Ok(ChangelogOutcome::AlreadyPresent);
        }

        let rule = PatchRule::insert_after(self.files.changelog_marker.as_str(), note)?;
        if self.patcher.apply_to(&lines, &[rule])?.is_changed() {
            Ok(ChangelogOutcome::Inserted)
        } else {
            warn!(
                path = %self.patcher.path().display(),
                marker = %self.files.changelog_marker,
                "changelog has no pending changes header, note not added"
            );
            Ok(ChangelogOutcome::MarkerMissing)
        }
    }
}
