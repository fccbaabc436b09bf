use crate::catalog::Version;
use crate::config::ProjectFiles;
use crate::error::{BumpError, Result};
use crate::utils::{LinePatcher, PatchRule, PathValidator};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowOutcome {
    /// Workflow files that run the verification action
    pub matched: Vec<PathBuf>,
    /// Subset of `matched` whose content changed
    pub rewritten: Vec<PathBuf>,
}

/// Retargets CI verification workflows at a new platform version.
pub struct WorkflowUpdater {
    project_path: PathBuf,
    workflow_dir: PathBuf,
    verifier_action: String,
    ide_identifiers: Vec<String>,
}

impl WorkflowUpdater {
    pub fn new<P: AsRef<Path>>(project_path: P, files: &ProjectFiles) -> Self {
        let project_path = project_path.as_ref().to_path_buf();
        Self {
            workflow_dir: project_path.join(&files.workflow_dir),
            project_path,
            verifier_action: files.verifier_action.clone(),
            ide_identifiers: files.ide_identifiers.clone(),
        }
    }

    /// Regular files directly inside the workflow directory that reference
    /// the verification action, sorted by path.
    pub fn find_verification_workflows(&self) -> Result<Vec<PathBuf>> {
        if !self.workflow_dir.is_dir() {
            debug!(dir = %self.workflow_dir.display(), "no workflow directory");
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.workflow_dir)
            .map_err(|e| BumpError::file_access(&self.workflow_dir, e))?;

        let mut results = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| BumpError::file_access(&self.workflow_dir, e))?
                .path();
            if !path.is_file() {
                continue;
            }

            if let Err(e) = PathValidator::validate_file_path(&path, &self.project_path) {
                warn!("Skipping workflow file: {e}");
                continue;
            }

            let content = fs::read(&path).map_err(|e| BumpError::file_access(&path, e))?;
            if String::from_utf8_lossy(&content).contains(self.verifier_action.as_str()) {
                results.push(path);
            } else {
                debug!(path = %path.display(), "not a verification workflow");
            }
        }

        results.sort();
        Ok(results)
    }

    /// Replace `<ide>:<previous>` with `<ide>:<new>` in every verification
    /// workflow.
    pub fn update(&self, previous: &Version, new: &Version) -> Result<WorkflowOutcome> {
        let matched = self.find_verification_workflows()?;
        let rules = self
            .ide_identifiers
            .iter()
            .map(|id| PatchRule::replace_version(format!("{id}:{previous}"), format!("{id}:{new}")))
            .collect::<Result<Vec<_>>>()?;

        let mut rewritten = Vec::new();
        for path in &matched {
            if LinePatcher::new(path).apply(&rules)?.is_changed() {
                rewritten.push(path.clone());
            }
        }

        Ok(WorkflowOutcome { matched, rewritten })
    }
}
