use crate::agents::{
    ChangelogOutcome, ChangelogUpdater, ProjectReport, ProjectScanner, PropertiesUpdater,
    WorkflowUpdater,
};
use crate::catalog::{JetBrainsCatalog, Version, latest_release, next_plugin_version};
use crate::config::{Config, ProjectFiles};
use crate::error::{BumpError, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::error;

/// Run-level options for `update`, after config and CLI are merged.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub plugin_root: PathBuf,
    pub directory_filter: String,
    /// Skip the catalog lookup and use this version
    pub platform_version: Option<Version>,
    pub fail_fast: bool,
}

impl UpdateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            plugin_root: config.plugin_root_path(),
            directory_filter: config.directory_filter.clone(),
            platform_version: None,
            fail_fast: false,
        }
    }
}

/// Execute the update workflow over every matching project
pub fn execute_update(config: &Config, options: &UpdateOptions) -> Result<()> {
    println!("{}", "Starting IntelliJ platform upgrade...".cyan().bold());

    // Step 1: Determine the target platform version
    println!("\n{}", "1. Determining target platform version...".yellow());
    let target = match &options.platform_version {
        Some(version) => {
            println!("   Using requested version {}", version.to_string().bold());
            version.clone()
        }
        None => fetch_latest(config)?,
    };
    println!("{}", format!("✓ Target platform version: {target}").green());

    // Step 2: Find plugin projects
    println!(
        "\n{}",
        format!(
            "2. Scanning {} for projects matching '{}'...",
            options.plugin_root.display(),
            options.directory_filter
        )
        .yellow()
    );
    let projects =
        ProjectScanner::new(&options.plugin_root, options.directory_filter.as_str()).discover()?;
    println!("   Found {} project(s)", projects.len());

    if projects.is_empty() {
        println!("\n{}", "No matching projects found".yellow());
        return Ok(());
    }

    // Step 3: Update each project independently
    println!("\n{}", "3. Updating projects...".yellow());
    let mut updated = 0;
    let mut failed = 0;

    for project in &projects {
        println!("\n{}", format!("Working on [{}]...", project.display()).cyan());

        match update_project(&config.files, project, &target) {
            Ok(report) => {
                if !report.is_empty() {
                    updated += 1;
                }
            }
            Err(e) => {
                failed += 1;
                error!(project = %project.display(), "update failed: {e}");
                println!(
                    "{} {}",
                    format!("✗ Failed to update [{}]:", project.display()).red(),
                    e
                );
                if options.fail_fast {
                    return Err(e);
                }
            }
        }
    }

    println!(
        "\n{}",
        format!(
            "Updated {updated} of {} project(s), {failed} failed",
            projects.len()
        )
        .bold()
    );

    if updated > 0 {
        println!(
            "{}",
            "Review the changes, then commit them and open a pull request for each project."
                .dimmed()
        );
    }

    if failed > 0 {
        return Err(BumpError::ProjectsFailed {
            failed,
            total: projects.len(),
        });
    }

    println!(
        "\n{}",
        "✨ Upgrade process completed successfully!".green().bold()
    );
    Ok(())
}

/// Run properties, changelog and workflow steps for one project, in order.
pub fn update_project(
    files: &ProjectFiles,
    project_path: &Path,
    target: &Version,
) -> Result<ProjectReport> {
    let properties = PropertiesUpdater::new(project_path, files);
    println!("   Updating  [{}] file...", files.properties);
    let context = properties.update(target)?;
    match &context.plugin_version {
        None => println!(
            "   {}",
            format!(
                "Skipping  [{}] file, versions same ({} == {target}).",
                files.properties, context.previous_platform_version
            )
            .yellow()
        ),
        Some(change) => {
            let plugin = if change.is_bump() {
                format!("plugin {} → {}", change.from, change.to)
            } else {
                format!("plugin stays at {}", change.from)
            };
            println!(
                "   {}",
                format!(
                    "✓ Completed [{}] file: platform {} → {}, {plugin}",
                    files.properties,
                    context.previous_platform_version,
                    context.new_platform_version,
                )
                .green()
            );
        }
    }

    let changelog = ChangelogUpdater::new(project_path, files);
    println!("   Updating  [{}] file...", files.changelog);
    let changelog_outcome = changelog.update(target)?;
    match changelog_outcome {
        ChangelogOutcome::Inserted => println!(
            "   {}",
            format!("✓ Completed [{}] file.", files.changelog).green()
        ),
        ChangelogOutcome::AlreadyPresent => println!(
            "   {}",
            format!(
                "Skipping  [{}] file, already found \"{}\" in file.",
                files.changelog,
                changelog.note_for(target)
            )
            .yellow()
        ),
        ChangelogOutcome::MarkerMissing => println!(
            "   {}",
            format!(
                "⚠ No \"{}\" section in [{}], note not added.",
                files.changelog_marker, files.changelog
            )
            .red()
        ),
    }

    let workflows = WorkflowUpdater::new(project_path, files);
    println!("   Searching for compatibility workflow files...");
    let workflow_outcome = workflows.update(&context.previous_platform_version, target)?;
    println!(
        "   Found {} workflow file(s)...",
        workflow_outcome.matched.len()
    );
    for path in &workflow_outcome.matched {
        let name = display_relative(path, project_path);
        if workflow_outcome.rewritten.contains(path) {
            println!("   {}", format!("✓ Completed [{name}] file.").green());
        } else {
            println!(
                "   {}",
                format!("Skipping  [{name}] file, nothing to change.").yellow()
            );
        }
    }

    Ok(ProjectReport {
        context,
        changelog: changelog_outcome,
        workflows: workflow_outcome,
    })
}

/// Print the newest platform release
pub fn execute_latest(config: &Config) -> Result<()> {
    let latest = fetch_latest(config)?;
    println!("{latest}");
    Ok(())
}

/// Print the plugin version that follows a platform change
pub fn execute_next_version(plugin: &str, current_platform: &str, new_platform: &str) -> Result<()> {
    let plugin = Version::parse(plugin)?;
    let current = Version::parse(current_platform)?;
    let new = Version::parse(new_platform)?;

    let next = next_plugin_version(&plugin, &current, &new);
    println!(
        "Platform {} → {}, plugin {} → {}",
        current,
        new,
        plugin.to_string().dimmed(),
        next.to_string().green().bold()
    );
    Ok(())
}

fn fetch_latest(config: &Config) -> Result<Version> {
    let catalog = JetBrainsCatalog::new(&config.catalog)?;
    latest_release(&catalog)
}

fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write_project(root: &Path, name: &str) -> PathBuf {
        let project = root.join(name);
        fs::create_dir_all(project.join(".github/workflows")).unwrap();
        fs::write(
            project.join("gradle.properties"),
            indoc! {"
                pluginVersion = 0.2.6
                pluginVerifierIdeVersions = 2022.3.2
                platformVersion = 2022.3.2
            "},
        )
        .unwrap();
        fs::write(
            project.join("CHANGELOG.md"),
            "## [Unreleased]\n### Changed\n",
        )
        .unwrap();
        fs::write(
            project.join(".github/workflows/compatibility.yml"),
            indoc! {"
                - uses: ChrisCarini/intellij-platform-plugin-verifier-action@latest
                  with:
                    ide-versions: |
                      ideaIC:2022.3.2
                      ideaIU:2022.3.2
            "},
        )
        .unwrap();
        project
    }

    fn options(root: &TempDir, version: &str) -> UpdateOptions {
        UpdateOptions {
            plugin_root: root.path().to_path_buf(),
            directory_filter: "sample-intellij-plugin".to_string(),
            platform_version: Some(Version::parse(version).unwrap()),
            fail_fast: false,
        }
    }

    #[test]
    fn update_project_runs_all_steps() {
        let root = tempdir().unwrap();
        let project = write_project(root.path(), "sample-intellij-plugin");
        let target = Version::parse("2023.1.0").unwrap();

        let report = update_project(&ProjectFiles::default(), &project, &target).unwrap();

        assert_eq!(report.context.previous_platform_version.to_string(), "2022.3.2");
        assert_eq!(report.changelog, ChangelogOutcome::Inserted);
        assert_eq!(report.workflows.rewritten.len(), 1);

        let workflow =
            fs::read_to_string(project.join(".github/workflows/compatibility.yml")).unwrap();
        assert!(workflow.contains("ideaIC:2023.1.0"));
        assert!(workflow.contains("ideaIU:2023.1.0"));

        let properties = fs::read_to_string(project.join("gradle.properties")).unwrap();
        assert!(properties.contains("pluginVersion = 1.0.0"));
    }

    #[test]
    fn update_project_twice_converges() {
        let root = tempdir().unwrap();
        let project = write_project(root.path(), "sample-intellij-plugin");
        let target = Version::parse("2023.1.0").unwrap();

        update_project(&ProjectFiles::default(), &project, &target).unwrap();
        let snapshot = |p: &Path| {
            [
                "gradle.properties",
                "CHANGELOG.md",
                ".github/workflows/compatibility.yml",
            ]
            .map(|f| fs::read_to_string(p.join(f)).unwrap())
        };
        let first = snapshot(&project);

        let report = update_project(&ProjectFiles::default(), &project, &target).unwrap();
        assert!(report.is_empty());
        assert_eq!(snapshot(&project), first);
    }

    #[test]
    fn execute_update_continues_past_failing_project() {
        let root = tempdir().unwrap();
        let good = write_project(root.path(), "sample-intellij-plugin-good");
        let broken = root.path().join("sample-intellij-plugin-broken");
        fs::create_dir_all(&broken).unwrap();

        let err = execute_update(&Config::default(), &options(&root, "2023.1.0")).unwrap_err();
        assert!(matches!(
            err,
            BumpError::ProjectsFailed {
                failed: 1,
                total: 2
            }
        ));

        let properties = fs::read_to_string(good.join("gradle.properties")).unwrap();
        assert!(properties.contains("platformVersion = 2023.1.0"));
    }

    #[test]
    fn execute_update_fail_fast_stops_on_first_error() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("sample-intellij-plugin-a")).unwrap();
        let later = write_project(root.path(), "sample-intellij-plugin-b");

        let mut opts = options(&root, "2023.1.0");
        opts.fail_fast = true;
        let err = execute_update(&Config::default(), &opts).unwrap_err();
        assert!(matches!(err, BumpError::FileAccess { .. }));

        let properties = fs::read_to_string(later.join("gradle.properties")).unwrap();
        assert!(properties.contains("platformVersion = 2022.3.2"));
    }

    #[test]
    fn execute_update_without_projects_succeeds() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("unrelated")).unwrap();
        assert!(execute_update(&Config::default(), &options(&root, "2023.1.0")).is_ok());
    }

    #[test]
    fn next_version_rejects_bad_input() {
        let err = execute_next_version("0.2", "2022.3.2", "nope").unwrap_err();
        assert!(matches!(err, BumpError::VersionParse { .. }));
    }
}
