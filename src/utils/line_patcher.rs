use crate::error::{BumpError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::debug;

/// A single line-level edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchRule {
    /// Replace every occurrence of `find` with `replace` on every line.
    Replace { find: String, replace: String },
    /// Like `Replace`, but skips occurrences that continue as a longer
    /// version (`ideaIC:2023.1` leaves `ideaIC:2023.1.3` alone).
    ReplaceVersion { find: String, replace: String },
    /// Insert `line` once, right after the first line containing `marker`.
    InsertAfter { marker: String, line: String },
}

impl PatchRule {
    pub fn replace(find: impl Into<String>, replace: impl Into<String>) -> Result<Self> {
        let (find, replace) = check_replace(find.into(), replace.into())?;
        Ok(PatchRule::Replace { find, replace })
    }

    pub fn replace_version(find: impl Into<String>, replace: impl Into<String>) -> Result<Self> {
        let (find, replace) = check_replace(find.into(), replace.into())?;
        Ok(PatchRule::ReplaceVersion { find, replace })
    }

    pub fn insert_after(marker: impl Into<String>, line: impl Into<String>) -> Result<Self> {
        let marker = marker.into();
        let line = line.into();

        if marker.is_empty() {
            return Err(BumpError::InvalidRule(
                "insert rule needs a non-empty marker".to_string(),
            ));
        }
        if line.contains('\n') {
            return Err(BumpError::InvalidRule(format!(
                "inserted line '{}' spans more than one line",
                line.escape_debug()
            )));
        }

        Ok(PatchRule::InsertAfter { marker, line })
    }
}

fn check_replace(find: String, replace: String) -> Result<(String, String)> {
    if find.is_empty() {
        return Err(BumpError::InvalidRule(
            "replace rule needs a non-empty search string".to_string(),
        ));
    }
    if find.contains('\n') || replace.contains('\n') {
        return Err(BumpError::InvalidRule(format!(
            "replace rule '{}' spans more than one line",
            find.escape_debug()
        )));
    }
    Ok((find, replace))
}

/// Replace `find` wherever the text after it does not carry on the version
/// with another digit or `.<digit>`.
fn replace_version_token(line: &str, find: &str, replace: &str) -> String {
    let mut output = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(start) = rest.find(find) {
        let end = start + find.len();
        let tail = &rest[end..];
        let mut chars = tail.chars();
        let continues = match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        };

        output.push_str(&rest[..start]);
        output.push_str(if continues { &rest[start..end] } else { replace });
        rest = tail;
    }

    output.push_str(rest);
    output
}

/// Result of running rules over a buffer of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedLines {
    pub lines: Vec<String>,
    /// Number of lines altered by replace rules
    pub replaced: usize,
    /// Number of lines inserted
    pub inserted: usize,
}

impl PatchedLines {
    pub fn is_changed(&self) -> bool {
        self.replaced > 0 || self.inserted > 0
    }

    pub fn into_content(self) -> String {
        self.lines.concat()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Unchanged,
    Rewritten { replaced: usize, inserted: usize },
}

impl PatchOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, PatchOutcome::Rewritten { .. })
    }
}

/// Split text into lines, each keeping its `\n` or `\r\n` terminator.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}

/// Text of a line without its terminator.
pub fn line_body(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Apply `rules` to `lines` in order.
///
/// Replace rules run on every line, one after another. Each insert rule
/// fires at most once, triggered by the unmodified text of a line.
pub fn patch_lines(lines: &[String], rules: &[PatchRule]) -> PatchedLines {
    let mut output = Vec::with_capacity(lines.len() + 1);
    let mut fired = vec![false; rules.len()];
    let mut replaced = 0;
    let mut inserted = 0;

    for original in lines {
        let mut line = original.clone();
        for rule in rules {
            match rule {
                PatchRule::Replace { find, replace } if line.contains(find.as_str()) => {
                    line = line.replace(find.as_str(), replace);
                }
                PatchRule::ReplaceVersion { find, replace } if line.contains(find.as_str()) => {
                    line = replace_version_token(&line, find, replace);
                }
                _ => {}
            }
        }
        if &line != original {
            replaced += 1;
        }
        output.push(line);

        for (index, rule) in rules.iter().enumerate() {
            let PatchRule::InsertAfter { marker, line: new_line } = rule else {
                continue;
            };
            if fired[index] || !original.contains(marker.as_str()) {
                continue;
            }
            fired[index] = true;
            inserted += 1;

            let Some(last) = output.last_mut() else {
                continue;
            };
            if last.ends_with('\n') {
                let terminator = if last.ends_with("\r\n") { "\r\n" } else { "\n" };
                output.push(format!("{new_line}{terminator}"));
            } else {
                // Unterminated last line: terminate it, keep the file's
                // missing final newline on the inserted line.
                last.push('\n');
                output.push(new_line.clone());
            }
        }
    }

    PatchedLines {
        lines: output,
        replaced,
        inserted,
    }
}

/// Reads a text file as lines, applies rules and writes the result back.
pub struct LinePatcher {
    path: PathBuf,
}

impl LinePatcher {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_lines(&self) -> Result<Vec<String>> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| BumpError::file_access(&self.path, e))?;
        Ok(split_lines(&content))
    }

    /// Apply `rules` and replace the file only if something changed.
    pub fn apply(&self, rules: &[PatchRule]) -> Result<PatchOutcome> {
        let lines = self.read_lines()?;
        self.apply_to(&lines, rules)
    }

    /// Like [`LinePatcher::apply`], for lines the caller already read from
    /// this file.
    pub fn apply_to(&self, lines: &[String], rules: &[PatchRule]) -> Result<PatchOutcome> {
        let patched = patch_lines(lines, rules);

        if !patched.is_changed() {
            debug!(path = %self.path.display(), "no rule matched, file left untouched");
            return Ok(PatchOutcome::Unchanged);
        }

        let (replaced, inserted) = (patched.replaced, patched.inserted);
        write_atomic(&self.path, &patched.into_content())?;
        debug!(
            path = %self.path.display(),
            replaced, inserted, "file rewritten"
        );

        Ok(PatchOutcome::Rewritten { replaced, inserted })
    }
}

/// Replace `path` with `content` via a temporary file in the same directory.
///
/// The original stays intact until the final rename; on any failure the
/// temporary file is removed.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path).map(|m| m.permissions()).ok();

    let mut temp = Builder::new()
        .prefix(".ij-bump-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| BumpError::file_access(path, e))?;

    temp.write_all(content.as_bytes())
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| BumpError::file_access(path, e))?;

    if let Some(permissions) = permissions {
        fs::set_permissions(temp.path(), permissions)
            .map_err(|e| BumpError::file_access(path, e))?;
    }

    temp.persist(path)
        .map_err(|e| BumpError::file_access(path, e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn lines(text: &str) -> Vec<String> {
        split_lines(text)
    }

    #[test]
    fn split_keeps_terminators() {
        assert_eq!(lines("a\nb\r\nc"), vec!["a\n", "b\r\n", "c"]);
        assert!(lines("").is_empty());
    }

    #[test]
    fn line_body_strips_terminator() {
        assert_eq!(line_body("abc\r\n"), "abc");
        assert_eq!(line_body("abc\n"), "abc");
        assert_eq!(line_body("abc"), "abc");
    }

    #[test]
    fn replace_rules_apply_in_order_on_same_line() {
        let rules = vec![
            PatchRule::replace("ideaIC:1", "ideaIC:2").unwrap(),
            PatchRule::replace("ideaIU:1", "ideaIU:2").unwrap(),
        ];
        let patched = patch_lines(&lines("ide: ideaIC:1,ideaIU:1\nother\n"), &rules);

        assert_eq!(patched.lines, vec!["ide: ideaIC:2,ideaIU:2\n", "other\n"]);
        assert_eq!(patched.replaced, 1);
        assert_eq!(patched.inserted, 0);
    }

    #[test]
    fn replace_never_changes_line_count() {
        let source = lines("x = 1\nx = 1\nx = 1");
        let patched = patch_lines(&source, &[PatchRule::replace("x = 1", "x = 2").unwrap()]);
        assert_eq!(patched.lines.len(), source.len());
        assert_eq!(patched.replaced, 3);
    }

    #[test]
    fn insert_fires_once_after_first_marker() {
        let source = lines(indoc! {"
            ## [Unreleased]
            ### Changed
            ## [1.0.0]
            ### Changed
            - old
        "});
        let rule = PatchRule::insert_after("### Changed", "- new").unwrap();
        let patched = patch_lines(&source, &[rule]);

        assert_eq!(
            patched.into_content(),
            indoc! {"
                ## [Unreleased]
                ### Changed
                - new
                ## [1.0.0]
                ### Changed
                - old
            "}
        );
    }

    #[test]
    fn insert_matches_crlf_terminator() {
        let source = lines("### Changed\r\n- old\r\n");
        let patched = patch_lines(&source, &[PatchRule::insert_after("### Changed", "- new").unwrap()]);
        assert_eq!(patched.into_content(), "### Changed\r\n- new\r\n- old\r\n");
    }

    #[test]
    fn insert_after_unterminated_last_line() {
        let source = lines("intro\n### Changed");
        let patched = patch_lines(&source, &[PatchRule::insert_after("### Changed", "- new").unwrap()]);
        assert_eq!(patched.into_content(), "intro\n### Changed\n- new");
    }

    #[test]
    fn missing_marker_inserts_nothing() {
        let source = lines("# Changelog\n");
        let patched = patch_lines(&source, &[PatchRule::insert_after("### Changed", "- new").unwrap()]);
        assert!(!patched.is_changed());
        assert_eq!(patched.lines, source);
    }

    #[test]
    fn rejects_multiline_and_empty_rules() {
        assert!(matches!(
            PatchRule::replace("a\nb", "c"),
            Err(BumpError::InvalidRule(_))
        ));
        assert!(matches!(
            PatchRule::replace("a", "c\n"),
            Err(BumpError::InvalidRule(_))
        ));
        assert!(matches!(PatchRule::replace("", "c"), Err(BumpError::InvalidRule(_))));
        assert!(matches!(
            PatchRule::insert_after("", "x"),
            Err(BumpError::InvalidRule(_))
        ));
        assert!(matches!(
            PatchRule::insert_after("m", "x\ny"),
            Err(BumpError::InvalidRule(_))
        ));
    }

    #[test]
    fn version_replace_skips_longer_versions() {
        let rules = [PatchRule::replace_version("ideaIC:2023.1", "ideaIC:2023.2").unwrap()];
        let patched = patch_lines(
            &lines("ideaIC:2023.1\nideaIC:2023.1.3\nideaIC:2023.10\n- ideaIC:2023.1.\n"),
            &rules,
        );

        assert_eq!(patched.replaced, 2);
        assert_eq!(
            patched.into_content(),
            "ideaIC:2023.2\nideaIC:2023.1.3\nideaIC:2023.10\n- ideaIC:2023.2.\n"
        );
    }

    #[test]
    fn apply_rewrites_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "version = 1\nkeep me\n").unwrap();

        let patcher = LinePatcher::new(&path);
        let rules = vec![PatchRule::replace("version = 1", "version = 2").unwrap()];

        assert_eq!(
            patcher.apply(&rules).unwrap(),
            PatchOutcome::Rewritten {
                replaced: 1,
                inserted: 0
            }
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = 2\nkeep me\n");

        assert_eq!(patcher.apply(&rules).unwrap(), PatchOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&path).unwrap(), "version = 2\nkeep me\n");
    }

    #[test]
    fn apply_leaves_no_temporary_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        fs::write(&path, "a\n").unwrap();

        LinePatcher::new(&path)
            .apply(&[PatchRule::replace("a", "b").unwrap()])
            .unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("file.txt")]);
    }

    #[test]
    fn apply_on_missing_file_is_access_error() {
        let dir = tempdir().unwrap();
        let err = LinePatcher::new(dir.path().join("absent.txt"))
            .apply(&[])
            .unwrap_err();
        assert!(matches!(err, BumpError::FileAccess { .. }));
    }

    #[test]
    fn write_atomic_failure_keeps_original_and_cleans_up() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target_is_dir");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("inner"), "keep").unwrap();

        let err = write_atomic(&target, "new").unwrap_err();
        assert!(matches!(err, BumpError::FileAccess { .. }));

        assert_eq!(fs::read_to_string(target.join("inner")).unwrap(), "keep");
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("target_is_dir")]);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("script.sh");
        fs::write(&path, "echo 1\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        write_atomic(&path, "echo 2\n").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo 2\n");
    }
}
