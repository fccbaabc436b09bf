use crate::error::{BumpError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Three-part `major.minor.patch` version.
///
/// The text the version was parsed from is kept for rendering, so `2023.2`
/// round-trips as `2023.2` rather than `2023.2.0`. Ordering, equality and
/// hashing only look at the numeric components.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    literal: String,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            literal: format!("{major}.{minor}.{patch}"),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Self::parse_error(input, "empty version string"));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 3 {
            return Err(Self::parse_error(
                input,
                "expected at most three dot-separated components",
            ));
        }

        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse::<u64>().map_err(|_| {
                Self::parse_error(input, &format!("component '{part}' is not a number"))
            })?;
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            literal: trimmed.to_string(),
        })
    }

    /// Text as it appears in the source file (or the canonical form for
    /// constructed versions).
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    fn parse_error(input: &str, reason: &str) -> BumpError {
        BumpError::VersionParse {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for Version {
    type Err = BumpError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.major, self.minor, self.patch).hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

pub fn compare_versions(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

/// Largest version in the set; fails on an empty set.
pub fn max_of<'a, I>(versions: I) -> Result<Version>
where
    I: IntoIterator<Item = &'a Version>,
{
    versions
        .into_iter()
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
        .ok_or(BumpError::EmptyInput("versions"))
}

/// Next plugin version for a platform change.
///
/// The most significant platform component that increased decides the bump:
/// major resets minor and patch, minor resets patch, patch increments patch.
/// An unchanged or regressed platform version leaves the plugin as it is.
pub fn next_plugin_version(
    plugin_version: &Version,
    current_platform: &Version,
    new_platform: &Version,
) -> Version {
    if new_platform.major > current_platform.major {
        return Version::new(plugin_version.major.saturating_add(1), 0, 0);
    }

    if new_platform.minor > current_platform.minor {
        return Version::new(
            plugin_version.major,
            plugin_version.minor.saturating_add(1),
            0,
        );
    }

    if new_platform.patch > current_platform.patch {
        return Version::new(
            plugin_version.major,
            plugin_version.minor,
            plugin_version.patch.saturating_add(1),
        );
    }

    plugin_version.clone()
}
