//! Release version parsing for the catalog's version dialect
//!
//! Two grammars are tried in order:
//! - semver-adjacent: `major.minor[.patch][-prerelease][+build]`
//! - legacy core-prefixed: `<core>.x-<major>.<minor>[-prerelease][+build]`
//!
//! Leading zeros are accepted and dropped, so `8.x-2.05` reads as `2.5.0`.

use crate::error::VersionError;
use regex::{Captures, Regex};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Pre-release and build metadata tail shared by both grammars
const TAIL: &str = r"(?:[._-](?P<prerelease>[._-]?(?:(?:stable|beta|b|rc|RC|alpha|a|patch|pl|p)(?:(?:[.-]?\d+)*)?)?(?:[.-]?dev)?))?(?:\+(?P<build>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$";

static SEMVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<major>0?|[1-9]\d*)\.(?P<minor>0|[0-9]\d*)(?:\.(?P<patch>0|[0-9]\d*))?{}",
        TAIL
    ))
    .unwrap()
});

static CORE_PREFIXED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<core>0|[1-9]\d*)\.x-(?P<major>0|[0-9]\d*)\.(?P<minor>0|[0-9]\d*){}",
        TAIL
    ))
    .unwrap()
});

/// A normalized release version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<String>,
    pub build_metadata: Option<String>,
}

impl Version {
    /// Create a plain release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
            build_metadata: None,
        }
    }

    /// Parse a release version string, trying the semver-adjacent grammar
    /// first and the core-prefixed one second.
    ///
    /// Returns `None` when neither grammar accepts the input.
    pub fn try_parse(value: &str) -> Option<Self> {
        Self::parse_semver(value).or_else(|| Self::parse_core_prefixed(value))
    }

    /// Derive the floor version of a supported branch such as `8.x-2.` or
    /// `3.2008.` by completing it with a zero.
    pub fn from_supported_branch(branch: &str) -> Result<Self, VersionError> {
        let completed = format!("{}0", branch);
        if branch.contains(".x") {
            Self::parse_core_prefixed(&completed)
                .ok_or_else(|| VersionError::new(branch, "core-prefixed branch"))
        } else {
            Self::parse_semver(&completed).ok_or_else(|| VersionError::new(branch, "branch"))
        }
    }

    fn parse_semver(value: &str) -> Option<Self> {
        let caps = SEMVER_RE.captures(value)?;
        Some(Self {
            major: numeric(&caps, "major")?,
            minor: numeric(&caps, "minor")?,
            patch: numeric(&caps, "patch")?,
            pre_release: text(&caps, "prerelease"),
            build_metadata: text(&caps, "build"),
        })
    }

    fn parse_core_prefixed(value: &str) -> Option<Self> {
        let caps = CORE_PREFIXED_RE.captures(value)?;
        Some(Self {
            major: numeric(&caps, "major")?,
            minor: numeric(&caps, "minor")?,
            patch: 0,
            pre_release: text(&caps, "prerelease"),
            build_metadata: text(&caps, "build"),
        })
    }

    /// True for tagged releases without pre-release or build metadata
    pub fn is_stable(&self) -> bool {
        self.pre_release.is_none() && self.build_metadata.is_none()
    }
}

/// Absent or empty groups read as zero; values beyond u64 reject the string
fn numeric(caps: &Captures<'_>, name: &str) -> Option<u64> {
    match caps.name(name).map(|m| m.as_str()) {
        None | Some("") => Some(0),
        Some(digits) => digits.parse().ok(),
    }
}

fn text(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build_metadata {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
            .then_with(|| self.build_metadata.cmp(&other.build_metadata))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
