//! Release classification
//!
//! Turns one project's release history into the version constraints a
//! package manager should refuse:
//! - unsupported releases (outside supported branches or security coverage)
//! - insecure windows per supported branch
//! - releases incompatible with a target core version

pub mod bounds;
pub mod core_compat;
pub mod insecure;
pub mod unsupported;

pub use bounds::range_constraint;
pub use core_compat::{core_incompatible_versions, release_core_constraint, CoreTarget};
pub use insecure::{branch_bounds, insecure_ranges, BoundKind, BranchBound};
pub use unsupported::unsupported_versions;

use crate::domain::Version;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// `10.x-dev`, `9.x-dev`
static CORE_DEV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[1-9]\d*\.x-dev$").unwrap());

/// `2.0.x-dev`, `8.x-1.x-dev`
static DEV_BRANCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[1-9]\d*\.x-)?(?P<tag>(?:0|[1-9]\d*)\.(?:x|(?:0|[1-9]\d*)\.x)-dev)$").unwrap()
});

/// Map a release version string to the constraint that excludes it
///
/// Development branches stay literal tags, tagged releases are emitted in
/// canonical form. Returns `None` (and logs) for unparseable versions.
pub fn conflict_constraint_for(project: &str, version: &str) -> Option<String> {
    if CORE_DEV_RE.is_match(version) {
        return Some(version.to_string());
    }

    if let Some(caps) = DEV_BRANCH_RE.captures(version) {
        return Some(caps["tag"].to_string());
    }

    match Version::try_parse(version) {
        Some(parsed) => Some(parsed.to_string()),
        None => {
            warn!(project, version, "Unable to parse version");
            None
        }
    }
}

/// Map every version, dropping the ones that cannot be expressed
pub(crate) fn conflict_constraints<'a, I>(project: &str, versions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut constraints: Vec<String> = Vec::new();
    for constraint in versions
        .into_iter()
        .filter_map(|v| conflict_constraint_for(project, v))
    {
        if !constraints.contains(&constraint) {
            constraints.push(constraint);
        }
    }
    constraints
}
