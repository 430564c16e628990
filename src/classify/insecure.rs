//! Insecure release windows per supported branch
//!
//! Each supported branch yields up to two upper bounds:
//! - the newest release tagged as a security update
//! - the release replacing the newest release tagged insecure, when that
//!   insecure release is not already covered by the security update
//!
//! Every bound becomes a range from the branch floor, see
//! [`range_constraint`](super::range_constraint).

use super::bounds::range_constraint;
use crate::domain::Version;
use crate::registry::{ReleaseHistory, INSECURE, SECURITY_UPDATE};
use tracing::warn;

/// Which release tag produced a bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    SecurityUpdate,
    InsecureReplacement,
}

/// A conflict range derived for one supported branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchBound {
    pub branch: String,
    pub kind: BoundKind,
    pub constraint: String,
}

/// Every bound of every supported branch, in branch order
///
/// Unpublished projects have no supported branches to protect and yield
/// nothing.
pub fn branch_bounds(history: &ReleaseHistory, package: &str) -> Vec<BranchBound> {
    if !history.is_published() {
        return Vec::new();
    }

    let mut bounds = Vec::new();
    for branch in &history.supported_branches {
        let floor = match Version::from_supported_branch(branch) {
            Ok(floor) => floor,
            Err(e) => {
                warn!(project = %history.short_name, %branch, error = %e, "Unable to parse supported branch");
                continue;
            }
        };

        let security = history
            .releases_in_branch(branch)
            .find(|r| r.has_release_type(SECURITY_UPDATE))
            .and_then(|r| parse_release(history, &r.version));

        if let Some(security) = &security {
            bounds.push(BranchBound {
                branch: branch.clone(),
                kind: BoundKind::SecurityUpdate,
                constraint: range_constraint(package, &floor, security),
            });
        }

        let Some(insecure) = history
            .releases_in_branch(branch)
            .find(|r| r.has_release_type(INSECURE))
        else {
            continue;
        };
        let Some(insecure_version) = parse_release(history, &insecure.version) else {
            continue;
        };

        if security.as_ref().is_some_and(|s| *s >= insecure_version) {
            continue;
        }

        let replacement = replacement_for(history, branch, &insecure_version);
        bounds.push(BranchBound {
            branch: branch.clone(),
            kind: BoundKind::InsecureReplacement,
            constraint: range_constraint(package, &floor, &replacement),
        });
    }
    bounds
}

/// Distinct insecure ranges of a project
pub fn insecure_ranges(history: &ReleaseHistory, package: &str) -> Vec<String> {
    let mut ranges: Vec<String> = Vec::new();
    for bound in branch_bounds(history, package) {
        if !ranges.contains(&bound.constraint) {
            ranges.push(bound.constraint);
        }
    }
    ranges
}

/// The oldest release of the branch newer than the insecure one
///
/// Releases are walked newest first and the walk stops at the first release
/// that is not newer. Falls back to the insecure release itself.
fn replacement_for(history: &ReleaseHistory, branch: &str, insecure: &Version) -> Version {
    let mut replacement = None;
    for release in history.releases_in_branch(branch) {
        let Some(version) = parse_release(history, &release.version) else {
            continue;
        };
        if version > *insecure {
            replacement = Some(version);
        } else {
            break;
        }
    }
    replacement.unwrap_or_else(|| insecure.clone())
}

fn parse_release(history: &ReleaseHistory, version: &str) -> Option<Version> {
    let parsed = Version::try_parse(version);
    if parsed.is_none() {
        warn!(project = %history.short_name, version, "Unable to parse version");
    }
    parsed
}
