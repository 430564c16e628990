//! Compatibility of releases with a target core version

use super::conflict_constraints;
use crate::domain::Constraint;
use crate::error::ConstraintError;
use crate::registry::{ReleaseEntry, ReleaseHistory};
use std::fmt;
use tracing::warn;

/// Short name of the core project
const CORE_PROJECT: &str = "drupal";

const DISTRIBUTION: &str = "project_distribution";

/// The core version or range releases are checked against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreTarget {
    constraint: Constraint,
}

impl CoreTarget {
    /// Parse a target such as `>=10.2`, `^11` or `10.3.1`
    pub fn parse(expression: &str) -> Result<Self, ConstraintError> {
        Ok(Self {
            constraint: Constraint::parse(expression)?,
        })
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Check whether a release declaring `requirement` can run on the target
    ///
    /// An exact target version must satisfy the requirement; a range target
    /// only has to overlap it.
    pub fn accepts(&self, requirement: &Constraint) -> bool {
        match self.constraint.pinned_version() {
            Some(version) => requirement.matches(version),
            None => requirement.intersects(&self.constraint),
        }
    }
}

impl fmt::Display for CoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.constraint, f)
    }
}

/// The core requirement a release declares
///
/// Falls back to the core prefix of legacy versions like `8.x-2.5`.
pub fn release_core_constraint(release: &ReleaseEntry) -> Option<&str> {
    if let Some(compatibility) = &release.core_compatibility {
        return Some(compatibility);
    }
    if release.version.contains(".x-") {
        return release.version.split('-').next();
    }
    None
}

/// Parse the core requirement of a release, logging releases that have none
pub(crate) fn parse_release_requirement(
    history: &ReleaseHistory,
    release: &ReleaseEntry,
) -> Option<Constraint> {
    let Some(requirement) = release_core_constraint(release) else {
        warn!(
            project = %history.short_name,
            version = %release.version,
            project_type = %history.project_type,
            "Core version requirement could not be identified"
        );
        return None;
    };

    match Constraint::parse(requirement) {
        Ok(constraint) => Some(constraint),
        Err(e) => {
            warn!(
                project = %history.short_name,
                version = %release.version,
                constraint = requirement,
                error = %e,
                "Unable to parse core version compatibility"
            );
            None
        }
    }
}

/// Constraints for every release that cannot run on the target
///
/// The core project and distributions are never reported.
pub fn core_incompatible_versions(history: &ReleaseHistory, target: &CoreTarget) -> Vec<String> {
    if history.short_name == CORE_PROJECT || history.project_type == DISTRIBUTION {
        return Vec::new();
    }

    let versions = history
        .releases
        .iter()
        .filter(|release| {
            parse_release_requirement(history, release)
                .is_some_and(|requirement| !target.accepts(&requirement))
        })
        .map(|release| release.version.as_str());

    conflict_constraints(&history.short_name, versions)
}
