//! Compatibility report data types

use crate::domain::{ProjectType, ReleaseRecord};
use std::collections::BTreeMap;

/// Compatibility of one project with the target core version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectCompatibility {
    /// The project has a stable release for the target
    Compatible {
        id: String,
        display_name: String,
        project_type: ProjectType,
        /// Earliest stable release compatible with the target
        first_compatible: ReleaseRecord,
        /// Most recent tagged release, compatible or not
        latest: ReleaseRecord,
    },
    /// No stable release supports the target
    Incompatible {
        id: String,
        display_name: String,
        project_type: ProjectType,
        latest: Option<ReleaseRecord>,
    },
}

impl ProjectCompatibility {
    pub fn id(&self) -> &str {
        match self {
            Self::Compatible { id, .. } | Self::Incompatible { id, .. } => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Compatible { display_name, .. } | Self::Incompatible { display_name, .. } => {
                display_name
            }
        }
    }

    pub fn project_type(&self) -> ProjectType {
        match self {
            Self::Compatible { project_type, .. } | Self::Incompatible { project_type, .. } => {
                *project_type
            }
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::Compatible { .. })
    }

    pub fn first_compatible(&self) -> Option<&ReleaseRecord> {
        match self {
            Self::Compatible {
                first_compatible, ..
            } => Some(first_compatible),
            Self::Incompatible { .. } => None,
        }
    }

    pub fn latest(&self) -> Option<&ReleaseRecord> {
        match self {
            Self::Compatible { latest, .. } => Some(latest),
            Self::Incompatible { latest, .. } => latest.as_ref(),
        }
    }
}

/// Compatible and incompatible counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeStats {
    pub compatible: usize,
    pub incompatible: usize,
}

impl TypeStats {
    pub fn total(&self) -> usize {
        self.compatible + self.incompatible
    }

    /// Compatible share in percent, 0.0 for an empty group
    pub fn rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.compatible as f64 / total as f64 * 100.0,
        }
    }

    pub(crate) fn record(&mut self, compatible: bool) {
        if compatible {
            self.compatible += 1;
        } else {
            self.incompatible += 1;
        }
    }
}

/// Aggregated compatibility of a catalog with one core target
///
/// Groups are keyed by project type in name order and sorted by display
/// name, case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityReport {
    pub target_core_version: String,
    pub compatible_by_type: BTreeMap<ProjectType, Vec<ProjectCompatibility>>,
    pub incompatible_by_type: BTreeMap<ProjectType, Vec<ProjectCompatibility>>,
    pub stats_by_type: BTreeMap<ProjectType, TypeStats>,
    pub totals: TypeStats,
    /// Compatible project whose first compatible release is the oldest
    pub earliest_compatible: Option<ProjectCompatibility>,
    /// Compatible project whose first compatible release is the newest
    pub latest_compatible: Option<ProjectCompatibility>,
    /// Every project, sorted by display name
    pub projects: Vec<ProjectCompatibility>,
}

impl CompatibilityReport {
    /// Overall compatibility rate in percent
    pub fn rate(&self) -> f64 {
        self.totals.rate()
    }
}
