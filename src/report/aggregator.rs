//! Building the compatibility report
//!
//! The report joins two views of the same catalog: every tagged release of
//! each project, and only the releases compatible with the target. The
//! filtered view decides compatibility, the full view supplies the latest
//! release of each project.

use super::model::{CompatibilityReport, ProjectCompatibility, TypeStats};
use crate::classify::core_compat::parse_release_requirement;
use crate::classify::CoreTarget;
use crate::domain::{ProjectCatalogEntry, ProjectType, ReleaseRecord, Version};
use crate::error::ProjectError;
use crate::registry::ReleaseHistory;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Project types that never appear in the report
const EXCLUDED_TYPES: [&str; 3] = ["project_core", "project_general", "project_distribution"];

/// Build the catalog entry of a project
///
/// With a target, only releases compatible with it are kept. Returns
/// `Ok(None)` for projects the report does not cover and an error for a
/// project type the report cannot group.
pub fn catalog_entry(
    history: &ReleaseHistory,
    filter: Option<&CoreTarget>,
) -> Result<Option<ProjectCatalogEntry>, ProjectError> {
    if EXCLUDED_TYPES.contains(&history.project_type.as_str()) {
        return Ok(None);
    }

    let Some(package) = history.package_name() else {
        debug!(project = %history.short_name, "skipping project with invalid package name");
        return Ok(None);
    };

    let mut releases = Vec::new();
    for release in &history.releases {
        let Some(version) = Version::try_parse(&release.version) else {
            warn!(project = %history.short_name, version = %release.version, "Unable to parse release version");
            continue;
        };

        if let Some(target) = filter {
            match parse_release_requirement(history, release) {
                Some(requirement) if target.accepts(&requirement) => {}
                _ => continue,
            }
        }

        let Some(released_at) = release.released_at() else {
            warn!(project = %history.short_name, version = %release.version, "Release has no date");
            continue;
        };
        releases.push(ReleaseRecord::new(version, released_at));
    }

    ProjectCatalogEntry::new(package, &history.title, &history.project_type, releases).map(Some)
}

/// Joins the full and the filtered catalog into a [`CompatibilityReport`]
pub struct CompatibilityAggregator {
    target: String,
}

impl CompatibilityAggregator {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Build the report
    ///
    /// `all` holds every tagged release of each project, `compatible` the
    /// same projects restricted to releases compatible with the target.
    pub fn build(
        &self,
        all: &[ProjectCatalogEntry],
        compatible: &[ProjectCatalogEntry],
    ) -> CompatibilityReport {
        let all_by_id: HashMap<&str, &ProjectCatalogEntry> =
            all.iter().map(|entry| (entry.id(), entry)).collect();

        let mut compatible_by_type: BTreeMap<ProjectType, Vec<ProjectCompatibility>> =
            BTreeMap::new();
        let mut incompatible_by_type: BTreeMap<ProjectType, Vec<ProjectCompatibility>> =
            BTreeMap::new();

        for entry in compatible {
            let latest = all_by_id
                .get(entry.id())
                .and_then(|full| full.latest_release())
                .cloned();

            let project = match entry.first_stable_release() {
                Some(first) => ProjectCompatibility::Compatible {
                    id: entry.id().to_string(),
                    display_name: entry.display_name().to_string(),
                    project_type: entry.project_type(),
                    first_compatible: first.clone(),
                    latest: latest.unwrap_or_else(|| first.clone()),
                },
                None => ProjectCompatibility::Incompatible {
                    id: entry.id().to_string(),
                    display_name: entry.display_name().to_string(),
                    project_type: entry.project_type(),
                    latest,
                },
            };

            let groups = if project.is_compatible() {
                &mut compatible_by_type
            } else {
                &mut incompatible_by_type
            };
            groups.entry(project.project_type()).or_default().push(project);
        }

        for group in compatible_by_type
            .values_mut()
            .chain(incompatible_by_type.values_mut())
        {
            sort_by_display_name(group);
        }

        let mut stats_by_type: BTreeMap<ProjectType, TypeStats> = BTreeMap::new();
        let mut totals = TypeStats::default();
        for project in compatible_by_type
            .values()
            .chain(incompatible_by_type.values())
            .flatten()
        {
            stats_by_type
                .entry(project.project_type())
                .or_default()
                .record(project.is_compatible());
            totals.record(project.is_compatible());
        }

        let mut earliest: Option<&ProjectCompatibility> = None;
        let mut latest: Option<&ProjectCompatibility> = None;
        for project in compatible_by_type.values().flatten() {
            let Some(date) = project.first_compatible().map(|r| r.release_date) else {
                continue;
            };
            if earliest
                .and_then(|p| p.first_compatible())
                .map_or(true, |r| date < r.release_date)
            {
                earliest = Some(project);
            }
            if latest
                .and_then(|p| p.first_compatible())
                .map_or(true, |r| date > r.release_date)
            {
                latest = Some(project);
            }
        }
        let earliest_compatible = earliest.cloned();
        let latest_compatible = latest.cloned();

        let mut projects: Vec<ProjectCompatibility> = compatible_by_type
            .values()
            .chain(incompatible_by_type.values())
            .flatten()
            .cloned()
            .collect();
        sort_by_display_name(&mut projects);

        CompatibilityReport {
            target_core_version: self.target.clone(),
            compatible_by_type,
            incompatible_by_type,
            stats_by_type,
            totals,
            earliest_compatible,
            latest_compatible,
            projects,
        }
    }
}

fn sort_by_display_name(projects: &mut [ProjectCompatibility]) {
    projects.sort_by_cached_key(|p| p.display_name().to_lowercase());
}
