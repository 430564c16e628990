//! Catalog entries built from release history documents

use crate::domain::Version;
use crate::error::ProjectError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project types that can appear in a compatibility report
///
/// Variants are declared in name order; reports group by the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Module,
    Profile,
    Theme,
}

impl ProjectType {
    /// Parse an upstream type such as `project_module` or `theme`
    pub fn parse(id: &str, raw: &str) -> Result<Self, ProjectError> {
        match raw.strip_prefix("project_").unwrap_or(raw) {
            "module" => Ok(ProjectType::Module),
            "theme" => Ok(ProjectType::Theme),
            "profile" => Ok(ProjectType::Profile),
            other => Err(ProjectError::InvalidType {
                id: id.to_string(),
                project_type: other.to_string(),
            }),
        }
    }

    /// Lowercase name used as a grouping key
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Module => "module",
            ProjectType::Theme => "theme",
            ProjectType::Profile => "profile",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tagged release of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub version: Version,
    pub release_date: DateTime<Utc>,
}

impl ReleaseRecord {
    pub fn new(version: Version, release_date: DateTime<Utc>) -> Self {
        Self {
            version,
            release_date,
        }
    }
}

/// A project and its releases, ordered by release date ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCatalogEntry {
    id: String,
    display_name: String,
    project_type: ProjectType,
    releases: Vec<ReleaseRecord>,
}

impl ProjectCatalogEntry {
    /// Build an entry, validating the raw project type
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        raw_type: &str,
        mut releases: Vec<ReleaseRecord>,
    ) -> Result<Self, ProjectError> {
        let id = id.into();
        let project_type = ProjectType::parse(&id, raw_type)?;
        releases.sort_by(|a, b| a.release_date.cmp(&b.release_date));
        Ok(Self {
            id,
            display_name: display_name.into(),
            project_type,
            releases,
        })
    }

    /// Package namespace, e.g. `drupal/token`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn project_type(&self) -> ProjectType {
        self.project_type
    }

    pub fn releases(&self) -> &[ReleaseRecord] {
        &self.releases
    }

    /// Earliest release without pre-release or build metadata
    pub fn first_stable_release(&self) -> Option<&ReleaseRecord> {
        self.releases
            .iter()
            .filter(|r| r.version.is_stable())
            .min_by_key(|r| r.release_date)
    }

    /// Most recent release by date, stable or not
    pub fn latest_release(&self) -> Option<&ReleaseRecord> {
        self.releases.iter().max_by_key(|r| r.release_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn release(version: &str, ts: i64) -> ReleaseRecord {
        ReleaseRecord::new(
            Version::try_parse(version).unwrap(),
            Utc.timestamp_opt(ts, 0).unwrap(),
        )
    }

    #[test]
    fn test_project_type_parse() {
        assert_eq!(
            ProjectType::parse("a", "project_module").unwrap(),
            ProjectType::Module
        );
        assert_eq!(ProjectType::parse("a", "theme").unwrap(), ProjectType::Theme);
        assert_eq!(
            ProjectType::parse("a", "project_profile").unwrap(),
            ProjectType::Profile
        );
    }

    #[test]
    fn test_invalid_type_fails_construction() {
        let result = ProjectCatalogEntry::new("drupal/x", "X", "project_distribution", vec![]);
        assert_eq!(
            result.unwrap_err(),
            ProjectError::InvalidType {
                id: "drupal/x".to_string(),
                project_type: "distribution".to_string(),
            }
        );
    }

    #[test]
    fn test_releases_are_ordered_by_date() {
        let entry = ProjectCatalogEntry::new(
            "drupal/token",
            "Token",
            "module",
            vec![release("1.1.0", 300), release("1.0.0", 100)],
        )
        .unwrap();
        let versions: Vec<String> = entry
            .releases()
            .iter()
            .map(|r| r.version.to_string())
            .collect();
        assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_latest_release_picks_newest_date() {
        let entry = ProjectCatalogEntry::new(
            "drupal/token",
            "Token",
            "module",
            vec![release("2.0.0", 200), release("1.5.0", 100)],
        )
        .unwrap();
        assert_eq!(entry.latest_release().unwrap().version, Version::new(2, 0, 0));
    }

    #[test]
    fn test_first_stable_release_skips_prerelease() {
        let entry = ProjectCatalogEntry::new(
            "drupal/token",
            "Token",
            "module",
            vec![
                release("1.0.0-alpha", 100),
                release("1.0.0", 200),
                release("1.1.0", 300),
            ],
        )
        .unwrap();
        let first = entry.first_stable_release().unwrap();
        assert_eq!(first.version, Version::new(1, 0, 0));
        assert_eq!(first.release_date.timestamp(), 200);
    }

    #[test]
    fn test_no_stable_release() {
        let entry = ProjectCatalogEntry::new(
            "drupal/token",
            "Token",
            "module",
            vec![release("1.0.0-beta1", 100), release("1.0.0+meta", 200)],
        )
        .unwrap();
        assert!(entry.first_stable_release().is_none());
        assert!(entry.latest_release().is_some());
    }
}
