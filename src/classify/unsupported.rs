//! Releases outside security coverage

use super::conflict_constraints;
use crate::registry::{ReleaseEntry, ReleaseHistory};

/// Constraints for every release the security team does not cover
///
/// Every release of an unpublished project is unsupported. Otherwise a
/// release is unsupported when it belongs to no supported branch, when its
/// branch is supported but the release itself is not covered, or when it is
/// a `0.x` release.
pub fn unsupported_versions(history: &ReleaseHistory) -> Vec<String> {
    let versions = history
        .releases
        .iter()
        .filter(|release| !history.is_published() || is_unsupported(history, release))
        .map(|release| release.version.as_str());

    conflict_constraints(&history.short_name, versions)
}

fn is_unsupported(history: &ReleaseHistory, release: &ReleaseEntry) -> bool {
    let in_supported_branch = history
        .supported_branches
        .iter()
        .any(|branch| release.version.starts_with(branch.as_str()));

    (in_supported_branch && release.lacks_security_coverage())
        || !in_supported_branch
        || release.version.starts_with("0.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SecurityCoverage;

    fn release(version: &str, security: Option<SecurityCoverage>) -> ReleaseEntry {
        ReleaseEntry {
            name: format!("token {}", version),
            version: version.to_string(),
            status: "published".to_string(),
            security,
            ..Default::default()
        }
    }

    fn history(status: &str, branches: &[&str], releases: Vec<ReleaseEntry>) -> ReleaseHistory {
        ReleaseHistory {
            title: "Token".to_string(),
            short_name: "token".to_string(),
            project_type: "project_module".to_string(),
            project_status: status.to_string(),
            supported_branches: branches.iter().map(|b| b.to_string()).collect(),
            releases,
            ..Default::default()
        }
    }

    #[test]
    fn test_unpublished_project_is_fully_unsupported() {
        let h = history(
            "unpublished",
            &["1.0."],
            vec![
                release("1.0.1", Some(SecurityCoverage::Covered)),
                release("1.0.x-dev", None),
            ],
        );
        assert_eq!(unsupported_versions(&h), vec!["1.0.1", "1.0.x-dev"]);
    }

    #[test]
    fn test_published_project() {
        let h = history(
            "published",
            &["8.x-1.", "2.1."],
            vec![
                release("2.1.3", Some(SecurityCoverage::Covered)),
                release("2.1.0-alpha1", Some(SecurityCoverage::NotCovered)),
                release("2.0.5", Some(SecurityCoverage::Covered)),
                release("8.x-1.9", Some(SecurityCoverage::Covered)),
                release("8.x-1.x-dev", None),
                release("7.x-1.4", None),
            ],
        );
        assert_eq!(
            unsupported_versions(&h),
            vec!["2.1.0-alpha1", "2.0.5", "1.4.0"]
        );
    }

    #[test]
    fn test_zero_major_releases_are_unsupported() {
        let h = history(
            "published",
            &["0.3."],
            vec![
                release("0.3.1", Some(SecurityCoverage::Covered)),
                release("1.0.0", Some(SecurityCoverage::Covered)),
            ],
        );
        assert_eq!(unsupported_versions(&h), vec!["0.3.1", "1.0.0"]);
    }

    #[test]
    fn test_unparseable_versions_are_skipped() {
        let h = history("published", &[], vec![release("2.0-unstable1", None)]);
        assert!(unsupported_versions(&h).is_empty());
    }
}
