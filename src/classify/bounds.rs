//! Conflict range generation for a branch

use crate::domain::Version;

/// Core package whose branches are numbered per minor release
pub const CORE_PACKAGE: &str = "drupal/drupal";

/// Build the constraint covering `lowest` up to, but excluding, `highest`
///
/// A range that would be empty widens to the start of the major version,
/// and if it is still empty only `highest` itself is excluded.
pub fn range_constraint(package: &str, lowest: &Version, highest: &Version) -> String {
    let mut lower = if package == CORE_PACKAGE {
        Version::new(highest.major, highest.minor, 0)
    } else {
        lowest.clone()
    };

    if lower == *highest {
        lower = Version::new(highest.major, 0, 0);
    }

    if lower == *highest {
        return format!("={}", highest);
    }

    format!(">={},<{}", lower, highest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(value: &str) -> Version {
        Version::try_parse(value).unwrap()
    }

    #[rstest]
    #[case("drupal/token", "1.0.0", "1.0.5", ">=1.0.0,<1.0.5")]
    #[case("drupal/token", "4.2.0", "4.2.0", ">=4.0.0,<4.2.0")]
    #[case("drupal/token", "4.0.0", "4.0.0", "=4.0.0")]
    #[case("drupal/token", "2.0.0", "2.1.0-rc1", ">=2.0.0,<2.1.0-rc1")]
    #[case("drupal/drupal", "7.0.0", "7.98.0", ">=7.0.0,<7.98.0")]
    #[case("drupal/drupal", "10.2.0", "10.2.3", ">=10.2.0,<10.2.3")]
    #[case("drupal/drupal", "10.0.0", "10.2.0", ">=10.0.0,<10.2.0")]
    #[case("drupal/drupal", "11.0.0", "11.0.0", "=11.0.0")]
    fn test_range_constraint(
        #[case] package: &str,
        #[case] lowest: &str,
        #[case] highest: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(range_constraint(package, &v(lowest), &v(highest)), expected);
    }
}
