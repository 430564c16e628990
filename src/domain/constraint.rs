//! Version range constraints
//!
//! Handles the constraint expressions found in release metadata, like:
//! - Comparators: `>=8.8`, `<10`, `=4.2.0`, `8.8.0`
//! - Caret and tilde ranges: `^9.3`, `~8.0`
//! - Wildcards: `8.x`, `10.1.*`, `*`
//! - Hyphen ranges: `1.0 - 2.0`
//! - Conjunctions with `,` or spaces and disjunctions with `||`
//!
//! A parsed constraint is a union of intervals over [`Version`].

use crate::domain::Version;
use crate::error::ConstraintError;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static OPERAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[vV]?(?P<major>\d+)(?:\.(?P<minor>\d+))?(?:\.(?P<patch>\d+))?(?:\.\d+)?(?:[._-]?(?P<pre>(?:stable|beta|b|rc|RC|alpha|a|patch|pl|p|dev)(?:[.-]?\d+)*))?(?:@[a-zA-Z]+)?$",
    )
    .unwrap()
});

static WILDCARD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[vV]?(?P<major>\d+)(?:\.(?P<minor>\d+))?\.[xX*]$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Unbounded,
    Included(Version),
    Excluded(Version),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Interval {
    lower: Bound,
    upper: Bound,
}

/// An immutable parsed constraint expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    source: String,
    alternatives: Vec<Interval>,
}

/// A version operand together with how many numeric parts were written
struct Operand {
    version: Version,
    precision: usize,
}

impl Constraint {
    /// Parse a constraint expression
    pub fn parse(expression: &str) -> Result<Self, ConstraintError> {
        let source = expression.trim();
        if source.is_empty() {
            return Err(ConstraintError::new(expression, "empty constraint"));
        }

        let alternatives = source
            .split("||")
            .flat_map(|part| part.split('|'))
            .map(|part| parse_conjunction(expression, part))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    /// Check whether the version satisfies the constraint
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|i| i.contains(version))
    }

    /// Check whether at least one version satisfies both constraints
    pub fn intersects(&self, other: &Constraint) -> bool {
        self.alternatives.iter().any(|a| {
            other
                .alternatives
                .iter()
                .any(|b| !a.intersect(b).is_empty())
        })
    }

    /// The single version this constraint pins, if it is an exact match
    pub fn pinned_version(&self) -> Option<&Version> {
        match self.alternatives.as_slice() {
            [Interval {
                lower: Bound::Included(l),
                upper: Bound::Included(u),
            }] if l == u => Some(l),
            _ => None,
        }
    }

    /// The expression as written
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_conjunction(expression: &str, part: &str) -> Result<Interval, ConstraintError> {
    let part = part.trim();
    if part.is_empty() {
        return Err(ConstraintError::new(expression, "empty alternative"));
    }

    if let Some((from, to)) = part.split_once(" - ") {
        return hyphen_range(expression, from.trim(), to.trim());
    }

    let mut interval = Interval::full();
    let mut pending_operator = String::new();
    for token in part
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        // `>= 8.8` is written with a space after the operator
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
            pending_operator.push_str(token);
            continue;
        }
        let term = format!("{}{}", pending_operator, token);
        pending_operator.clear();
        interval = interval.intersect(&parse_term(expression, &term)?);
    }

    if !pending_operator.is_empty() {
        return Err(ConstraintError::new(
            expression,
            format!("operator '{}' without a version", pending_operator),
        ));
    }

    Ok(interval)
}

fn parse_term(expression: &str, term: &str) -> Result<Interval, ConstraintError> {
    if term == "*" || term.eq_ignore_ascii_case("x") {
        return Ok(Interval::full());
    }

    if let Some(caps) = WILDCARD_RE.captures(term) {
        let major = number(expression, caps.name("major").map(|m| m.as_str()))?;
        return Ok(match caps.name("minor") {
            Some(minor) => {
                let minor = number(expression, Some(minor.as_str()))?;
                let next = successor(expression, minor)?;
                Interval::half_open(floor(major, minor, 0), floor(major, next, 0))
            }
            None => {
                let next = successor(expression, major)?;
                Interval::half_open(floor(major, 0, 0), floor(next, 0, 0))
            }
        });
    }

    let operators = [">=", "<=", "==", ">", "<", "=", "^", "~"];
    let (operator, operand) = operators
        .iter()
        .find_map(|op| term.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("=", term));
    let Operand { version, precision } = parse_operand(expression, operand)?;

    let interval = match operator {
        ">=" => Interval {
            lower: Bound::Included(lowest_of(&version)),
            upper: Bound::Unbounded,
        },
        ">" => Interval {
            lower: Bound::Excluded(version),
            upper: Bound::Unbounded,
        },
        "<" => Interval {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(lowest_of(&version)),
        },
        "<=" => Interval {
            lower: Bound::Unbounded,
            upper: Bound::Included(version),
        },
        "^" => {
            let upper = if version.major > 0 || precision == 1 {
                floor(successor(expression, version.major)?, 0, 0)
            } else if version.minor > 0 || precision == 2 {
                floor(0, successor(expression, version.minor)?, 0)
            } else {
                floor(0, 0, successor(expression, version.patch)?)
            };
            Interval::half_open(lowest_of(&version), upper)
        }
        "~" => {
            let upper = if precision <= 2 {
                floor(successor(expression, version.major)?, 0, 0)
            } else {
                floor(version.major, successor(expression, version.minor)?, 0)
            };
            Interval::half_open(lowest_of(&version), upper)
        }
        _ => Interval {
            lower: Bound::Included(version.clone()),
            upper: Bound::Included(version),
        },
    };

    Ok(interval)
}

fn hyphen_range(expression: &str, from: &str, to: &str) -> Result<Interval, ConstraintError> {
    let from = parse_operand(expression, from)?;
    let to = parse_operand(expression, to)?;
    let upper = match to.precision {
        1 => Bound::Excluded(floor(successor(expression, to.version.major)?, 0, 0)),
        2 => Bound::Excluded(floor(
            to.version.major,
            successor(expression, to.version.minor)?,
            0,
        )),
        _ => Bound::Included(to.version),
    };
    Ok(Interval {
        lower: Bound::Included(lowest_of(&from.version)),
        upper,
    })
}

fn parse_operand(expression: &str, operand: &str) -> Result<Operand, ConstraintError> {
    let caps = OPERAND_RE.captures(operand).ok_or_else(|| {
        ConstraintError::new(expression, format!("invalid version '{}'", operand))
    })?;

    let precision = ["major", "minor", "patch"]
        .iter()
        .filter(|name| caps.name(name).is_some())
        .count();

    Ok(Operand {
        version: Version {
            major: number(expression, caps.name("major").map(|m| m.as_str()))?,
            minor: number(expression, caps.name("minor").map(|m| m.as_str()))?,
            patch: number(expression, caps.name("patch").map(|m| m.as_str()))?,
            pre_release: caps.name("pre").map(|m| m.as_str().to_string()),
            build_metadata: None,
        },
        precision,
    })
}

/// The next component value, used for exclusive upper bounds
fn successor(expression: &str, value: u64) -> Result<u64, ConstraintError> {
    value.checked_add(1).ok_or_else(|| {
        ConstraintError::new(expression, format!("no upper bound above component {}", value))
    })
}

fn number(expression: &str, digits: Option<&str>) -> Result<u64, ConstraintError> {
    match digits {
        None => Ok(0),
        Some(d) => d
            .parse()
            .map_err(|_| ConstraintError::new(expression, format!("number '{}' out of range", d))),
    }
}

/// The lowest version of a release triple; orders before all of its pre-releases
fn floor(major: u64, minor: u64, patch: u64) -> Version {
    Version {
        major,
        minor,
        patch,
        pre_release: Some(String::new()),
        build_metadata: None,
    }
}

fn lowest_of(version: &Version) -> Version {
    if version.is_stable() {
        floor(version.major, version.minor, version.patch)
    } else {
        version.clone()
    }
}

impl Interval {
    fn full() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    fn half_open(lower: Version, upper: Version) -> Self {
        Self {
            lower: Bound::Included(lower),
            upper: Bound::Excluded(upper),
        }
    }

    fn contains(&self, version: &Version) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(l) => version >= l,
            Bound::Excluded(l) => version > l,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(u) => version <= u,
            Bound::Excluded(u) => version < u,
        };
        above && below
    }

    fn intersect(&self, other: &Interval) -> Interval {
        Interval {
            lower: tighter_lower(&self.lower, &other.lower),
            upper: tighter_upper(&self.upper, &other.upper),
        }
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Included(l), Bound::Included(u)) => l > u,
            (Bound::Included(l), Bound::Excluded(u))
            | (Bound::Excluded(l), Bound::Included(u))
            | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
            _ => false,
        }
    }
}

fn tighter_lower(a: &Bound, b: &Bound) -> Bound {
    let ordering = match (a, b) {
        (Bound::Unbounded, _) => return b.clone(),
        (_, Bound::Unbounded) => return a.clone(),
        (Bound::Included(x), Bound::Included(y)) | (Bound::Excluded(x), Bound::Excluded(y)) => {
            x.cmp(y)
        }
        (Bound::Included(x), Bound::Excluded(y)) => x.cmp(y).then(Ordering::Less),
        (Bound::Excluded(x), Bound::Included(y)) => x.cmp(y).then(Ordering::Greater),
    };
    if ordering == Ordering::Less {
        b.clone()
    } else {
        a.clone()
    }
}

fn tighter_upper(a: &Bound, b: &Bound) -> Bound {
    let ordering = match (a, b) {
        (Bound::Unbounded, _) => return b.clone(),
        (_, Bound::Unbounded) => return a.clone(),
        (Bound::Included(x), Bound::Included(y)) | (Bound::Excluded(x), Bound::Excluded(y)) => {
            x.cmp(y)
        }
        (Bound::Included(x), Bound::Excluded(y)) => x.cmp(y).then(Ordering::Greater),
        (Bound::Excluded(x), Bound::Included(y)) => x.cmp(y).then(Ordering::Less),
    };
    if ordering == Ordering::Greater {
        b.clone()
    } else {
        a.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(s: &str) -> Version {
        Version::try_parse(s).unwrap()
    }

    #[rstest]
    #[case(">=1.2.0,<2.0.0", "1.2.0", true)]
    #[case(">=1.2.0,<2.0.0", "1.9.9", true)]
    #[case(">=1.2.0,<2.0.0", "2.0.0", false)]
    #[case(">=1.2.0 <2.0.0", "1.1.9", false)]
    #[case(">= 8.8", "8.8.0", true)]
    #[case("=4.2.0", "4.2.0", true)]
    #[case("=4.2.0", "4.2.1", false)]
    #[case("4.2.0", "4.2.0", true)]
    #[case("^8.8 || ^9", "9.5.0", true)]
    #[case("^8.8 || ^9", "8.7.0", false)]
    #[case("^8.8 || ^9", "10.0.0", false)]
    #[case("^0.3", "0.3.5", true)]
    #[case("^0.3", "0.4.0", false)]
    #[case("~8.0", "8.9.0", true)]
    #[case("~8.1.2", "8.2.0", false)]
    #[case("8.x", "8.9.3", true)]
    #[case("8.x", "9.0.0", false)]
    #[case("10.1.*", "10.1.7", true)]
    #[case("*", "0.0.1", true)]
    #[case("1.0 - 2.0", "2.0.9", true)]
    #[case("1.0 - 2.0", "2.1.0", false)]
    #[case("<10", "10.0.0-beta1", false)]
    #[case(">8.0.0", "8.0.0", false)]
    #[case("<=8.0.0", "8.0.0", true)]
    fn test_matches(#[case] constraint: &str, #[case] version: &str, #[case] expected: bool) {
        let constraint = Constraint::parse(constraint).unwrap();
        assert_eq!(constraint.matches(&v(version)), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case(">=")]
    #[case("foo")]
    #[case("^^1")]
    #[case("1.0 ||")]
    #[case("8.x-dev")]
    fn test_parse_rejects(#[case] expression: &str) {
        assert!(Constraint::parse(expression).is_err());
    }

    #[rstest]
    #[case("^18446744073709551615")]
    #[case("^0.18446744073709551615")]
    #[case("^0.0.18446744073709551615")]
    #[case("~18446744073709551615.0")]
    #[case("~1.18446744073709551615.0")]
    #[case("18446744073709551615.x")]
    #[case("1.18446744073709551615.*")]
    #[case("1.0 - 18446744073709551615")]
    #[case("^8 || ^18446744073709551615")]
    fn test_upper_bound_past_max_component_is_rejected(#[case] expression: &str) {
        let err = Constraint::parse(expression).unwrap_err();
        assert_eq!(err.constraint, expression);
        assert!(err.message.contains("18446744073709551615"));
    }

    #[test]
    fn test_max_component_without_upper_bound() {
        let constraint = Constraint::parse(">=18446744073709551615").unwrap();
        assert!(constraint.matches(&Version::new(u64::MAX, 0, 0)));
        assert!(!constraint.matches(&Version::new(u64::MAX - 1, 9, 9)));
        assert!(Constraint::parse("18446744073709551615.0.0").is_ok());
    }

    #[test]
    fn test_intersects() {
        let target = Constraint::parse(">=2.0").unwrap();
        assert!(!Constraint::parse("^1").unwrap().intersects(&target));
        assert!(Constraint::parse("^1 || ^2").unwrap().intersects(&target));
        assert!(Constraint::parse("8.x").unwrap().intersects(&target));
        assert!(!Constraint::parse("<2").unwrap().intersects(&target));
    }

    #[test]
    fn test_intersects_touching_bounds() {
        let upto = Constraint::parse("<=2.0.0").unwrap();
        let from = Constraint::parse(">=2.0.0").unwrap();
        assert!(upto.intersects(&from));
        let below = Constraint::parse("<2.0.0").unwrap();
        assert!(!below.intersects(&from));
    }

    #[test]
    fn test_pinned_version() {
        assert_eq!(
            Constraint::parse("11.0.0").unwrap().pinned_version(),
            Some(&Version::new(11, 0, 0))
        );
        assert_eq!(Constraint::parse("^11").unwrap().pinned_version(), None);
    }

    #[test]
    fn test_display_keeps_expression() {
        let constraint = Constraint::parse(" ^9.3 || ^10 ").unwrap();
        assert_eq!(constraint.to_string(), "^9.3 || ^10");
    }

    #[test]
    fn test_matches_is_deterministic() {
        let constraint = Constraint::parse("^9.3 || ^10").unwrap();
        let version = v("10.2.0");
        let first = constraint.matches(&version);
        for _ in 0..10 {
            assert_eq!(constraint.matches(&version), first);
        }
    }
}
