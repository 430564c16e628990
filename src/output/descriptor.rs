//! Conflict descriptor writer
//!
//! Serializes a [`ConflictRangeMap`] as a metapackage whose `conflict`
//! section keeps the listed releases from being installed.

use crate::config::DescriptorConfig;
use crate::domain::ConflictRangeMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Core package and the subtree split that mirrors its releases
const CORE_ALIAS: (&str, &str) = ("drupal/drupal", "drupal/core");

#[derive(Debug, Serialize)]
struct Descriptor<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(rename = "type")]
    package_type: &'static str,
    license: &'a str,
    conflict: BTreeMap<String, String>,
}

/// Build the `conflict` section
///
/// Each package's constraints are naturally sorted and joined with `|`.
/// Ranges of the core package are copied to its alias unless the alias has
/// its own entry.
pub fn conflict_section(conflicts: &ConflictRangeMap) -> BTreeMap<String, String> {
    let mut section: BTreeMap<String, String> = conflicts
        .iter()
        .map(|(package, constraints)| {
            let mut sorted = constraints.to_vec();
            sorted.sort_by(|a, b| natural_cmp(a, b));
            (package.to_string(), sorted.join("|"))
        })
        .collect();

    let (core, alias) = CORE_ALIAS;
    if let Some(ranges) = section.get(core).cloned() {
        section.entry(alias.to_string()).or_insert(ranges);
    }
    section
}

/// Write the descriptor as pretty-printed JSON followed by a newline
pub fn write_descriptor(
    conflicts: &ConflictRangeMap,
    settings: &DescriptorConfig,
    writer: &mut dyn Write,
) -> io::Result<()> {
    let descriptor = Descriptor {
        name: &settings.name,
        description: settings.description.as_deref(),
        package_type: "metapackage",
        license: &settings.license,
        conflict: conflict_section(conflicts),
    };
    serde_json::to_writer_pretty(&mut *writer, &descriptor)?;
    writeln!(writer)
}

/// Compare strings treating digit runs as numbers
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x = take_number(&mut left);
                let y = take_number(&mut right);
                let ordering = x
                    .trim_start_matches('0')
                    .len()
                    .cmp(&y.trim_start_matches('0').len())
                    .then_with(|| x.trim_start_matches('0').cmp(y.trim_start_matches('0')));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_cmp() {
        let mut values = vec!["1.10.0", "1.9.0", "1.2.0", "10.0.0", "1.x-dev", ">=1.0.0,<1.0.5"];
        values.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            values,
            vec!["1.2.0", "1.9.0", "1.10.0", "1.x-dev", "10.0.0", ">=1.0.0,<1.0.5"]
        );
    }

    #[test]
    fn test_core_ranges_copied_to_alias() {
        let mut conflicts = ConflictRangeMap::new();
        conflicts.insert("drupal/drupal", ">=10.3.0,<10.3.8");
        conflicts.insert("drupal/token", "1.10.0");
        conflicts.insert("drupal/token", "1.9.0");

        let section = conflict_section(&conflicts);
        assert_eq!(section["drupal/core"], ">=10.3.0,<10.3.8");
        assert_eq!(section["drupal/token"], "1.9.0|1.10.0");
    }

    #[test]
    fn test_existing_alias_entry_is_kept() {
        let mut conflicts = ConflictRangeMap::new();
        conflicts.insert("drupal/drupal", "=7.0.0");
        conflicts.insert("drupal/core", "*");

        let section = conflict_section(&conflicts);
        assert_eq!(section["drupal/core"], "*");
    }

    #[test]
    fn test_write_descriptor() {
        let mut conflicts = ConflictRangeMap::new();
        conflicts.insert("drupal/token", "1.0.0");
        let settings = DescriptorConfig::default();

        let mut out = Vec::new();
        write_descriptor(&conflicts, &settings, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert!(text.ends_with("}\n"));
        assert_eq!(json["name"], "coregate/conflicts");
        assert_eq!(json["type"], "metapackage");
        assert_eq!(json["license"], "MIT");
        assert_eq!(json["conflict"]["drupal/token"], "1.0.0");
        assert!(json.get("description").is_none());
    }
}
