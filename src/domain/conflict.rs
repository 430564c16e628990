//! Per-package lists of version ranges that must not be installed

use std::collections::BTreeMap;

/// Maps a package namespace to its ordered, duplicate-free conflict constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictRangeMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ConflictRangeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constraint unless the package already lists it
    pub fn insert(&mut self, package: &str, constraint: impl Into<String>) {
        let constraint = constraint.into();
        let list = self.entries.entry(package.to_string()).or_default();
        if !list.contains(&constraint) {
            list.push(constraint);
        }
    }

    /// Append several constraints; packages with nothing to add get no entry
    pub fn extend<I, S>(&mut self, package: &str, constraints: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for constraint in constraints {
            self.insert(package, constraint);
        }
    }

    pub fn get(&self, package: &str) -> Option<&[String]> {
        self.entries.get(package).map(Vec::as_slice)
    }

    pub fn contains_package(&self, package: &str) -> bool {
        self.entries.contains_key(package)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending package order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(package, list)| (package.as_str(), list.as_slice()))
    }
}
