//! Release history XML documents
//!
//! The release history feed answers `{project}/current` with either a
//! `<project>` document or an `<error>` document. Only the nodes needed for
//! classification and reporting are kept.

use crate::error::DocumentError;
use chrono::{DateTime, TimeZone, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;

/// Package names accepted by the ecosystem's package manager
static PACKAGE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([_.-]?[a-z0-9]+)*/[a-z0-9](([_.]?|-{0,2})[a-z0-9]+)*$").unwrap()
});

/// Release type term marking a security release
pub const SECURITY_UPDATE: &str = "Security update";

/// Release type term marking a release as retroactively insecure
pub const INSECURE: &str = "Insecure";

/// Outcome of reading one detail document
#[derive(Debug, Clone, PartialEq)]
pub enum DetailDocument {
    Found(ReleaseHistory),
    /// The upstream `<error>` answer, e.g. for projects without releases
    Missing(String),
}

/// Security advisory coverage of a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityCoverage {
    Covered,
    NotCovered,
}

/// Project-level data of a release history document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseHistory {
    pub title: String,
    pub short_name: String,
    pub project_type: String,
    pub project_status: String,
    pub link: String,
    pub composer_namespace: Option<String>,
    pub supported_branches: Vec<String>,
    /// Document order, newest first
    pub releases: Vec<ReleaseEntry>,
}

/// One `<release>` node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseEntry {
    pub name: String,
    pub version: String,
    pub status: String,
    pub date: Option<i64>,
    pub core_compatibility: Option<String>,
    pub security: Option<SecurityCoverage>,
    /// Values of the `Release type` terms
    pub release_types: Vec<String>,
}

impl ReleaseHistory {
    /// Parse a detail or project-list node document
    pub fn parse(xml: &str) -> Result<DetailDocument, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut state = ParseState::default();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    state.open(&e)?;
                }
                Ok(Event::Empty(e)) => {
                    state.open(&e)?;
                    state.close();
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| DocumentError::Xml(e.to_string()))?;
                    state.text.push_str(&text);
                }
                Ok(Event::CData(c)) => {
                    state.text.push_str(&String::from_utf8_lossy(&c));
                }
                Ok(Event::End(_)) => state.close(),
                Ok(Event::Eof) => break,
                Err(e) => return Err(DocumentError::Xml(e.to_string())),
                _ => {}
            }
        }

        state.finish()
    }

    pub fn is_published(&self) -> bool {
        self.project_status == "published"
    }

    /// Package namespace, falling back to `drupal/<short_name>`
    ///
    /// Returns `None` for names the package manager would reject.
    pub fn package_name(&self) -> Option<String> {
        let name = match &self.composer_namespace {
            Some(namespace) if !namespace.is_empty() => namespace.clone(),
            _ => format!("drupal/{}", self.short_name),
        };
        PACKAGE_NAME_RE.is_match(&name).then_some(name)
    }

    /// Releases whose version starts with the branch prefix, newest first
    pub fn releases_in_branch<'a>(
        &'a self,
        branch: &'a str,
    ) -> impl Iterator<Item = &'a ReleaseEntry> + 'a {
        self.releases
            .iter()
            .filter(move |r| r.version.starts_with(branch))
    }
}

impl ReleaseEntry {
    pub fn has_release_type(&self, release_type: &str) -> bool {
        self.release_types.iter().any(|t| t == release_type)
    }

    /// True when a `<security>` node exists without coverage
    pub fn lacks_security_coverage(&self) -> bool {
        self.security == Some(SecurityCoverage::NotCovered)
    }

    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.date.and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    }
}

#[derive(Default)]
struct ParseState {
    path: Vec<String>,
    text: String,
    root: Option<String>,
    project: ReleaseHistory,
    release: Option<ReleaseEntry>,
    term_name: String,
    term_value: String,
}

impl ParseState {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<(), DocumentError> {
        let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
        if self.root.is_none() {
            self.root = Some(name.clone());
        }

        let in_releases = self.at(&["project", "releases"]);
        let in_release = self.at(&["project", "releases", "release"]);
        match name.as_str() {
            "release" if in_releases => self.release = Some(ReleaseEntry::default()),
            "security" if in_release => {
                let mut covered = None;
                for attr in element.attributes() {
                    let attr = attr.map_err(|e| DocumentError::Xml(e.to_string()))?;
                    if attr.key.local_name().as_ref() == b"covered" {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| DocumentError::Xml(e.to_string()))?;
                        covered = Some(value.trim() != "0");
                    }
                }
                if let Some(release) = self.release.as_mut() {
                    release.security = Some(if covered == Some(true) {
                        SecurityCoverage::Covered
                    } else {
                        SecurityCoverage::NotCovered
                    });
                }
            }
            "term" => {
                self.term_name.clear();
                self.term_value.clear();
            }
            _ => {}
        }

        self.path.push(name);
        self.text.clear();
        Ok(())
    }

    fn close(&mut self) {
        let text = std::mem::take(&mut self.text).trim().to_string();
        let path: Vec<&str> = self.path.iter().map(String::as_str).collect();

        match path.as_slice() {
            ["error"] => self.project.title = text,
            ["project", field] => {
                let project = &mut self.project;
                match *field {
                    "title" => project.title = text,
                    "short_name" => project.short_name = text,
                    "type" => project.project_type = text,
                    "project_status" => project.project_status = text,
                    "link" => project.link = text,
                    "composer_namespace" if !text.is_empty() => {
                        project.composer_namespace = Some(text)
                    }
                    "supported_branches" => {
                        project.supported_branches = text
                            .split(',')
                            .map(str::trim)
                            .filter(|b| !b.is_empty())
                            .map(str::to_string)
                            .collect()
                    }
                    _ => {}
                }
            }
            ["project", "releases", "release", field] => {
                if let Some(release) = self.release.as_mut() {
                    match *field {
                        "name" => release.name = text,
                        "version" => release.version = text,
                        "status" => release.status = text,
                        "date" => release.date = text.parse().ok(),
                        "core_compatibility" if !text.is_empty() => {
                            release.core_compatibility = Some(text)
                        }
                        _ => {}
                    }
                }
            }
            ["project", "releases", "release", "terms", "term", "name"] => self.term_name = text,
            ["project", "releases", "release", "terms", "term", "value"] => self.term_value = text,
            ["project", "releases", "release", "terms", "term"] => {
                if self.term_name == "Release type" {
                    if let Some(release) = self.release.as_mut() {
                        release
                            .release_types
                            .push(std::mem::take(&mut self.term_value));
                    }
                }
            }
            ["project", "releases", "release"] => {
                if let Some(release) = self.release.take() {
                    self.project.releases.push(release);
                }
            }
            _ => {}
        }

        self.path.pop();
    }

    fn at(&self, prefix: &[&str]) -> bool {
        self.path.len() == prefix.len() && self.path.iter().zip(prefix).all(|(a, b)| a == b)
    }

    fn finish(self) -> Result<DetailDocument, DocumentError> {
        match self.root.as_deref() {
            Some("error") => Ok(DetailDocument::Missing(self.project.title)),
            Some("project") => {
                if self.project.short_name.is_empty() {
                    return Err(DocumentError::MissingElement {
                        element: "short_name",
                    });
                }
                Ok(DetailDocument::Found(self.project))
            }
            _ => Err(DocumentError::MissingElement { element: "project" }),
        }
    }
}
