//! Audit workflows
//!
//! This module provides:
//! - Project selection: explicit identifiers, the streamed project list or
//!   the paginated listing
//! - Conflict workflows: fetch → classify → merge into a [`ConflictRangeMap`]
//! - The compatibility workflow: fetch → catalog entries → report
//!
//! Each workflow reads every release history once; transport failures end
//! the run, anomalies inside a document only drop that project's data.

use crate::classify::{
    core_incompatible_versions, insecure_ranges, unsupported_versions, CoreTarget,
};
use crate::config::Config;
use crate::domain::ConflictRangeMap;
use crate::error::{AppError, FetchError};
use crate::fetch::FetchOrchestrator;
use crate::progress::Progress;
use crate::registry::{
    HttpClient, ListingFilter, ListingSource, ReleaseHistory, ReleaseHistorySource,
    UpdateStatusSource,
};
use crate::report::{catalog_entry, CompatibilityAggregator, CompatibilityReport};
use std::sync::Arc;
use tracing::{debug, info};

/// Where the project identifiers of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelection {
    /// Identifiers given by the user
    Explicit(Vec<String>),
    /// The streamed project list of the release history service
    ProjectList,
    /// The paginated project listing
    Listing,
}

/// Kinds of conflict descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Unsupported,
    Insecure,
    CoreIncompatible,
    Abandoned,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Unsupported => "unsupported",
            ConflictKind::Insecure => "insecure",
            ConflictKind::CoreIncompatible => "core-incompatible",
            ConflictKind::Abandoned => "abandoned",
        }
    }
}

/// Adapters built from the configuration
pub struct Sources {
    pub release_history: Arc<UpdateStatusSource>,
    pub listing: ListingSource,
}

impl Sources {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = HttpClient::from_config(&config.http)?;
        let release_history = Arc::new(UpdateStatusSource::new(
            client.clone(),
            &config.sources.release_history_url,
        ));
        let listing = ListingSource::new(client, &config.sources.listing_url)?
            .with_concurrency(config.fetch.concurrency);
        Ok(Self {
            release_history,
            listing,
        })
    }

    /// Resolve the identifiers of a run
    pub async fn project_ids(
        &self,
        selection: ProjectSelection,
        progress: &mut Progress,
    ) -> Result<Vec<String>, FetchError> {
        let ids = match selection {
            ProjectSelection::Explicit(ids) => ids,
            ProjectSelection::ProjectList => {
                progress.spinner("Reading project list...");
                let ids = self.release_history.project_ids().await;
                progress.finish_and_clear();
                ids?
            }
            ProjectSelection::Listing => {
                progress.spinner("Reading project listing...");
                let ids = self
                    .listing
                    .project_names(&ListingFilter::all_projects())
                    .await;
                progress.finish_and_clear();
                ids?
            }
        };
        info!(count = ids.len(), "selected projects");
        Ok(ids)
    }
}

/// Runs the audit workflows over a release history source
pub struct Orchestrator {
    fetcher: FetchOrchestrator,
    show_progress: bool,
}

impl Orchestrator {
    /// Create an orchestrator over the given source
    pub fn new(source: Arc<dyn ReleaseHistorySource>) -> Self {
        Self {
            fetcher: FetchOrchestrator::new(source),
            show_progress: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.fetcher = self.fetcher.with_concurrency(concurrency);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Unsupported releases of every project
    pub async fn unsupported_conflicts(
        &self,
        ids: Vec<String>,
    ) -> Result<ConflictRangeMap, FetchError> {
        self.collect_conflicts(ids, |history, _| unsupported_versions(history))
            .await
    }

    /// Insecure release windows of every project
    pub async fn insecure_conflicts(&self, ids: Vec<String>) -> Result<ConflictRangeMap, FetchError> {
        self.collect_conflicts(ids, insecure_ranges).await
    }

    /// Releases of every project that cannot run on the target
    pub async fn core_incompatible_conflicts(
        &self,
        ids: Vec<String>,
        target: &CoreTarget,
    ) -> Result<ConflictRangeMap, FetchError> {
        self.collect_conflicts(ids, |history, _| {
            core_incompatible_versions(history, target)
        })
        .await
    }

    /// Compatibility report of every project with the target
    ///
    /// Each document yields both the unfiltered and the filtered catalog
    /// entry of its project. A project of unknown type ends the run.
    pub async fn compatibility_report(
        &self,
        ids: Vec<String>,
        target: &CoreTarget,
    ) -> Result<CompatibilityReport, AppError> {
        let mut all = Vec::new();
        let mut compatible = Vec::new();

        self.fetch_all(ids, |_, history| -> Result<(), AppError> {
            let full = catalog_entry(&history, None)?;
            match (full, catalog_entry(&history, Some(target))?) {
                (Some(full), Some(filtered)) => {
                    all.push(full);
                    compatible.push(filtered);
                }
                _ => debug!(project = %history.short_name, "not part of the report"),
            }
            Ok(())
        })
        .await?;

        info!(projects = compatible.len(), target = %target, "building compatibility report");
        Ok(CompatibilityAggregator::new(target.to_string()).build(&all, &compatible))
    }

    async fn collect_conflicts<F>(
        &self,
        ids: Vec<String>,
        classify: F,
    ) -> Result<ConflictRangeMap, FetchError>
    where
        F: Fn(&ReleaseHistory, &str) -> Vec<String>,
    {
        let mut conflicts = ConflictRangeMap::new();
        self.fetch_all(ids, |_, history| {
            let Some(package) = history.package_name() else {
                debug!(project = %history.short_name, "skipping project with invalid package name");
                return Ok::<_, FetchError>(());
            };
            let constraints = classify(&history, &package);
            if !constraints.is_empty() {
                conflicts.extend(&package, constraints);
            }
            Ok(())
        })
        .await?;

        info!(packages = conflicts.len(), "collected conflicts");
        Ok(conflicts)
    }

    async fn fetch_all<H, E>(&self, ids: Vec<String>, handler: H) -> Result<(), E>
    where
        H: FnMut(&str, ReleaseHistory) -> Result<(), E>,
        E: From<FetchError>,
    {
        let mut progress = Progress::new(self.show_progress);
        progress.start(ids.len() as u64, "Fetching release histories");
        let result = self.fetcher.for_each_document(ids, &progress, handler).await;
        progress.finish_and_clear();
        result
    }
}

/// Every release of abandoned projects conflicts
pub fn abandoned_conflicts(names: &[String]) -> ConflictRangeMap {
    let mut conflicts = ConflictRangeMap::new();
    for name in names {
        conflicts.insert(&format!("drupal/{}", name), "*");
    }
    conflicts
}
