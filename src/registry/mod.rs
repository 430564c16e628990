//! Package repository adapters
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - Release history XML documents and their parser
//! - Release history service adapter (per-project documents, project list)
//! - Paginated project listing adapter

mod client;
mod document;
mod listing;
mod node_stream;
mod update_status;

pub use client::{effective_retry_after, HttpClient};
pub use document::{
    DetailDocument, ReleaseEntry, ReleaseHistory, SecurityCoverage, INSECURE, SECURITY_UPDATE,
};
pub use listing::{ListingFilter, ListingSource, ListingType, TaxonomyFilter, OBSOLETE, UNSUPPORTED};
pub use node_stream::{split_nodes, NodeSplitter};
pub use update_status::UpdateStatusSource;

use crate::error::RegistryError;
use async_trait::async_trait;

/// Source of per-project release history documents
#[async_trait]
pub trait ReleaseHistorySource: Send + Sync {
    /// Get the source name used in error messages
    fn source_name(&self) -> &'static str;

    /// Fetch the raw release history document of a project
    async fn fetch_document(&self, project_id: &str) -> Result<String, RegistryError>;
}
