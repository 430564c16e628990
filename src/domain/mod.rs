//! Core domain models for coregate
//!
//! This module contains the fundamental types used throughout the application:
//! - Release versions in the catalog's version dialect
//! - Range constraints over those versions
//! - Catalog entries and their release records
//! - Conflict range maps produced by classification

mod conflict;
mod constraint;
mod project;
mod version;

pub use conflict::ConflictRangeMap;
pub use constraint::Constraint;
pub use project::{ProjectCatalogEntry, ProjectType, ReleaseRecord};
pub use version::Version;
