//! coregate - release history auditor library
//!
//! This library provides the core functionality for auditing contributed
//! project releases:
//! - Version and constraint parsing across semver and core-prefixed versions
//! - Pooled fetching of release history documents
//! - Classification of unsupported, insecure and core-incompatible releases
//! - Conflict descriptors and core compatibility reports

pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod report;
