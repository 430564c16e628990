//! Core compatibility report

mod aggregator;
mod model;

pub use aggregator::{catalog_entry, CompatibilityAggregator};
pub use model::{CompatibilityReport, ProjectCompatibility, TypeStats};
