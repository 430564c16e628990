//! CLI argument parsing module for coregate

use crate::classify::CoreTarget;
use crate::error::ConfigError;
use crate::orchestrator::{ConflictKind, ProjectSelection};
use crate::output::ReportFormat;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a core target such as `^11` or `>=10.3`
fn parse_core_target(s: &str) -> Result<CoreTarget, String> {
    CoreTarget::parse(s).map_err(|e| e.to_string())
}

/// Audits package releases against security coverage and core compatibility
#[derive(Parser, Debug, Clone)]
#[command(
    name = "coregate",
    version,
    about = "Audit package releases for security coverage and core compatibility"
)]
pub struct CliArgs {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors and hide progress
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a conflict descriptor for the selected kind of releases
    Conflicts(ConflictsArgs),
    /// Write a core compatibility report
    Report(ReportArgs),
}

/// Options shared by every command that reads release histories
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Audit only these projects (can be specified multiple times)
    #[arg(long = "project", value_name = "ID", action = ArgAction::Append)]
    pub projects: Vec<String>,

    /// Where to read the project catalog from
    #[arg(long, value_enum, conflicts_with = "projects")]
    pub catalog: Option<CatalogArg>,

    /// Number of concurrent requests (overrides the configuration)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl SelectionArgs {
    /// The project selection; the streamed project list unless told otherwise
    pub fn selection(&self) -> ProjectSelection {
        if !self.projects.is_empty() {
            return ProjectSelection::Explicit(self.projects.clone());
        }
        match self.catalog.unwrap_or_default() {
            CatalogArg::ProjectList => ProjectSelection::ProjectList,
            CatalogArg::Listing => ProjectSelection::Listing,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConflictsArgs {
    /// Which releases to mark as conflicting
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Target core version or range (required for core-incompatible)
    #[arg(long, value_name = "CONSTRAINT", value_parser = parse_core_target)]
    pub core: Option<CoreTarget>,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

impl ConflictsArgs {
    /// Check option combinations clap cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind {
            KindArg::CoreIncompatible if self.core.is_none() => {
                Err(ConfigError::ConflictingOptions {
                    message: "--core is required for --kind core-incompatible".to_string(),
                })
            }
            KindArg::Abandoned
                if !self.selection.projects.is_empty() || self.selection.catalog.is_some() =>
            {
                Err(ConfigError::ConflictingOptions {
                    message: "--kind abandoned reads its own catalog; drop --project and --catalog"
                        .to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Target core version or range
    #[arg(long, value_name = "CONSTRAINT", value_parser = parse_core_target)]
    pub core: CoreTarget,

    /// Report format
    #[arg(long, value_enum, default_value_t = FormatArg::Markdown)]
    pub format: FormatArg,

    /// Disable colors in text output
    #[arg(long)]
    pub no_color: bool,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Unsupported,
    Insecure,
    CoreIncompatible,
    Abandoned,
}

impl From<KindArg> for ConflictKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Unsupported => ConflictKind::Unsupported,
            KindArg::Insecure => ConflictKind::Insecure,
            KindArg::CoreIncompatible => ConflictKind::CoreIncompatible,
            KindArg::Abandoned => ConflictKind::Abandoned,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogArg {
    /// Streamed project list of the release history service
    #[default]
    ProjectList,
    /// Paginated project listing
    Listing,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Markdown,
    Text,
}

impl From<FormatArg> for ReportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Markdown => ReportFormat::Markdown,
            FormatArg::Text => ReportFormat::Text,
        }
    }
}
