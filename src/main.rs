//! coregate - release history auditor
//!
//! Writes conflict descriptors that keep unsupported, insecure, abandoned or
//! core-incompatible releases out of a project, and reports how much of the
//! contributed ecosystem is ready for a core version.

use anyhow::Context;
use clap::Parser;
use coregate::cli::{CliArgs, Command, ConflictsArgs, KindArg, ReportArgs, SelectionArgs};
use coregate::config::Config;
use coregate::domain::ConflictRangeMap;
use coregate::error::{ConfigError, IoError};
use coregate::orchestrator::{abandoned_conflicts, ConflictKind, Orchestrator, Sources};
use coregate::output::{create_formatter, write_descriptor};
use coregate::progress::Progress;
use coregate::registry::ReleaseHistorySource;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,coregate={}", level))
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let mut config = Config::load_or_default(args.config.as_deref())?;
    tracing::debug!(?config, "configuration loaded");

    match args.command {
        Command::Conflicts(conflicts) => {
            conflicts.validate()?;
            apply_overrides(&mut config, &conflicts.selection)?;
            run_conflicts(&config, conflicts, args.quiet).await?;
        }
        Command::Report(report) => {
            apply_overrides(&mut config, &report.selection)?;
            run_report(&config, report, args.quiet).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn apply_overrides(config: &mut Config, selection: &SelectionArgs) -> Result<(), ConfigError> {
    if let Some(concurrency) = selection.concurrency {
        config.fetch.concurrency = concurrency;
    }
    config.validate()
}

fn orchestrator(config: &Config, sources: &Sources, quiet: bool) -> Orchestrator {
    let source: Arc<dyn ReleaseHistorySource> = sources.release_history.clone();
    Orchestrator::new(source)
        .with_concurrency(config.fetch.concurrency)
        .with_progress(!quiet)
}

async fn run_conflicts(config: &Config, args: ConflictsArgs, quiet: bool) -> anyhow::Result<()> {
    let sources = Sources::from_config(config)?;
    let mut progress = Progress::new(!quiet);

    let conflicts: ConflictRangeMap = match args.kind {
        KindArg::Abandoned => {
            progress.spinner("Reading abandoned projects...");
            let names = sources.listing.abandoned_project_names().await;
            progress.finish_and_clear();
            abandoned_conflicts(&names?)
        }
        kind => {
            let ids = sources
                .project_ids(args.selection.selection(), &mut progress)
                .await?;
            let orchestrator = orchestrator(config, &sources, quiet);
            match kind {
                KindArg::Unsupported => orchestrator.unsupported_conflicts(ids).await?,
                KindArg::Insecure => orchestrator.insecure_conflicts(ids).await?,
                _ => {
                    let target = args.core.as_ref().context("--core is required")?;
                    orchestrator.core_incompatible_conflicts(ids, target).await?
                }
            }
        }
    };

    tracing::info!(
        kind = ConflictKind::from(args.kind).as_str(),
        packages = conflicts.len(),
        "writing conflict descriptor"
    );
    write_output(args.selection.output.as_deref(), |writer| {
        write_descriptor(&conflicts, &config.descriptor, writer)
    })?;
    Ok(())
}

async fn run_report(config: &Config, args: ReportArgs, quiet: bool) -> anyhow::Result<()> {
    let sources = Sources::from_config(config)?;
    let mut progress = Progress::new(!quiet);
    let ids = sources
        .project_ids(args.selection.selection(), &mut progress)
        .await?;

    let report = orchestrator(config, &sources, quiet)
        .compatibility_report(ids, &args.core)
        .await?;

    let color = !args.no_color && args.selection.output.is_none();
    let formatter = create_formatter(args.format.into(), color);
    write_output(args.selection.output.as_deref(), |writer| {
        formatter.format(&report, writer)
    })?;
    Ok(())
}

/// Write to the given file, or to stdout when none is given
fn write_output<F>(path: Option<&Path>, write: F) -> Result<(), IoError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    match path {
        Some(path) => {
            let to_error = |source| IoError::Write {
                path: path.to_path_buf(),
                source,
            };
            let file = File::create(path).map_err(to_error)?;
            let mut writer = BufWriter::new(file);
            write(&mut writer).map_err(to_error)?;
            writer.flush().map_err(to_error)?;
            tracing::info!(path = %path.display(), "output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            write(&mut stdout).map_err(IoError::Stdout)?;
            stdout.flush().map_err(IoError::Stdout)?;
        }
    }
    Ok(())
}
