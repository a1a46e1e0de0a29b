//! seat-inspect - login seat and session inspector
//!
//! This is the main entry point. It wires together:
//! - Configuration loading and command-line overrides
//! - The loginctl login source and leader probe
//! - The inspection pipeline (fetch, build, check)
//! - Text or JSON output

mod render;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use seat_inspect_api::Snapshot;
use seat_inspect_config::{InspectConfig, MAX_CONCURRENCY, load_config, load_config_or_default};
use seat_inspect_core::Inspector;
use seat_inspect_source_api::{LoginSource, ProcessProbe};
use seat_inspect_source_linux::{LinuxProcessProbe, LoginctlSource};
use seat_inspect_util::{
    InspectError, SEAT_INSPECT_CONFIG_ENV, SEAT_INSPECT_LOGINCTL_ENV, config_path_without_env,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// seat-inspect - Inspect login seats, sessions and users
#[derive(Parser, Debug)]
#[command(name = "seat-inspect", version)]
#[command(about = "Inspect login seats, sessions and users and report inconsistencies", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/seat-inspect/config.toml)
    #[arg(short, long, env = SEAT_INSPECT_CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Inspect a saved snapshot instead of querying the login service
    #[arg(long, value_name = "PATH")]
    from_snapshot: Option<PathBuf>,

    /// Write the fetched snapshot as JSON
    #[arg(long, value_name = "PATH")]
    save_snapshot: Option<PathBuf>,

    /// loginctl program override
    #[arg(long, env = SEAT_INSPECT_LOGINCTL_ENV)]
    loginctl: Option<String>,

    /// Maximum concurrent detail queries
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_CONCURRENCY as u64))]
    concurrency: Option<u64>,

    /// Overall fetch deadline in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    deadline: Option<u64>,

    /// Do not probe session leader processes
    #[arg(long)]
    no_probe: bool,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn load_settings(args: &Args) -> Result<InspectConfig, InspectError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_config_or_default(config_path_without_env())?,
    };

    if let Some(program) = &args.loginctl {
        config.fetch.loginctl = program.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.fetch.concurrency = concurrency as usize;
    }
    if let Some(seconds) = args.deadline {
        config.fetch.deadline = Duration::from_secs(seconds);
    }
    if args.no_probe {
        config.fetch.probe_leaders = false;
    }

    debug!(
        loginctl = %config.fetch.loginctl,
        concurrency = config.fetch.concurrency,
        deadline_secs = config.fetch.deadline.as_secs(),
        probe_leaders = config.fetch.probe_leaders,
        disabled_checks = config.checks.disabled.len(),
        "Settings resolved"
    );

    Ok(config)
}

fn read_snapshot(path: &Path) -> Result<Snapshot, InspectError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        InspectError::config(format!("cannot read snapshot {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        InspectError::config(format!("invalid snapshot {}: {}", path.display(), e))
    })
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), InspectError> {
    let content = serde_json::to_string_pretty(snapshot)
        .map_err(|e| InspectError::config(format!("cannot encode snapshot: {}", e)))?;
    std::fs::write(path, content).map_err(|e| {
        InspectError::config(format!("cannot write snapshot {}: {}", path.display(), e))
    })?;
    info!(path = %path.display(), records = snapshot.record_count(), "Snapshot saved");
    Ok(())
}

/// Run one inspection; returns whether warning findings were produced
async fn run(args: &Args) -> Result<bool> {
    let config = load_settings(args).context("Failed to load configuration")?;
    let inspector = Inspector::new(config);

    let snapshot = match &args.from_snapshot {
        Some(path) => {
            info!(path = %path.display(), "Replaying snapshot");
            read_snapshot(path)?
        }
        None => {
            // The first loginctl call happens inside the fetch deadline
            let source: Arc<dyn LoginSource> =
                Arc::new(LoginctlSource::new(inspector.config().fetch.loginctl.clone()));
            info!(source = %source.describe(), "Querying login service");
            let probe: Arc<dyn ProcessProbe> = Arc::new(LinuxProcessProbe::new());
            inspector.fetch(source, Some(probe)).await?
        }
    };

    if let Some(path) = &args.save_snapshot {
        write_snapshot(path, &snapshot)?;
    }

    let inspection = inspector.analyze(&snapshot)?;

    let mut out = std::io::stdout().lock();
    let written = match args.format {
        OutputFormat::Text => render::write_text(&mut out, &inspection),
        OutputFormat::Json => render::write_json(&mut out, &inspection.report()),
    };
    written.and_then(|()| out.flush()).context("Failed to write output")?;

    Ok(inspection.has_warnings())
}

fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    debug!(version = env!("CARGO_PKG_VERSION"), "seat-inspect starting");

    match run(&args).await {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(err) => {
            let fatal = err.downcast_ref::<InspectError>();
            error!(
                kind = fatal.map(InspectError::kind_name).unwrap_or("Other"),
                "Inspection failed"
            );
            eprintln!("seat-inspect: {:#}", err);
            ExitCode::from(fatal.map(InspectError::exit_code).unwrap_or(1))
        }
    }
}
