//! Top-level CLI definition and dispatch.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::json;
use thiserror::Error;

use folder_sentinel::core::config::Config;
use folder_sentinel::core::errors::FsnError;
use folder_sentinel::core::paths::resolve_monitored_path;
use folder_sentinel::daemon;
use folder_sentinel::engine::report::{BatchReport, FolderOutcome, format_bytes};
use folder_sentinel::engine::{BYTES_PER_MB, ScanCoordinator};
use folder_sentinel::logger::{ActivityLog, EventType, LogEntry, Severity};
use folder_sentinel::notify::{Notification, NotificationManager, NotificationSink};
use folder_sentinel::store::{ConfigStore, JsonStore};

/// Folder Sentinel — folder size monitoring with per-folder thresholds.
#[derive(Debug, Parser)]
#[command(
    name = "fsn",
    author,
    version,
    about = "Folder Sentinel - folder size monitor",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Start monitoring a folder.
    Add(AddArgs),
    /// Stop monitoring a folder.
    Remove(RemoveArgs),
    /// List monitored folders with thresholds and last-known status.
    List,
    /// Set the size threshold for a monitored folder.
    SetThreshold(SetThresholdArgs),
    /// Check one folder's size now.
    Check(CheckArgs),
    /// Check all monitored folders now.
    CheckAll,
    /// Run the daily-check daemon in the foreground.
    Daemon,
    /// Show the effective configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, clap::Args)]
struct AddArgs {
    /// Folder to monitor (tilde is expanded).
    path: PathBuf,
    /// Threshold in MB (default 1000).
    #[arg(long, value_name = "MB")]
    threshold: Option<u64>,
}

#[derive(Debug, Clone, clap::Args)]
struct RemoveArgs {
    /// Monitored folder to remove.
    path: PathBuf,
}

#[derive(Debug, Clone, clap::Args)]
struct SetThresholdArgs {
    /// Monitored folder.
    path: PathBuf,
    /// Threshold in MB (clamped to a minimum of 1).
    #[arg(value_name = "MB")]
    threshold: u64,
}

#[derive(Debug, Clone, clap::Args)]
struct CheckArgs {
    /// Folder to check (monitored or not).
    path: PathBuf,
}

#[derive(Debug, Clone, clap::Args)]
struct ConfigArgs {
    /// Print only the config file path.
    #[arg(long)]
    path: bool,
}

#[derive(Debug, Clone, clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    shell: CompletionShell,
}

/// CLI-level errors wrapping engine errors with user-facing context.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine or store failure, surfaced with its FSN code.
    #[error("{0}")]
    Engine(#[from] FsnError),

    /// Terminal or filesystem IO failure outside the engine.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Everything a command needs, built once from the loaded config.
struct AppContext {
    store: Arc<JsonStore>,
    sink: Arc<NotificationManager>,
    log: Arc<ActivityLog>,
    coordinator: ScanCoordinator,
}

impl AppContext {
    fn build(config: &Config) -> Self {
        let store = Arc::new(JsonStore::new(config.paths.state_file.clone()));
        let sink = Arc::new(NotificationManager::from_config(&config.notifications));
        let log = Arc::new(ActivityLog::open(&config.paths.jsonl_log));
        let coordinator = ScanCoordinator::new(
            store.clone() as Arc<dyn ConfigStore>,
            sink.clone() as Arc<dyn NotificationSink>,
            Arc::clone(&log),
            config.scanner.max_depth,
        );
        Self {
            store,
            sink,
            log,
            coordinator,
        }
    }
}

/// Entry point called from `main`.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Add(args) => run_add(cli, &config, args),
        Command::Remove(args) => run_remove(cli, &config, args),
        Command::List => run_list(cli, &config),
        Command::SetThreshold(args) => run_set_threshold(cli, &config, args),
        Command::Check(args) => run_check(cli, &config, args),
        Command::CheckAll => run_check_all(cli, &config),
        Command::Daemon => run_daemon(&config),
        Command::Config(args) => run_config(cli, &config, args),
        Command::Completions(args) => {
            generate(args.shell, &mut Cli::command(), "fsn", &mut io::stdout());
            Ok(())
        }
    }
}

fn run_add(cli: &Cli, config: &Config, args: &AddArgs) -> Result<(), CliError> {
    let ctx = AppContext::build(config);
    let path = resolve_monitored_path(&args.path);

    ctx.store.add_folder(&path)?;
    let threshold = args.threshold.map_or(
        folder_sentinel::store::DEFAULT_THRESHOLD_MB,
        |mb| mb.max(1),
    );
    ctx.store.set_threshold(&path, threshold)?;

    ctx.log.append(
        &LogEntry::new(EventType::FolderAdded, Severity::Info)
            .with_path(&path)
            .with_threshold(threshold * BYTES_PER_MB),
    );

    let name = folder_sentinel::core::paths::display_name(&path);
    ctx.sink.send(&Notification::new(
        "Folder Added",
        format!("Now monitoring: {name}"),
        format!("folder-added-{name}"),
    ));

    if cli.json {
        println!(
            "{}",
            json!({ "added": path, "threshold_mb": threshold })
        );
    } else {
        println!(
            "Monitoring {} with a {} threshold",
            path.display(),
            format_bytes(threshold * BYTES_PER_MB)
        );
    }
    Ok(())
}

fn run_remove(cli: &Cli, config: &Config, args: &RemoveArgs) -> Result<(), CliError> {
    let ctx = AppContext::build(config);
    let path = resolve_monitored_path(&args.path);

    ctx.store.remove_folder(&path)?;
    ctx.log
        .append(&LogEntry::new(EventType::FolderRemoved, Severity::Info).with_path(&path));

    let name = folder_sentinel::core::paths::display_name(&path);
    ctx.sink.send(&Notification::new(
        "Folder Removed",
        format!("'{name}' is no longer being monitored."),
        format!("folder-removed-{name}"),
    ));

    if cli.json {
        println!("{}", json!({ "removed": path }));
    } else {
        println!("No longer monitoring {}", path.display());
    }
    Ok(())
}

fn run_list(cli: &Cli, config: &Config) -> Result<(), CliError> {
    let ctx = AppContext::build(config);
    let folders = ctx.store.folders()?;

    if cli.json {
        let mut entries = Vec::new();
        for folder in &folders {
            entries.push(json!({
                "path": folder,
                "threshold_mb": ctx.store.threshold_mb(folder)?,
                "exceeded": ctx.store.was_exceeded(folder)?,
            }));
        }
        println!("{}", json!({ "folders": entries }));
        return Ok(());
    }

    if folders.is_empty() {
        println!("No folders configured. Add one with: fsn add <path>");
        return Ok(());
    }

    for folder in &folders {
        let threshold = ctx.store.threshold_mb(folder)?;
        let status = if ctx.store.was_exceeded(folder)? {
            "EXCEEDS".red().bold()
        } else {
            "OK".green()
        };
        println!(
            "{}  threshold {}  [{status}]",
            folder.display(),
            format_bytes(threshold * BYTES_PER_MB)
        );
    }
    Ok(())
}

fn run_set_threshold(cli: &Cli, config: &Config, args: &SetThresholdArgs) -> Result<(), CliError> {
    let ctx = AppContext::build(config);
    let path = resolve_monitored_path(&args.path);

    if !ctx.store.folders()?.contains(&path) {
        return Err(FsnError::NotMonitored { path }.into());
    }

    let threshold = args.threshold.max(1);
    ctx.store.set_threshold(&path, threshold)?;
    ctx.log.append(
        &LogEntry::new(EventType::ThresholdUpdated, Severity::Info)
            .with_path(&path)
            .with_threshold(threshold * BYTES_PER_MB),
    );

    let name = folder_sentinel::core::paths::display_name(&path);
    let formatted = format_bytes(threshold * BYTES_PER_MB);
    ctx.sink.send(&Notification::new(
        "Threshold Updated",
        format!("Threshold for {name} set to {formatted}"),
        format!("threshold-updated-{name}"),
    ));

    if cli.json {
        println!(
            "{}",
            json!({ "path": path, "threshold_mb": threshold })
        );
    } else {
        println!("Threshold for {name} set to {formatted}");
    }
    Ok(())
}

fn run_check(cli: &Cli, config: &Config, args: &CheckArgs) -> Result<(), CliError> {
    let ctx = AppContext::build(config);

    let handle = match ctx.coordinator.check_folder(&args.path) {
        Ok(handle) => handle,
        Err(e) if e.is_busy() => {
            eprintln!("Scan in progress. Please wait for the current scan to complete.");
            return Err(e.into());
        }
        Err(e @ FsnError::FolderNotFound { .. }) => {
            eprintln!("{e}");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let report = handle.wait()?;
    print_report(cli, &report);
    Ok(())
}

fn run_check_all(cli: &Cli, config: &Config) -> Result<(), CliError> {
    let ctx = AppContext::build(config);

    let handle = match ctx.coordinator.check_all(Local::now().date_naive()) {
        Ok(handle) => handle,
        Err(e) if e.is_busy() => {
            eprintln!("Scan in progress. Please wait for the current scan to complete.");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    // Stream per-folder results as they complete, in stored order.
    if !cli.json {
        for outcome in handle.events() {
            print_outcome(&outcome);
        }
    }
    let report = handle.wait()?;
    if cli.json {
        print_report(cli, &report);
    } else if report.outcomes.is_empty() {
        println!("No folders configured. Add one with: fsn add <path>");
    }
    Ok(())
}

fn run_daemon(config: &Config) -> Result<(), CliError> {
    let ctx = AppContext::build(config);
    let signals = daemon::SignalHandler::new();
    daemon::run(config, &ctx.coordinator, &ctx.log, &signals)?;
    Ok(())
}

fn run_config(cli: &Cli, config: &Config, args: &ConfigArgs) -> Result<(), CliError> {
    if args.path {
        println!("{}", config.paths.config_file.display());
        return Ok(());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(config).map_err(FsnError::from)?);
    } else {
        let rendered = toml::to_string_pretty(config).map_err(|e| FsnError::Serialization {
            context: "toml",
            details: e.to_string(),
        })?;
        print!("{rendered}");
    }
    Ok(())
}

fn print_outcome(outcome: &FolderOutcome) {
    match outcome {
        FolderOutcome::Scanned(result) => {
            let status = if result.exceeded {
                "EXCEEDS".red().bold()
            } else {
                "OK".green()
            };
            println!(
                "{}: {} / {} [{status}]",
                result.name,
                format_bytes(result.size_bytes),
                format_bytes(result.threshold_bytes)
            );
        }
        FolderOutcome::NotFound { name, .. } => {
            println!("{name}: {}", "not found".yellow());
        }
    }
}

fn print_report(cli: &Cli, report: &BatchReport) {
    if cli.json {
        let outcomes: Vec<serde_json::Value> = report
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                FolderOutcome::Scanned(result) => json!({
                    "path": result.path,
                    "name": result.name,
                    "size_bytes": result.size_bytes,
                    "threshold_bytes": result.threshold_bytes,
                    "exceeded": result.exceeded,
                }),
                FolderOutcome::NotFound { path, name } => json!({
                    "path": path,
                    "name": name,
                    "not_found": true,
                }),
            })
            .collect();
        println!(
            "{}",
            json!({ "any_exceeded": report.any_exceeded(), "folders": outcomes })
        );
        return;
    }

    for outcome in &report.outcomes {
        print_outcome(outcome);
    }
}
