//! `dwell` command line: run the tracker and manage its data.

#![allow(clippy::print_stdout, reason = "command output goes to stdout")]

use clap::{Parser, Subcommand};
use dwell_lib::classifier::Classifier;
use dwell_lib::config::TrackerConfig;
use dwell_lib::store::{ActivityStore, SqliteStore};
use dwell_lib::website::{extract_domain, is_browser, normalize_domain};
use dwell_lib::{build_tracker, default_db_path, open_store, AppError, InitError};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "dwell")]
#[command(version)]
#[command(about = "Turns foreground-window polling into clean usage sessions", long_about = None)]
struct Cli {
    /// Database file (defaults to the per-user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the foreground window until interrupted
    Run {
        /// Stop after this many seconds
        #[arg(long)]
        for_secs: Option<u64>,
    },

    /// Turn focus mode on or off, or show whether it is on
    Focus {
        #[command(subcommand)]
        action: FocusAction,
    },

    /// Add an application or website to the block list
    Block {
        #[command(subcommand)]
        target: BlockTarget,
    },

    /// Remove an application or website from the block list
    Unblock {
        #[command(subcommand)]
        target: BlockTarget,
    },

    /// List blocked applications and websites
    Blocked,

    /// Show recent sessions
    Sessions {
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show how an executable name is classified
    Classify { executable: String },

    /// Show which domain a browser window title resolves to
    Extract { title: String },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum FocusAction {
    On,
    Off,
    Status,
}

#[derive(Subcommand)]
enum BlockTarget {
    /// Application name or executable
    App { name: String },
    /// URL or domain
    Site { site: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    App(#[from] AppError),
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.clone().or_else(TrackerConfig::config_path);

    match cli.command {
        Commands::Run { for_secs } => {
            let config = load_config(config_path.as_deref())?;
            cmd_run(&store(cli.db.as_deref())?, &config, for_secs)
        }
        Commands::Focus { action } => cmd_focus(&store(cli.db.as_deref())?, &action),
        Commands::Block { target } => {
            let config = load_config(config_path.as_deref())?;
            cmd_block(&store(cli.db.as_deref())?, &config, &target)
        }
        Commands::Unblock { target } => {
            let config = load_config(config_path.as_deref())?;
            cmd_unblock(&store(cli.db.as_deref())?, &config, &target)
        }
        Commands::Blocked => cmd_blocked(&store(cli.db.as_deref())?),
        Commands::Sessions { limit, json } => cmd_sessions(&store(cli.db.as_deref())?, limit, json),
        Commands::Classify { executable } => {
            let config = load_config(config_path.as_deref())?;
            cmd_classify(&config, &executable);
            Ok(())
        }
        Commands::Extract { title } => {
            let config = load_config(config_path.as_deref())?;
            cmd_extract(&config, &title);
            Ok(())
        }
        Commands::Config { action } => cmd_config(config_path.as_deref(), &action),
    }
}

fn store(db: Option<&Path>) -> Result<SqliteStore, CliError> {
    let path = match db {
        Some(path) => path.to_path_buf(),
        None => default_db_path()?,
    };
    Ok(open_store(&path)?)
}

fn load_config(path: Option<&Path>) -> Result<TrackerConfig, CliError> {
    let config = match path {
        Some(path) => TrackerConfig::load_from(path),
        None => Ok(TrackerConfig::default()),
    };
    Ok(config.map_err(InitError::Config)?)
}

fn cmd_run(store: &SqliteStore, config: &TrackerConfig, for_secs: Option<u64>) -> Result<(), CliError> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| AppError::Internal(format!("Error setting Ctrl+C handler: {e}")))?;

    let tracker = build_tracker(store, config);
    let status = tracker.status();
    tracker.start()?;
    info!("Tracking; press Ctrl+C to stop");

    let deadline = for_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    while running.load(Ordering::SeqCst) && status.is_running() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        thread::sleep(Duration::from_millis(200));
    }

    tracker.stop();
    if status.is_degraded() {
        error!("Some sessions could not be saved; check the database");
    }
    Ok(())
}

fn cmd_focus(store: &SqliteStore, action: &FocusAction) -> Result<(), CliError> {
    match action {
        FocusAction::On => {
            store.set_focus_mode_enabled(true)?;
            println!("Focus mode on");
        }
        FocusAction::Off => {
            store.set_focus_mode_enabled(false)?;
            println!("Focus mode off");
        }
        FocusAction::Status => {
            let enabled = store.is_focus_mode_enabled()?;
            println!("Focus mode {}", if enabled { "on" } else { "off" });
        }
    }
    Ok(())
}

fn cmd_block(store: &SqliteStore, config: &TrackerConfig, target: &BlockTarget) -> Result<(), CliError> {
    match target {
        BlockTarget::App { name } => {
            let classifier = Classifier::new(&config.applications, &config.domain_rules);
            let stored = store.block_application(name, &classifier)?;
            println!("Blocked application {stored}");
        }
        BlockTarget::Site { site } => {
            let stored = store.block_website(site)?;
            println!("Blocked website {stored}");
        }
    }
    Ok(())
}

fn cmd_unblock(store: &SqliteStore, config: &TrackerConfig, target: &BlockTarget) -> Result<(), CliError> {
    let (removed, what) = match target {
        BlockTarget::App { name } => {
            let classifier = Classifier::new(&config.applications, &config.domain_rules);
            (store.unblock_application(name, &classifier)?, name)
        }
        BlockTarget::Site { site } => (store.unblock_website(site)?, site),
    };
    if removed {
        println!("Unblocked {what}");
    } else {
        println!("{what} was not blocked");
    }
    Ok(())
}

fn cmd_blocked(store: &SqliteStore) -> Result<(), CliError> {
    let apps = store.blocked_applications()?;
    let sites = store.blocked_websites()?;

    println!("Applications:");
    if apps.is_empty() {
        println!("  (none)");
    }
    for app in apps {
        println!("  {}", app.name);
    }

    println!("Websites:");
    if sites.is_empty() {
        println!("  (none)");
    }
    for site in sites {
        println!("  {}", site.domain);
    }
    Ok(())
}

fn cmd_sessions(store: &SqliteStore, limit: u32, json: bool) -> Result<(), CliError> {
    let entries = store.recent_activity(limit)?;

    if json {
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        println!("{out}");
        return Ok(());
    }

    if entries.is_empty() {
        println!("No sessions recorded yet");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:>6}s  {:<11}  {}",
            entry.start_time.format("%Y-%m-%d %H:%M:%S"),
            entry.duration_secs,
            entry.category,
            entry.label
        );
    }
    Ok(())
}

fn cmd_classify(config: &TrackerConfig, executable: &str) {
    let classifier = Classifier::new(&config.applications, &config.domain_rules);
    let classification = classifier.classify(executable);
    println!("{}  ({})", classification.display_name, classification.category);
    if is_browser(executable) {
        println!("Browser: the visited domain decides the category");
    }
}

fn cmd_extract(config: &TrackerConfig, title: &str) {
    let classifier = Classifier::new(&config.applications, &config.domain_rules);
    match extract_domain(title).map(|d| normalize_domain(&d)) {
        Some(domain) => println!("{domain}  ({})", classifier.classify_domain(&domain)),
        None => println!("No domain found"),
    }
}

fn cmd_config(path: Option<&Path>, action: &ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            let config = load_config(path)?;
            let out = serde_json::to_string_pretty(&config)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            println!("{out}");
        }
        ConfigAction::Init => {
            let Some(path) = path else {
                return Err(InitError::NoProjectDirs.into());
            };
            if path.exists() {
                println!("{} already exists", path.display());
            } else {
                TrackerConfig::default().save_to(path)?;
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}
