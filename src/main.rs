// reelstats CLI

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use reelstats_lib::{
    synthetic::{SeedOptions, SyntheticHistory},
    AnalyticsService, AnalyticsSettings, Database, EventFilter, PlaybackEvent, SettingsStore,
};

#[derive(Parser)]
#[command(name = "reelstats")]
#[command(about = "Binge sessions, concurrent streams and watch parties from playback history", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite event store
    #[arg(long, global = true, default_value = "reelstats.sqlite3")]
    db: PathBuf,

    /// Analytics settings (JSON); defaults apply when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import playback events from a JSON array
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Generate a synthetic viewing history
    Seed {
        /// Number of users
        #[arg(long, default_value = "6")]
        users: usize,
        /// Days of history ending now
        #[arg(long, default_value = "30")]
        days: u32,
        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Binge-watching sessions report
    Binge(FilterArgs),

    /// Concurrent streams report
    Concurrency(FilterArgs),

    /// Watch parties report
    WatchParties(FilterArgs),

    /// Playback duration statistics
    Durations(FilterArgs),

    /// Show the effective analytics settings
    Settings {
        /// Write the defaults to --config, replacing its contents
        #[arg(long, requires = "config")]
        reset: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Earliest start time (RFC 3339), inclusive
    #[arg(long)]
    start: Option<DateTime<Utc>>,
    /// Latest start time (RFC 3339), inclusive
    #[arg(long)]
    end: Option<DateTime<Utc>>,
    /// Restrict to a username (repeatable)
    #[arg(long = "user")]
    users: Vec<String>,
    /// Restrict to a media type (repeatable)
    #[arg(long = "media-type")]
    media_types: Vec<String>,
}

impl From<FilterArgs> for EventFilter {
    fn from(args: FilterArgs) -> Self {
        EventFilter {
            start_date: args.start,
            end_date: args.end,
            users: args.users,
            media_types: args.media_types,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    reelstats_lib::init_logging();
    let cli = Cli::parse();

    if let Commands::Settings { reset } = cli.command {
        return cmd_settings(cli.config, reset);
    }

    let settings = match &cli.config {
        Some(path) => AnalyticsSettings::load(path)?,
        None => AnalyticsSettings::default(),
    };
    let database = Database::new(cli.db.clone())?;

    match cli.command {
        Commands::Import { file } => cmd_import(&database, file).await,
        Commands::Seed { users, days, seed } => cmd_seed(&database, users, days, seed).await,
        Commands::Binge(filter) => {
            let (service, cancel) = analytics(database, settings);
            print_json(&service.binge_analytics(&filter.into(), &cancel).await?)
        }
        Commands::Concurrency(filter) => {
            let (service, cancel) = analytics(database, settings);
            print_json(&service.concurrent_streams(&filter.into(), &cancel).await?)
        }
        Commands::WatchParties(filter) => {
            let (service, cancel) = analytics(database, settings);
            print_json(&service.watch_parties(&filter.into(), &cancel).await?)
        }
        Commands::Durations(filter) => {
            let (service, cancel) = analytics(database, settings);
            print_json(&service.duration_stats(&filter.into(), &cancel).await?)
        }
        Commands::Settings { .. } => Ok(()),
    }
}

/// Service over the database plus a token that fires on Ctrl-C.
fn analytics(
    database: Database,
    settings: AnalyticsSettings,
) -> (AnalyticsService<Database>, CancellationToken) {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling report");
            on_interrupt.cancel();
        }
    });
    (AnalyticsService::new(Arc::new(database), settings), cancel)
}

async fn cmd_import(database: &Database, file: PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut events: Vec<PlaybackEvent> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid playback events in {}", file.display()))?;

    for event in &mut events {
        if event.id.is_empty() {
            event.id = Uuid::new_v4().to_string();
        }
        if event.session_key.is_empty() {
            event.session_key = event.id.clone();
        }
    }

    let stored = database.insert_events(&events).await?;
    let total = database.count_events().await?;
    info!("Imported {stored} events from {}", file.display());
    println!("Imported {stored} events ({total} in store)");
    Ok(())
}

async fn cmd_seed(database: &Database, users: usize, days: u32, seed: Option<u64>) -> Result<()> {
    let options = SeedOptions { users, days, seed };
    let events = SyntheticHistory::new(options).generate(Utc::now());
    let stored = database.insert_events(&events).await?;
    println!(
        "Seeded {stored} events for {users} users over {days} days into {}",
        database.path().display()
    );
    Ok(())
}

fn cmd_settings(config: Option<PathBuf>, reset: bool) -> Result<()> {
    let Some(path) = config else {
        return print_json(&AnalyticsSettings::default());
    };
    let store = SettingsStore::new(path.clone())?;
    if reset {
        store.update_analytics(AnalyticsSettings::default())?;
        info!("Wrote default settings to {}", path.display());
    }
    print_json(&store.analytics()?)
}

fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
