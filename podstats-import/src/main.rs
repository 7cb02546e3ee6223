//! podstats - podcast download statistics importer
//!
//! Imports download-log workbooks into a deduplicated SQLite store and
//! offers a few read-only reports on the result.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use podstats_common::config::{resolve_settings, CliOverrides, LoggingConfig, TomlConfig};
use podstats_common::{DedupPolicy, Settings};
use podstats_import::{import_workbook, ImportOptions, PodcastStore, TopQuery};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for podstats
#[derive(Parser, Debug)]
#[command(name = "podstats")]
#[command(about = "Podcast download statistics importer")]
#[command(version)]
struct Cli {
    /// SQLite store path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Directory for the duplicate and skip ledgers
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a workbook into a fresh store
    Import {
        /// Workbook file (.xlsx, .xlsm, .xlsb, .xls, .ods or .csv)
        workbook: PathBuf,

        /// Replace the store if it already exists
        #[arg(long)]
        overwrite_db: bool,

        /// How rows sharing a URL within a sheet are combined
        #[arg(long)]
        policy: Option<DedupPolicy>,
    },

    /// Episodes ranked by equivalent full downloads
    Top {
        #[arg(long, default_value_t = 20)]
        limit: u32,

        #[arg(long)]
        year: Option<i32>,

        /// Case-insensitive substring of the feature tag
        #[arg(long)]
        feature: Option<String>,
    },

    /// Episode count and average equivalent full downloads
    Stats {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config problems are reported before the configured subscriber exists
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .finish();
    let toml_config = tracing::subscriber::with_default(bootstrap, || {
        TomlConfig::load_or_default(cli.config.as_deref())
    });

    init_tracing(&toml_config.logging)?;

    info!(
        "Starting podstats v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let policy = match &cli.command {
        Command::Import { policy, .. } => *policy,
        _ => None,
    };
    let overrides = CliOverrides {
        database: cli.database.clone(),
        log_dir: cli.log_dir.clone(),
        dedup_policy: policy,
    };
    let settings = resolve_settings(&overrides, &toml_config).context("Invalid configuration")?;
    info!("Database path: {}", settings.database_path.display());

    match cli.command {
        Command::Import {
            workbook,
            overwrite_db,
            ..
        } => run_import(&settings, workbook, overwrite_db).await,
        Command::Top {
            limit,
            year,
            feature,
        } => run_top(&settings, TopQuery { feature, year, limit }).await,
        Command::Stats { json } => run_stats(&settings, json).await,
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, stderr_layer) = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (Some(layer), None)
        }
        None => (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(())
}

async fn run_import(settings: &Settings, workbook: PathBuf, overwrite: bool) -> Result<()> {
    let options = ImportOptions::from_settings(settings, overwrite);
    let summary = import_workbook(&workbook, &options).await?;

    println!("Imported {} rows", summary.inserted);
    println!("Duplicates logged: {}", summary.duplicates);
    println!("Skipped rows: {}", summary.skipped);
    Ok(())
}

async fn run_top(settings: &Settings, query: TopQuery) -> Result<()> {
    let store = open_store(settings).await?;
    let episodes = store.top_episodes(&query).await?;

    println!(
        "{:<14} {:<48} {:>5} {:>10} {:>8} {:>8} {:>5}",
        "feature", "title", "code", "eq_full", "full", "partial", "year"
    );
    for episode in &episodes {
        println!(
            "{:<14} {:<48} {:>5} {:>10.1} {:>8} {:>8} {:>5}",
            episode.feature.map(|f| f.as_str()).unwrap_or("-"),
            truncate(&episode.title, 48),
            episode.code_label().unwrap_or_else(|| "-".to_string()),
            episode.eq_full,
            episode.full,
            episode.partial,
            episode.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
        );
    }

    store.close().await;
    Ok(())
}

async fn run_stats(settings: &Settings, json: bool) -> Result<()> {
    let store = open_store(settings).await?;
    let summary = store.summary().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Episodes: {}", summary.episodes);
        println!("Average eq_full: {:.2}", summary.avg_eq_full);
    }

    store.close().await;
    Ok(())
}

async fn open_store(settings: &Settings) -> Result<PodcastStore> {
    PodcastStore::open(&settings.database_path)
        .await
        .with_context(|| format!("Failed to open database {}", settings.database_path.display()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
