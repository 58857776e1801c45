//! Playlog ETL
//!
//! This binary loads two families of JSON files (song metadata and
//! playback event logs) into the SQLite star schema. Song files go
//! first so that the log phase can resolve playback events against the
//! loaded catalog.

use anyhow::{Context, Result};
use clap::Parser;
use playlog_etl::config::{AppConfig, CliConfig, FileConfig};
use playlog_etl::load::{load_log_files, load_song_files};
use playlog_etl::star_store::SqliteStarStore;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "playlog-etl")]
#[command(about = "Load song metadata and playback logs into the star schema")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI args.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite star database file (created if missing).
    #[arg(long, value_parser = parse_path)]
    db_path: Option<PathBuf>,

    /// Root directory of the song metadata files.
    #[arg(long, value_parser = parse_path)]
    song_data: Option<PathBuf>,

    /// Root directory of the event log files.
    #[arg(long, value_parser = parse_path)]
    log_data: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();

    let file_config = args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli = CliConfig {
        db_path: args.db_path,
        song_data_root: args.song_data,
        log_data_root: args.log_data,
    };
    let config = AppConfig::resolve(&cli, file_config)?;

    info!("Playlog ETL");
    info!("Database: {}", config.db_path.display());
    info!("Song data: {}", config.song_data_root.display());
    info!("Log data: {}", config.log_data_root.display());

    let store = SqliteStarStore::open(&config.db_path)?;

    info!("Loading song metadata...");
    let song_stats = load_song_files(&config.song_data_root, &store)?;

    info!("Loading event logs...");
    let log_stats = load_log_files(&config.log_data_root, &store)?;

    let counts = store.get_counts()?;
    info!("");
    info!("Load Summary");
    info!("============");
    info!("Song files processed: {}", song_stats.files_processed);
    info!("Log files processed: {}", log_stats.files_processed);
    info!("Rows written: {} time, {} user, {} songplay",
        log_stats.time_rows, log_stats.user_rows, log_stats.songplays);
    info!("");
    info!("Database contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} time rows", counts.time);
    info!("  {} users", counts.users);
    info!("  {} songplays", counts.songplays);

    Ok(())
}
