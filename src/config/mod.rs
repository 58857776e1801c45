mod file_config;

pub use file_config::FileConfig;

use anyhow::Result;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub song_data_root: Option<PathBuf>,
    pub log_data_root: Option<PathBuf>,
}

/// Resolved run configuration: where the star database lives and the two
/// data roots. Existence of the roots is checked by the discoverer, not
/// here, so that a missing root surfaces as a discovery failure.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub song_data_root: PathBuf,
    pub log_data_root: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        let song_data_root = file
            .song_data_root
            .map(PathBuf::from)
            .or_else(|| cli.song_data_root.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "song_data_root must be specified via --song-data or in config file"
                )
            })?;

        let log_data_root = file
            .log_data_root
            .map(PathBuf::from)
            .or_else(|| cli.log_data_root.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("log_data_root must be specified via --log-data or in config file")
            })?;

        Ok(Self {
            db_path,
            song_data_root,
            log_data_root,
        })
    }
}
