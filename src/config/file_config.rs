use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// TOML-file configuration. Every recognized option can also be given on
/// the command line; values from the file take precedence.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub song_data_root: Option<String>,
    pub log_data_root: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
