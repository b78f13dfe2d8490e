//! TOML configuration file loading
//!
//! Supports `~/.config/alybot/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AlybotConfigFile {
    /// Bot behaviour
    #[serde(default)]
    pub bot: BotFileConfig,

    /// Users allowed to run privileged commands (user id -> label)
    #[serde(default)]
    pub authorized_users: BTreeMap<String, String>,

    /// Timing knobs
    #[serde(default)]
    pub timing: TimingFileConfig,
}

/// Bot behaviour configuration
#[derive(Debug, Default, Deserialize)]
pub struct BotFileConfig {
    /// Bot token
    pub token: Option<String>,

    /// Path to the pre-encoded sound clip
    pub sound_path: Option<String>,

    /// Path to the trigger table JSON file
    pub commands_path: Option<String>,

    /// Presence text set on ready
    pub presence: Option<String>,

    /// Command words never treated as chat triggers
    pub protected_commands: Option<Vec<String>>,
}

/// Delays and timeouts, in milliseconds
#[derive(Debug, Default, Deserialize)]
pub struct TimingFileConfig {
    pub settle_ms: Option<u64>,
    pub list_interval_ms: Option<u64>,
    pub join_timeout_ms: Option<u64>,
    pub io_timeout_ms: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AlybotConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> AlybotConfigFile {
    let Some(path) = config_file_path() else {
        return AlybotConfigFile::default();
    };

    if !path.exists() {
        return AlybotConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            AlybotConfigFile::default()
        }
    }
}

/// Load a TOML config file from an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<AlybotConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/alybot/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("alybot").join("config.toml"))
}
