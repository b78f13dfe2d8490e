//! Configuration management for Alybot

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;
use crate::security::{AuthorizedUsers, ProtectedCommands};

use self::file::AlybotConfigFile;

/// Default sound clip path
pub const DEFAULT_SOUND_PATH: &str = "airhorn.dca";

/// Default trigger table path
pub const DEFAULT_COMMANDS_PATH: &str = "botcommands.json";

/// Default presence text
pub const DEFAULT_PRESENCE: &str = "with Alycaea";

/// Alybot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token (required to connect)
    pub token: Option<String>,

    /// Path to the pre-encoded sound clip
    pub sound_path: PathBuf,

    /// Path to the trigger table JSON file
    pub commands_path: PathBuf,

    /// Presence text set when the gateway is ready
    pub presence: String,

    /// Users allowed to run privileged commands
    pub authorized_users: AuthorizedUsers,

    /// Command words never treated as chat triggers
    pub protected_commands: ProtectedCommands,

    /// Delays and timeouts
    pub timing: TimingConfig,
}

/// Delays and timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Pause after joining and before leaving voice
    pub settle: Duration,

    /// Gap between messages when listing commands
    pub list_interval: Duration,

    /// Upper bound on establishing a voice connection
    pub join_timeout: Duration,

    /// Upper bound on startup file reads and command file writes
    pub io_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(250),
            list_interval: Duration::from_secs(1),
            join_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(AlybotConfigFile::default())
    }
}

impl Config {
    /// Load configuration
    ///
    /// With an explicit `config_path` the file must exist and parse. Without
    /// one, the standard location is used as an optional overlay.
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly given config file cannot be loaded
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = match config_path {
            Some(path) => file::load_config_file_from(path)?,
            None => file::load_config_file(),
        };
        Ok(Self::from_file(fc))
    }

    /// Build configuration from a parsed config file, filling defaults
    #[must_use]
    pub fn from_file(fc: AlybotConfigFile) -> Self {
        let defaults = TimingConfig::default();
        let ms = |v: Option<u64>, default: Duration| v.map_or(default, Duration::from_millis);

        let timing = TimingConfig {
            settle: ms(fc.timing.settle_ms, defaults.settle),
            list_interval: ms(fc.timing.list_interval_ms, defaults.list_interval),
            join_timeout: ms(fc.timing.join_timeout_ms, defaults.join_timeout),
            io_timeout: ms(fc.timing.io_timeout_ms, defaults.io_timeout),
        };

        let protected_commands = fc
            .bot
            .protected_commands
            .map_or_else(ProtectedCommands::default, ProtectedCommands::new);

        Self {
            token: fc.bot.token.filter(|t| !t.is_empty()),
            sound_path: fc
                .bot
                .sound_path
                .map_or_else(|| PathBuf::from(DEFAULT_SOUND_PATH), PathBuf::from),
            commands_path: fc
                .bot
                .commands_path
                .map_or_else(|| PathBuf::from(DEFAULT_COMMANDS_PATH), PathBuf::from),
            presence: fc.bot.presence.unwrap_or_else(|| DEFAULT_PRESENCE.to_string()),
            authorized_users: AuthorizedUsers::new(fc.authorized_users),
            protected_commands,
            timing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert!(config.token.is_none());
        assert_eq!(config.sound_path, PathBuf::from("airhorn.dca"));
        assert_eq!(config.commands_path, PathBuf::from("botcommands.json"));
        assert_eq!(config.presence, "with Alycaea");
        assert!(config.authorized_users.is_empty());
        assert!(config.protected_commands.guards("!add_command x"));
        assert_eq!(config.timing.settle, Duration::from_millis(250));
        assert_eq!(config.timing.list_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_file_overlay() {
        let fc: AlybotConfigFile = toml::from_str(
            r#"
            [bot]
            presence = "with fire"
            protected_commands = ["!secret"]

            [authorized_users]
            "183017941158068226" = "Alycaea"

            [timing]
            list_interval_ms = 10
            "#,
        )
        .unwrap();

        let config = Config::from_file(fc);

        assert_eq!(config.presence, "with fire");
        assert!(config.authorized_users.contains("183017941158068226"));
        assert!(config.protected_commands.guards("!secret stuff"));
        assert!(!config.protected_commands.guards("!add_command x"));
        assert_eq!(config.timing.list_interval, Duration::from_millis(10));
        assert_eq!(config.timing.settle, Duration::from_millis(250));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_empty_token_is_absent() {
        let fc: AlybotConfigFile = toml::from_str("[bot]\ntoken = \"\"").unwrap();
        assert!(Config::from_file(fc).token.is_none());
    }
}
