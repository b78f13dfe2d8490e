//! Shared application state
//!
//! Built once at startup and handed to the router and playback by `Arc`.

use std::sync::Arc;
use std::time::Duration;

use crate::commands::CommandStore;
use crate::config::Config;
use crate::security::{AuthorizedUsers, ProtectedCommands};
use crate::sound::FrameSequence;
use crate::voice::VoicePlayer;
use crate::{Error, Result};

/// Everything a message handler needs
#[derive(Debug)]
pub struct AppContext {
    /// Trigger -> response table
    pub commands: CommandStore,

    /// Airhorn clip player
    pub player: VoicePlayer,

    /// Users allowed to run privileged commands
    pub authorized_users: AuthorizedUsers,

    /// Command words never treated as chat triggers
    pub protected_commands: ProtectedCommands,

    /// Gap between messages when listing commands
    pub list_interval: Duration,
}

impl AppContext {
    /// Load the sound clip and the command table described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if either file cannot be read or decoded within the
    /// configured I/O timeout
    pub async fn load(config: &Config) -> Result<Self> {
        let io_timeout = config.timing.io_timeout;

        let frames = tokio::time::timeout(io_timeout, FrameSequence::load(&config.sound_path))
            .await
            .map_err(|_| {
                Error::Timeout(format!("reading {}", config.sound_path.display()))
            })?
            .inspect_err(|e| {
                tracing::error!(
                    path = %config.sound_path.display(),
                    error = %e,
                    "error loading sound; copy an airhorn.dca clip to this path or pass --sound"
                );
            })?;

        let commands = tokio::time::timeout(
            io_timeout,
            CommandStore::load(config.commands_path.clone(), io_timeout),
        )
        .await
        .map_err(|_| Error::Timeout(format!("reading {}", config.commands_path.display())))??;

        Ok(Self::new(config, frames, commands))
    }

    /// Assemble a context from already loaded parts
    #[must_use]
    pub fn new(config: &Config, frames: FrameSequence, commands: CommandStore) -> Self {
        let player = VoicePlayer::new(
            Arc::new(frames),
            config.timing.settle,
            config.timing.join_timeout,
        );

        Self {
            commands,
            player,
            authorized_users: config.authorized_users.clone(),
            protected_commands: config.protected_commands.clone(),
            list_interval: config.timing.list_interval,
        }
    }

    /// Whether `user_id` may run privileged commands
    #[must_use]
    pub fn is_authorized(&self, user_id: &str) -> bool {
        self.authorized_users.contains(user_id)
    }
}
