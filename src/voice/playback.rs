//! Clip playback into a voice channel

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::gateway::{Gateway, VoiceConnection};
use crate::sound::FrameSequence;
use crate::{Error, Result};

/// Plays the preloaded clip, one invocation at a time
#[derive(Debug)]
pub struct VoicePlayer {
    frames: Arc<FrameSequence>,
    settle: Duration,
    join_timeout: Duration,
    in_progress: Mutex<()>,
}

impl VoicePlayer {
    /// Create a player for a clip
    #[must_use]
    pub fn new(frames: Arc<FrameSequence>, settle: Duration, join_timeout: Duration) -> Self {
        Self {
            frames,
            settle,
            join_timeout,
            in_progress: Mutex::new(()),
        }
    }

    /// The clip this player replays
    #[must_use]
    pub fn frames(&self) -> &FrameSequence {
        &self.frames
    }

    /// Join a voice channel, play the clip and leave
    ///
    /// # Errors
    ///
    /// Returns `Error::Busy` if another playback is running,
    /// `Error::Connection` if the channel cannot be joined in time, or the
    /// transport error if sending fails
    pub async fn play(&self, gateway: &dyn Gateway, guild_id: &str, channel_id: &str) -> Result<()> {
        let _guard = self.in_progress.try_lock().map_err(|_| Error::Busy)?;

        let mut conn = tokio::time::timeout(self.join_timeout, gateway.join_voice(guild_id, channel_id))
            .await
            .map_err(|_| {
                Error::Connection(format!(
                    "joining voice channel {channel_id} timed out after {:?}",
                    self.join_timeout
                ))
            })??;

        tracing::debug!(guild_id, channel_id, frames = self.frames.len(), "joined voice channel");

        let sent = self.stream(conn.as_mut()).await;
        let left = conn.disconnect().await;

        sent?;
        left?;

        tracing::info!(guild_id, channel_id, "playback complete");
        Ok(())
    }

    async fn stream(&self, conn: &mut dyn VoiceConnection) -> Result<()> {
        tokio::time::sleep(self.settle).await;

        conn.set_speaking(true).await?;
        for frame in self.frames.iter() {
            conn.send_frame(frame).await?;
        }
        conn.set_speaking(false).await?;

        tokio::time::sleep(self.settle).await;
        Ok(())
    }
}
