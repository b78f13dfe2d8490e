//! Messaging platform boundary
//!
//! The router and voice playback only talk to the platform through the
//! `Gateway` and `VoiceConnection` traits. `DiscordGateway` implements them on
//! serenity and songbird.

mod discord;

use async_trait::async_trait;

pub use discord::{DiscordGateway, DiscordHandler, avatar_url_with_size, parse_user_reference};

use crate::Result;

/// A text message received from the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Message identifier
    pub id: String,

    /// Channel the message was posted in
    pub channel_id: String,

    /// Sender identifier
    pub sender_id: String,

    /// Sender display name
    pub sender_name: String,

    /// Message content
    pub content: String,
}

/// A user's presence in a voice channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceState {
    /// User in the channel
    pub user_id: String,

    /// Voice channel the user is connected to
    pub channel_id: String,
}

/// Operations the bot needs from the messaging platform
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Identifier of the bot's own user
    fn current_user_id(&self) -> String;

    /// Post a text message to a channel
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()>;

    /// Replace the bot's presence text
    async fn update_presence(&self, text: &str) -> Result<()>;

    /// Guild that owns a channel, if known
    async fn resolve_channel(&self, channel_id: &str) -> Result<Option<String>>;

    /// Voice states of a guild, or `None` if the guild is unknown
    async fn voice_states(&self, guild_id: &str) -> Result<Option<Vec<VoiceState>>>;

    /// Avatar image URL of a user at the given pixel size
    async fn avatar_url(&self, user_id: &str, size: u16) -> Result<String>;

    /// Join a voice channel
    async fn join_voice(&self, guild_id: &str, channel_id: &str)
    -> Result<Box<dyn VoiceConnection>>;
}

/// An established voice connection
#[async_trait]
pub trait VoiceConnection: Send {
    /// Mark the connection as transmitting or idle
    async fn set_speaking(&mut self, speaking: bool) -> Result<()>;

    /// Queue one encoded opus frame for transmission
    async fn send_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Leave the voice channel
    async fn disconnect(&mut self) -> Result<()>;
}
