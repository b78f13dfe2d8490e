//! Discord gateway using serenity, with voice through songbird

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::all::{
    ActivityData, ChannelId, Context, EventHandler, Guild, GuildId, Message, Ready,
    UnavailableGuild, UserId,
};
use songbird::input::Input;
use songbird::{Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent};
use tokio::sync::{Mutex, Notify};

use super::{Gateway, IncomingMessage, VoiceConnection, VoiceState};
use crate::router::Router;
use crate::{Error, Result};

/// Duration of one opus frame in the clip format
const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Slack added on top of the clip length while waiting for playback to end
const PLAYBACK_GRACE: Duration = Duration::from_secs(5);

/// Gateway bound to one serenity event context
pub struct DiscordGateway {
    ctx: Context,
    songbird: Arc<Songbird>,
}

impl DiscordGateway {
    /// Wrap an event context
    #[must_use]
    pub const fn new(ctx: Context, songbird: Arc<Songbird>) -> Self {
        Self { ctx, songbird }
    }
}

fn parse_id(id: &str, kind: &str) -> Result<u64> {
    id.parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| Error::Channel(format!("invalid {kind} ID: {id}")))
}

#[async_trait]
impl Gateway for DiscordGateway {
    fn current_user_id(&self) -> String {
        self.ctx.cache.current_user().id.to_string()
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<()> {
        let channel = ChannelId::new(parse_id(channel_id, "channel")?);

        channel
            .say(&self.ctx.http, content)
            .await
            .map_err(|e| Error::Channel(format!("Discord send error: {e}")))?;

        tracing::debug!(channel_id, "Discord message sent");
        Ok(())
    }

    async fn update_presence(&self, text: &str) -> Result<()> {
        self.ctx.set_activity(Some(ActivityData::playing(text)));
        Ok(())
    }

    async fn resolve_channel(&self, channel_id: &str) -> Result<Option<String>> {
        let channel = ChannelId::new(parse_id(channel_id, "channel")?);
        Ok(self
            .ctx
            .cache
            .channel(channel)
            .map(|c| c.guild_id.to_string()))
    }

    async fn voice_states(&self, guild_id: &str) -> Result<Option<Vec<VoiceState>>> {
        let guild = GuildId::new(parse_id(guild_id, "guild")?);
        Ok(self.ctx.cache.guild(guild).map(|g| {
            g.voice_states
                .values()
                .filter_map(|vs| {
                    vs.channel_id.map(|channel| VoiceState {
                        user_id: vs.user_id.to_string(),
                        channel_id: channel.to_string(),
                    })
                })
                .collect()
        }))
    }

    async fn avatar_url(&self, user_ref: &str, size: u16) -> Result<String> {
        let id = parse_user_reference(user_ref)
            .ok_or_else(|| Error::NotFound(format!("not a user reference: {user_ref}")))?;

        let user = UserId::new(id)
            .to_user(&self.ctx)
            .await
            .map_err(|e| Error::NotFound(format!("user {id}: {e}")))?;

        Ok(avatar_url_with_size(&user.face(), size))
    }

    async fn join_voice(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<Box<dyn VoiceConnection>> {
        let guild = GuildId::new(parse_id(guild_id, "guild")?);
        let channel = ChannelId::new(parse_id(channel_id, "channel")?);

        match self.songbird.join(guild, channel).await {
            Ok(call) => Ok(Box::new(SongbirdConnection::new(
                Arc::clone(&self.songbird),
                guild,
                call,
            ))),
            Err(e) => {
                if let Err(cleanup) = self.songbird.remove(guild).await {
                    tracing::debug!(error = %cleanup, "voice cleanup after failed join");
                }
                Err(Error::Connection(format!("voice join failed: {e}")))
            }
        }
    }
}

/// Extract a user id from a raw id or a `<@id>` / `<@!id>` mention
#[must_use]
pub fn parse_user_reference(reference: &str) -> Option<u64> {
    let reference = reference.trim();
    let raw = reference
        .strip_prefix("<@")
        .and_then(|r| r.strip_suffix('>'))
        .map_or(reference, |r| r.strip_prefix('!').unwrap_or(r));

    raw.parse::<u64>().ok().filter(|id| *id != 0)
}

/// Rewrite a CDN image URL to request a specific size
#[must_use]
pub fn avatar_url_with_size(url: &str, size: u16) -> String {
    let base = url.split_once('?').map_or(url, |(base, _)| base);
    format!("{base}?size={size}")
}

/// Songbird call that collects frames while speaking and plays them on stop
///
/// songbird drives the speaking flag itself, so the clip is handed over as a
/// single in-memory DCA stream once all frames are queued.
struct SongbirdConnection {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    pending: Vec<u8>,
    frames: u32,
}

impl SongbirdConnection {
    fn new(manager: Arc<Songbird>, guild_id: GuildId, call: Arc<Mutex<Call>>) -> Self {
        Self {
            manager,
            guild_id,
            call,
            pending: Vec::new(),
            frames: 0,
        }
    }

    async fn flush(&mut self) -> Result<()> {
        if self.frames == 0 {
            return Ok(());
        }

        let clip = dca1_stream(&std::mem::take(&mut self.pending))?;
        let limit = FRAME_DURATION * self.frames + PLAYBACK_GRACE;
        self.frames = 0;

        let done = Arc::new(Notify::new());
        let handle = {
            let mut call = self.call.lock().await;
            call.remove_all_global_events();
            call.add_global_event(Event::Track(TrackEvent::End), TrackDone(Arc::clone(&done)));
            call.add_global_event(Event::Track(TrackEvent::Error), TrackDone(Arc::clone(&done)));
            call.play_only_input(Input::from(clip))
        };

        if tokio::time::timeout(limit, done.notified()).await.is_err() {
            if let Err(e) = handle.stop() {
                tracing::debug!(error = %e, "stopping stalled track");
            }
            return Err(Error::Timeout(format!("clip playback exceeded {limit:?}")));
        }

        Ok(())
    }
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    async fn set_speaking(&mut self, speaking: bool) -> Result<()> {
        if speaking {
            self.pending.clear();
            self.frames = 0;
            Ok(())
        } else {
            self.flush().await
        }
    }

    async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let len = i16::try_from(frame.len())
            .map_err(|_| Error::Voice(format!("frame of {} bytes too large", frame.len())))?;
        self.pending.extend_from_slice(&len.to_le_bytes());
        self.pending.extend_from_slice(frame);
        self.frames += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.manager
            .remove(self.guild_id)
            .await
            .map_err(|e| Error::Voice(format!("voice leave failed: {e}")))
    }
}

/// Wakes the playback waiter when a track finishes or fails
struct TrackDone(Arc<Notify>);

#[async_trait]
impl VoiceEventHandler for TrackDone {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        self.0.notify_one();
        None
    }
}

/// Prefix length-prefixed opus frames with a DCA1 header songbird can probe
fn dca1_stream(frames: &[u8]) -> Result<Vec<u8>> {
    let metadata = serde_json::json!({
        "dca": {
            "version": 1,
            "tool": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "url": null,
                "author": null,
            },
        },
        "opus": {
            "mode": "voip",
            "sample_rate": 48_000,
            "frame_size": 960,
            "abr": null,
            "vbr": true,
            "channels": 2,
        },
        "info": null,
        "origin": null,
        "extra": null,
    });
    let metadata = serde_json::to_vec(&metadata)?;
    let metadata_len = i32::try_from(metadata.len())
        .map_err(|_| Error::Voice("DCA metadata too large".to_string()))?;

    let mut out = Vec::with_capacity(8 + metadata.len() + frames.len());
    out.extend_from_slice(b"DCA1");
    out.extend_from_slice(&metadata_len.to_le_bytes());
    out.extend_from_slice(&metadata);
    out.extend_from_slice(frames);
    Ok(out)
}

/// Serenity event handler feeding the router
pub struct DiscordHandler {
    router: Router,
    songbird: Arc<Songbird>,
    presence: String,
}

impl DiscordHandler {
    /// Create a handler
    ///
    /// # Arguments
    ///
    /// * `router` - Message router
    /// * `songbird` - Voice manager registered with the client
    /// * `presence` - Presence text set when the gateway is ready
    #[must_use]
    pub const fn new(router: Router, songbird: Arc<Songbird>, presence: String) -> Self {
        Self {
            router,
            songbird,
            presence,
        }
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "Discord bot ready");
        ctx.set_activity(Some(ActivityData::playing(self.presence.as_str())));
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        tracing::debug!(guild_id = %guild.id, name = %guild.name, "guild available");
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        if incomplete.unavailable {
            tracing::debug!(guild_id = %incomplete.id, "guild unavailable, ignoring");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        tracing::trace!(
            author = %msg.author.name,
            content = %msg.content,
            "Discord message received"
        );

        let incoming = IncomingMessage {
            id: msg.id.to_string(),
            channel_id: msg.channel_id.to_string(),
            sender_id: msg.author.id.to_string(),
            sender_name: msg.author.name.clone(),
            content: msg.content,
        };

        let gateway: Arc<dyn Gateway> =
            Arc::new(DiscordGateway::new(ctx, Arc::clone(&self.songbird)));

        if let Err(e) = self.router.handle(gateway, incoming).await {
            tracing::warn!(error = %e, "message handler failed");
        }
    }
}
