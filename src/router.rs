//! Incoming message routing
//!
//! Every message is routed to at most one handler. Chat triggers from the
//! command table take precedence; fixed `!` commands and the hunger joke are
//! checked afterwards in a fixed order.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tokio::task::JoinHandle;

use crate::app::AppContext;
use crate::commands::{DELIMITER, NewCommand};
use crate::gateway::{Gateway, IncomingMessage};
use crate::{Error, Result};

/// Reply to unauthorized users of privileged commands
pub const REFUSAL: &str = "You are not authorised to use this command! Police!";

/// Reply to hungry users
pub const HUNGER_REPLY: &str = "May I recommend a delicious Hamu Hamu?";

/// First message of a command listing
pub const LIST_PREAMBLE: &str = "Listing commands at a rate of 1 per second brace yourself";

/// Last message of a command listing
pub const LIST_CLOSING: &str = "All commands listed! Have a nice day!";

/// Avatar size requested by `!pfp`
pub const AVATAR_SIZE: u16 = 2048;

static HUNGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(i( am|'?m) hungry|^hungry$)").expect("valid regex"));

/// What to do with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Nothing to do
    Ignore,
    /// Send a fixed reply
    Reply(String),
    /// Play the airhorn in the sender's voice channel
    Airhorn,
    /// Post the avatar of the referenced user
    Avatar(String),
    /// Replace the bot's presence text
    SetStatus(String),
    /// List the command table
    ListCommands,
    /// Add a trigger from a `<trigger>:::<response>` payload
    AddCommand(String),
    /// Privileged command from an unauthorized user
    Unauthorized,
}

/// Dispatches incoming messages against the shared context
#[derive(Debug, Clone)]
pub struct Router {
    ctx: Arc<AppContext>,
}

impl Router {
    /// Create a router over a context
    #[must_use]
    pub const fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Shared context
    #[must_use]
    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Decide how to handle a message
    pub async fn route(&self, message: &IncomingMessage, bot_user_id: &str) -> Route {
        if message.sender_id == bot_user_id {
            return Route::Ignore;
        }

        let content = message.content.as_str();

        if !self.ctx.protected_commands.guards(content) {
            if let Some(reply) = self.ctx.commands.longest_match(content).await {
                return Route::Reply(reply);
            }
        }

        let authorized = self.ctx.is_authorized(&message.sender_id);
        let privileged = |route: Route| if authorized { route } else { Route::Unauthorized };

        if content.contains("!airhorn") {
            Route::Airhorn
        } else if let Some(user) = content.strip_prefix("!pfp ") {
            let user = user.trim();
            if user.is_empty() {
                Route::Ignore
            } else {
                Route::Avatar(user.to_string())
            }
        } else if let Some(status) = content.strip_prefix("!status ") {
            privileged(Route::SetStatus(status.to_string()))
        } else if HUNGER.is_match(content) {
            Route::Reply(HUNGER_REPLY.to_string())
        } else if content.starts_with("!list_commands") {
            privileged(Route::ListCommands)
        } else if let Some(payload) = content.strip_prefix("!add_command") {
            let payload = payload.strip_prefix(' ').unwrap_or(payload);
            privileged(Route::AddCommand(payload.to_string()))
        } else {
            Route::Ignore
        }
    }

    /// Route a message and carry out the resulting action
    ///
    /// Long-running actions (playback, command listing) are spawned; their
    /// task handle is returned so callers may await completion.
    ///
    /// # Errors
    ///
    /// Returns error if a reply, presence update, or command write fails
    pub async fn handle(
        &self,
        gateway: Arc<dyn Gateway>,
        message: IncomingMessage,
    ) -> Result<Option<JoinHandle<()>>> {
        let route = self.route(&message, &gateway.current_user_id()).await;
        if route != Route::Ignore {
            tracing::debug!(?route, sender = %message.sender_name, "routing message");
        }
        if matches!(route, Route::SetStatus(_) | Route::ListCommands | Route::AddCommand(_)) {
            let admin = self
                .ctx
                .authorized_users
                .label(&message.sender_id)
                .unwrap_or(message.sender_name.as_str());
            tracing::info!(%admin, sender_id = %message.sender_id, "privileged command");
        }

        let channel_id = message.channel_id.as_str();

        match route {
            Route::Ignore => Ok(None),
            Route::Reply(text) => {
                gateway.send_message(channel_id, &text).await?;
                Ok(None)
            }
            Route::Unauthorized => {
                tracing::info!(sender_id = %message.sender_id, "unauthorized command");
                gateway.send_message(channel_id, REFUSAL).await?;
                Ok(None)
            }
            Route::Airhorn => Ok(self.airhorn(gateway, &message).await),
            Route::Avatar(user) => {
                let url = gateway.avatar_url(&user, AVATAR_SIZE).await?;
                gateway.send_message(channel_id, &url).await?;
                Ok(None)
            }
            Route::SetStatus(status) => {
                gateway.update_presence(&status).await?;
                tracing::info!(%status, "presence updated");
                Ok(None)
            }
            Route::ListCommands => Ok(Some(self.spawn_listing(gateway, channel_id.to_string()).await)),
            Route::AddCommand(payload) => {
                self.add_command(gateway.as_ref(), channel_id, &payload).await?;
                Ok(None)
            }
        }
    }

    async fn airhorn(
        &self,
        gateway: Arc<dyn Gateway>,
        message: &IncomingMessage,
    ) -> Option<JoinHandle<()>> {
        let guild_id = match gateway.resolve_channel(&message.channel_id).await {
            Ok(Some(guild_id)) => guild_id,
            Ok(None) => {
                tracing::debug!(channel_id = %message.channel_id, "airhorn: channel not found");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "airhorn: channel lookup failed");
                return None;
            }
        };

        let states = match gateway.voice_states(&guild_id).await {
            Ok(Some(states)) => states,
            Ok(None) => {
                tracing::debug!(%guild_id, "airhorn: guild not found");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "airhorn: guild lookup failed");
                return None;
            }
        };

        let voice_channel = states
            .into_iter()
            .find(|vs| vs.user_id == message.sender_id)?
            .channel_id;

        let ctx = Arc::clone(&self.ctx);
        Some(tokio::spawn(async move {
            match ctx.player.play(gateway.as_ref(), &guild_id, &voice_channel).await {
                Ok(()) => {}
                Err(Error::Busy) => tracing::info!(%guild_id, "airhorn already playing, request dropped"),
                Err(e) => tracing::error!(error = %e, %guild_id, "error playing sound"),
            }
        }))
    }

    async fn spawn_listing(&self, gateway: Arc<dyn Gateway>, channel_id: String) -> JoinHandle<()> {
        let entries = self.ctx.commands.list().await;
        let interval = self.ctx.list_interval;

        tokio::spawn(async move {
            if let Err(e) = list_commands(gateway.as_ref(), &channel_id, &entries, interval).await {
                tracing::warn!(error = %e, %channel_id, "command listing aborted");
            }
        })
    }

    async fn add_command(&self, gateway: &dyn Gateway, channel_id: &str, payload: &str) -> Result<()> {
        let cmd = match NewCommand::parse(payload) {
            Ok(cmd) => cmd,
            Err(Error::InvalidCommand(reason)) => {
                tracing::debug!(%reason, "malformed add_command payload");
                let usage = format!("Usage: !add_command <trigger>{DELIMITER}<response>");
                return gateway.send_message(channel_id, &usage).await;
            }
            Err(e) => return Err(e),
        };

        self.ctx.commands.add(&cmd.trigger, &cmd.response).await?;
        gateway
            .send_message(channel_id, &format!("Command added: {}", cmd.trigger))
            .await
    }
}

/// Send a table snapshot one entry per message, `interval` apart
async fn list_commands(
    gateway: &dyn Gateway,
    channel_id: &str,
    entries: &[(String, String)],
    interval: Duration,
) -> Result<()> {
    gateway.send_message(channel_id, LIST_PREAMBLE).await?;
    for (trigger, response) in entries {
        gateway
            .send_message(channel_id, &format!("{trigger} = {response}"))
            .await?;
        tokio::time::sleep(interval).await;
    }
    gateway.send_message(channel_id, LIST_CLOSING).await
}
