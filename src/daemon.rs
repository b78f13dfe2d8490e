//! Bot session lifecycle
//!
//! Loads startup state, connects to the Discord gateway, and runs until a
//! termination signal closes every shard.

use std::sync::Arc;

use serenity::Client;
use serenity::all::GatewayIntents;
use songbird::{SerenityInit, Songbird};

use crate::app::AppContext;
use crate::config::Config;
use crate::gateway::DiscordHandler;
use crate::router::Router;
use crate::{Error, Result};

/// Running bot session
pub struct Daemon {
    token: String,
    presence: String,
    ctx: Arc<AppContext>,
}

impl Daemon {
    /// Prepare a session: check the token and load the clip and command table
    ///
    /// # Errors
    ///
    /// Returns error if the token is missing or a startup file cannot be loaded
    pub async fn new(config: Config) -> Result<Self> {
        let token = config.token.clone().ok_or_else(|| {
            Error::Config("no token provided. Please run: alybot -t <bot token>".to_string())
        })?;

        let ctx = AppContext::load(&config).await?;

        tracing::info!(
            frames = ctx.player.frames().len(),
            authorized_users = ctx.authorized_users.len(),
            "startup state loaded"
        );

        Ok(Self {
            token,
            presence: config.presence,
            ctx: Arc::new(ctx),
        })
    }

    /// Shared application context
    #[must_use]
    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Connect and serve events until SIGINT/SIGTERM
    ///
    /// # Errors
    ///
    /// Returns error if the gateway connection cannot be opened
    pub async fn run(self) -> Result<()> {
        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::MESSAGE_CONTENT;

        let songbird = Songbird::serenity();
        let handler = DiscordHandler::new(Router::new(self.ctx), Arc::clone(&songbird), self.presence);

        let mut client = Client::builder(&self.token, intents)
            .event_handler(handler)
            .register_songbird_with(songbird)
            .await
            .map_err(|e| Error::Connection(format!("Discord client error: {e}")))?;

        let shard_manager = Arc::clone(&client.shard_manager);
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("shutdown signal received, closing gateway");
            shard_manager.shutdown_all().await;
        });

        tracing::info!("Alybot is now running. Press CTRL-C to exit.");

        client
            .start()
            .await
            .map_err(|e| Error::Connection(format!("Discord gateway error: {e}")))?;

        tracing::info!("Discord session closed");
        Ok(())
    }
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
