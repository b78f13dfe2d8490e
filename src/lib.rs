//! Alybot - Discord chat bot with trigger replies and an airhorn
//!
//! This library provides the core functionality for the bot:
//! - Pre-encoded opus clip loading
//! - A JSON-backed trigger/response table
//! - Message routing with fixed `!` commands
//! - Voice channel playback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Discord (serenity + songbird)           │
//! └────────────────────┬────────────────────────────────┘
//!                      │  Gateway / VoiceConnection
//! ┌────────────────────▼────────────────────────────────┐
//! │                     Router                           │
//! │   Triggers  │  !airhorn  │  !status  │  !add_command │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   AppContext                         │
//! │   CommandStore  │  VoicePlayer  │  AuthorizedUsers   │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod gateway;
pub mod router;
pub mod security;
pub mod sound;
pub mod voice;

pub use app::AppContext;
pub use commands::{CommandStore, CommandTable, NewCommand};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use gateway::{Gateway, IncomingMessage, VoiceConnection, VoiceState};
pub use router::{Route, Router};
pub use security::{AuthorizedUsers, ProtectedCommands};
pub use sound::FrameSequence;
pub use voice::VoicePlayer;
