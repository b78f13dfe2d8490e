//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use alybot::{
    AppContext, CommandStore, Config, FrameSequence, Gateway, IncomingMessage, Router,
    VoiceConnection, VoiceState,
};
use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

pub const BOT_ID: &str = "1";
pub const ADMIN_ID: &str = "100";
pub const GUEST_ID: &str = "200";
pub const TEXT_CHANNEL: &str = "10";
pub const GUILD: &str = "20";
pub const VOICE_CHANNEL: &str = "30";

/// Everything that happened on a mock voice connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOp {
    Join(String, String),
    Speaking(bool),
    Frame(Vec<u8>),
    Disconnect,
}

/// Recording gateway with canned lookups
#[derive(Default)]
pub struct MockGateway {
    pub sent: Mutex<Vec<(String, String)>>,
    pub presence: Mutex<Vec<String>>,
    pub voice_log: Arc<Mutex<Vec<VoiceOp>>>,
    pub channels: HashMap<String, String>,
    pub voice_states: HashMap<String, Vec<VoiceState>>,
    pub avatars: HashMap<String, String>,
    /// Signalled when `join_voice` is entered
    pub join_entered: Arc<Notify>,
    /// When set, `join_voice` waits for this before connecting
    pub join_gate: Option<Arc<Notify>>,
    pub fail_join: bool,
    pub fail_frames: bool,
}

impl MockGateway {
    /// Gateway where the guest sits in the voice channel of the test guild
    pub fn new() -> Self {
        let mut gw = Self::default();
        gw.channels.insert(TEXT_CHANNEL.to_string(), GUILD.to_string());
        gw.voice_states.insert(
            GUILD.to_string(),
            vec![VoiceState {
                user_id: GUEST_ID.to_string(),
                channel_id: VOICE_CHANNEL.to_string(),
            }],
        );
        gw.avatars.insert(
            "42".to_string(),
            "https://cdn.example/avatars/42.png".to_string(),
        );
        gw
    }

    pub fn with_join_gate(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.join_gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|(_, t)| t.clone()).collect()
    }

    pub async fn voice_ops(&self) -> Vec<VoiceOp> {
        self.voice_log.lock().await.clone()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    fn current_user_id(&self) -> String {
        BOT_ID.to_string()
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> alybot::Result<()> {
        self.sent
            .lock()
            .await
            .push((channel_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn update_presence(&self, text: &str) -> alybot::Result<()> {
        self.presence.lock().await.push(text.to_string());
        Ok(())
    }

    async fn resolve_channel(&self, channel_id: &str) -> alybot::Result<Option<String>> {
        Ok(self.channels.get(channel_id).cloned())
    }

    async fn voice_states(&self, guild_id: &str) -> alybot::Result<Option<Vec<VoiceState>>> {
        Ok(self.voice_states.get(guild_id).cloned())
    }

    async fn avatar_url(&self, user_id: &str, size: u16) -> alybot::Result<String> {
        self.avatars
            .get(user_id)
            .map(|url| format!("{url}?size={size}"))
            .ok_or_else(|| alybot::Error::NotFound(user_id.to_string()))
    }

    async fn join_voice(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> alybot::Result<Box<dyn VoiceConnection>> {
        self.join_entered.notify_one();
        if let Some(gate) = &self.join_gate {
            gate.notified().await;
        }
        if self.fail_join {
            return Err(alybot::Error::Connection("refused".to_string()));
        }

        self.voice_log
            .lock()
            .await
            .push(VoiceOp::Join(guild_id.to_string(), channel_id.to_string()));

        Ok(Box::new(MockVoice {
            log: Arc::clone(&self.voice_log),
            fail_frames: self.fail_frames,
        }))
    }
}

struct MockVoice {
    log: Arc<Mutex<Vec<VoiceOp>>>,
    fail_frames: bool,
}

#[async_trait]
impl VoiceConnection for MockVoice {
    async fn set_speaking(&mut self, speaking: bool) -> alybot::Result<()> {
        self.log.lock().await.push(VoiceOp::Speaking(speaking));
        Ok(())
    }

    async fn send_frame(&mut self, frame: &[u8]) -> alybot::Result<()> {
        if self.fail_frames {
            return Err(alybot::Error::Voice("socket closed".to_string()));
        }
        self.log.lock().await.push(VoiceOp::Frame(frame.to_vec()));
        Ok(())
    }

    async fn disconnect(&mut self) -> alybot::Result<()> {
        self.log.lock().await.push(VoiceOp::Disconnect);
        Ok(())
    }
}

/// Config with one authorized admin
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.authorized_users = [(ADMIN_ID, "Admin")].into_iter().collect();
    config
}

/// Three-frame test clip
pub fn test_frames() -> FrameSequence {
    FrameSequence::from(vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()])
}

/// Router over a command file at `path` containing `json`
pub async fn router_with_file(path: &Path, json: &str) -> Router {
    std::fs::write(path, json).expect("failed to write command file");
    let store = CommandStore::load(path, Duration::from_secs(5))
        .await
        .expect("failed to load command file");
    Router::new(Arc::new(AppContext::new(&test_config(), test_frames(), store)))
}

pub fn message(sender: &str, content: &str) -> IncomingMessage {
    IncomingMessage {
        id: "msg-1".to_string(),
        channel_id: TEXT_CHANNEL.to_string(),
        sender_id: sender.to_string(),
        sender_name: "tester".to_string(),
        content: content.to_string(),
    }
}
