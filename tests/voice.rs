//! Voice playback integration tests
//!
//! Plays the clip through a mock voice connection

use std::sync::Arc;
use std::time::Duration;

use alybot::{Error, VoicePlayer};

mod common;
use common::{GUILD, MockGateway, VOICE_CHANNEL, VoiceOp, test_frames};

const SETTLE: Duration = Duration::from_millis(250);
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

fn player() -> Arc<VoicePlayer> {
    Arc::new(VoicePlayer::new(Arc::new(test_frames()), SETTLE, JOIN_TIMEOUT))
}

#[tokio::test(start_paused = true)]
async fn test_playback_sequence() {
    let gw = MockGateway::new();
    let start = tokio::time::Instant::now();

    player().play(&gw, GUILD, VOICE_CHANNEL).await.unwrap();

    assert_eq!(
        gw.voice_ops().await,
        vec![
            VoiceOp::Join(GUILD.to_string(), VOICE_CHANNEL.to_string()),
            VoiceOp::Speaking(true),
            VoiceOp::Frame(b"one".to_vec()),
            VoiceOp::Frame(b"two".to_vec()),
            VoiceOp::Frame(b"three".to_vec()),
            VoiceOp::Speaking(false),
            VoiceOp::Disconnect,
        ]
    );
    // Settle delay before and after streaming
    assert!(start.elapsed() >= SETTLE * 2);
}

#[tokio::test(start_paused = true)]
async fn test_playback_is_repeatable() {
    let gw = MockGateway::new();
    let player = player();

    player.play(&gw, GUILD, VOICE_CHANNEL).await.unwrap();
    let first = gw.voice_ops().await;
    gw.voice_log.lock().await.clear();

    player.play(&gw, GUILD, VOICE_CHANNEL).await.unwrap();
    assert_eq!(gw.voice_ops().await, first);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_playback_is_busy() {
    let (gw, gate) = MockGateway::new().with_join_gate();
    let gw = Arc::new(gw);
    let player = player();

    let first = {
        let player = Arc::clone(&player);
        let gw = Arc::clone(&gw);
        tokio::spawn(async move { player.play(gw.as_ref(), GUILD, VOICE_CHANNEL).await })
    };
    gw.join_entered.notified().await;

    let err = player.play(gw.as_ref(), GUILD, VOICE_CHANNEL).await.unwrap_err();
    assert!(matches!(err, Error::Busy));

    gate.notify_one();
    first.await.unwrap().unwrap();

    let joins = gw
        .voice_ops()
        .await
        .into_iter()
        .filter(|op| matches!(op, VoiceOp::Join(..)))
        .count();
    assert_eq!(joins, 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_timeout_is_connection_error() {
    // Gate is never opened
    let (gw, _gate) = MockGateway::new().with_join_gate();

    let err = player().play(&gw, GUILD, VOICE_CHANNEL).await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    assert!(gw.voice_ops().await.is_empty());
}

#[tokio::test]
async fn test_join_failure_is_reported() {
    let mut gw = MockGateway::new();
    gw.fail_join = true;

    let err = player().play(&gw, GUILD, VOICE_CHANNEL).await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    assert!(gw.voice_ops().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnects_after_send_failure() {
    let mut gw = MockGateway::new();
    gw.fail_frames = true;
    let player = player();

    let err = player.play(&gw, GUILD, VOICE_CHANNEL).await.unwrap_err();
    assert!(matches!(err, Error::Voice(_)));
    assert_eq!(gw.voice_ops().await.last(), Some(&VoiceOp::Disconnect));

    // The player is free again
    gw.fail_frames = false;
    player.play(&gw, GUILD, VOICE_CHANNEL).await.unwrap();
}
