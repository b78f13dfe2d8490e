//! Voice channel playback
//!
//! Replays the preloaded opus clip through a `VoiceConnection`.

mod playback;

pub use playback::VoicePlayer;
