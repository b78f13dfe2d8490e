//! Pre-encoded sound clip loading
//!
//! A clip file is a concatenation of records, each a 2-byte little-endian
//! signed length followed by that many bytes of opus payload. Payloads are
//! replayed verbatim and never inspected.

use std::path::Path;

use crate::{Error, Result};

/// Size of the length prefix in front of every frame
const LENGTH_PREFIX: usize = 2;

/// Ordered, immutable sequence of encoded audio frames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Vec<Vec<u8>>,
}

impl FrameSequence {
    /// Load a clip from disk
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Decode` if a
    /// record is truncated or carries a negative length
    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        let sequence = Self::decode(&data)?;

        tracing::info!(
            path = %path.display(),
            frames = sequence.len(),
            bytes = data.len(),
            "loaded sound clip"
        );

        Ok(sequence)
    }

    /// Decode a clip from an in-memory buffer
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the input ends in the middle of a record or
    /// a record declares a negative length
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut frames = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let Some(prefix) = data.get(offset..offset + LENGTH_PREFIX) else {
                return Err(Error::Decode(format!(
                    "dangling length prefix at offset {offset} (frame {})",
                    frames.len()
                )));
            };
            let declared = i16::from_le_bytes([prefix[0], prefix[1]]);
            let len = usize::try_from(declared).map_err(|_| {
                Error::Decode(format!(
                    "negative frame length {declared} at offset {offset} (frame {})",
                    frames.len()
                ))
            })?;
            offset += LENGTH_PREFIX;

            let Some(payload) = data.get(offset..offset + len) else {
                return Err(Error::Decode(format!(
                    "frame {} truncated: expected {len} bytes, found {}",
                    frames.len(),
                    data.len() - offset
                )));
            };
            frames.push(payload.to_vec());
            offset += len;
        }

        Ok(Self { frames })
    }

    /// Number of frames in the clip
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the clip has no frames
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Iterate frames in playback order
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.frames.iter().map(Vec::as_slice)
    }
}

impl From<Vec<Vec<u8>>> for FrameSequence {
    fn from(frames: Vec<Vec<u8>>) -> Self {
        Self { frames }
    }
}
