// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice device trait: acquiring a voice channel and writing opus frames.

use async_trait::async_trait;

use crate::error::JukebotError;
use crate::types::ChannelId;

/// Acquires voice channels on the chat gateway.
///
/// One voice connection is active per tenant at a time; `open` joins
/// idempotently (re-opening the same channel reuses the connection).
#[async_trait]
pub trait VoiceDevice: Send + Sync {
    /// Cheap validity test used by the engine to reject bad targets on
    /// admission rather than at playback time.
    async fn is_voice_channel(&self, channel: &ChannelId) -> bool;

    /// Joins the voice channel and returns a frame sink. Fails with
    /// `InvalidVoiceChannel` when the id does not name a voice channel.
    async fn open(&self, channel: &ChannelId) -> Result<Box<dyn VoiceSink>, JukebotError>;
}

/// Accepts encoded opus frames for one voice connection.
///
/// `write_frame` provides the pipeline's backpressure: it blocks while
/// the device's transmit buffer is full. Closing the sink releases the
/// connection but does not leave the channel; the engine decides whether
/// to idle in place or move.
#[async_trait]
pub trait VoiceSink: Send {
    /// Writes one 20 ms opus frame, blocking on the device buffer.
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), JukebotError>;

    /// Releases the voice connection.
    async fn close(&mut self) -> Result<(), JukebotError>;
}
