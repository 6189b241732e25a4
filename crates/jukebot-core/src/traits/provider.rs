// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media provider trait and the metadata/stream types it produces.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::JukebotError;

/// A raw media byte stream.
///
/// Dropping the stream releases every resource behind it: HTTP
/// connections close and helper subprocesses are terminated and reaped.
pub type MediaStream = Box<dyn AsyncRead + Send + Unpin>;

/// Opens a media byte stream on demand.
///
/// Openers capture no mutable shared state; opening twice yields two
/// independent streams.
#[async_trait]
pub trait MediaOpener: Send + Sync {
    async fn open(&self) -> Result<MediaStream, JukebotError>;
}

/// The stream capability of a resolved track.
///
/// Most providers yield audio only; live providers may expose separate
/// audio and video streams. The variant is the capability test; there
/// is no downcasting.
pub enum MediaSource {
    Audio(Box<dyn MediaOpener>),
    AudioVideo {
        audio: Box<dyn MediaOpener>,
        video: Box<dyn MediaOpener>,
    },
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaSource::Audio(_) => f.write_str("MediaSource::Audio"),
            MediaSource::AudioVideo { .. } => f.write_str("MediaSource::AudioVideo"),
        }
    }
}

/// Immutable descriptor for one playable track.
///
/// Title and duration are display-only; a zero duration signals live
/// content. Shared as `Arc<TrackMetadata>` between the queue, the status
/// view, and requeue.
#[derive(Debug)]
pub struct TrackMetadata {
    pub title: String,
    pub duration: Duration,
    pub source: MediaSource,
}

impl TrackMetadata {
    /// Opens the audio stream, regardless of which capability variant
    /// the provider produced.
    pub async fn open_audio(&self) -> Result<MediaStream, JukebotError> {
        match &self.source {
            MediaSource::Audio(opener) => opener.open().await,
            MediaSource::AudioVideo { audio, .. } => audio.open().await,
        }
    }

    /// Opens the separate audio and video streams, when the provider
    /// exposes them.
    pub async fn open_audio_video(
        &self,
    ) -> Result<Option<(MediaStream, MediaStream)>, JukebotError> {
        match &self.source {
            MediaSource::Audio(_) => Ok(None),
            MediaSource::AudioVideo { audio, video } => {
                Ok(Some((audio.open().await?, video.open().await?)))
            }
        }
    }

    /// True when the duration is unknown (live content).
    pub fn is_live(&self) -> bool {
        self.duration.is_zero()
    }
}

/// Resolves a URL or search term into playable track metadata.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Name used in logs and for the synthesized fallback command.
    fn name(&self) -> &str;

    /// Capability predicate. URL providers test scheme and host; search
    /// providers accept any non-URL text; the generic fallback may probe
    /// a helper process, which is why this is async.
    async fn can_handle(&self, arg: &str) -> bool;

    /// Resolves the argument. May block on remote I/O. Resolution
    /// errors surface to the user; they are never retried against other
    /// providers.
    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError>;
}

/// Returns the first provider whose `can_handle` accepts the argument,
/// in declaration order.
pub async fn match_provider<'a>(
    providers: &'a [Arc<dyn MediaProvider>],
    arg: &str,
) -> Option<&'a Arc<dyn MediaProvider>> {
    for provider in providers {
        if provider.can_handle(arg).await {
            return Some(provider);
        }
    }
    None
}
