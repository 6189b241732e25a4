// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Play records and their callback sets.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jukebot_core::{ChannelId, JukebotError, TrackMetadata};
use tokio_util::sync::CancellationToken;

/// Future type returned by play hooks.
pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

fn noop() -> HookFuture {
    Box::pin(async {})
}

/// Why a play ended. Reported through `on_end` exactly once per
/// admitted play.
#[derive(Debug)]
pub enum EndReason {
    /// The stream was pumped to completion.
    Completed,
    /// A skip ended the play early.
    Skipped,
    /// The play was dropped from the queue before it started.
    Cleared,
    /// The engine closed while the play was queued or current.
    Closed,
    /// The provider stream could not be opened.
    ProviderError(JukebotError),
    /// The voice channel could not be acquired.
    VoiceError(JukebotError),
    /// The transcode pipeline or frame sink failed mid-stream.
    StreamError(JukebotError),
}

impl EndReason {
    /// True for reasons that represent failures rather than lifecycle.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            EndReason::ProviderError(_) | EndReason::VoiceError(_) | EndReason::StreamError(_)
        )
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::Completed => write!(f, "completed"),
            EndReason::Skipped => write!(f, "skipped"),
            EndReason::Cleared => write!(f, "cleared"),
            EndReason::Closed => write!(f, "closed"),
            EndReason::ProviderError(e) => write!(f, "provider error: {e}"),
            EndReason::VoiceError(e) => write!(f, "voice error: {e}"),
            EndReason::StreamError(e) => write!(f, "stream error: {e}"),
        }
    }
}

/// Callback set attached to one play.
///
/// All hooks run on the sender task and are awaited there; a hook that
/// must not stall the audio pipeline (progress-driven status edits)
/// spawns its own task and returns immediately.
pub struct PlayHooks {
    /// The voice connection and transcode pipeline are up; the first
    /// frame is about to be written.
    pub on_start: Box<dyn FnMut() -> HookFuture + Send>,
    /// Playback paused with the given elapsed time.
    pub on_pause: Box<dyn FnMut(Duration) -> HookFuture + Send>,
    /// Playback resumed with the given elapsed time.
    pub on_resume: Box<dyn FnMut(Duration) -> HookFuture + Send>,
    /// Fired on a fixed wall-clock cadence with the elapsed time and the
    /// frame write timestamps accumulated since the previous tick.
    pub on_progress: Box<dyn FnMut(Duration, Vec<Instant>) -> HookFuture + Send>,
    /// The play ended. Fired exactly once regardless of outcome.
    pub on_end: Box<dyn FnOnce(Duration, EndReason) -> HookFuture + Send>,
}

impl PlayHooks {
    /// A hook set that does nothing. Useful as a base for callers that
    /// only care about some of the callbacks.
    pub fn noop() -> Self {
        Self {
            on_start: Box::new(noop),
            on_pause: Box::new(|_| noop()),
            on_resume: Box::new(|_| noop()),
            on_progress: Box::new(|_, _| noop()),
            on_end: Box::new(|_, _| noop()),
        }
    }
}

impl std::fmt::Debug for PlayHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PlayHooks")
    }
}

/// An admission request: everything the caller decides about a play.
pub struct PlayRequest {
    pub metadata: Arc<TrackMetadata>,
    pub voice_channel: ChannelId,
    /// Loudness normalization target, already range-validated by the
    /// caller (`None` disables the filter).
    pub loudness: Option<f64>,
    pub hooks: PlayHooks,
}

/// One accepted queue entry. Created on admission, destroyed on end.
pub(crate) struct Play {
    pub metadata: Arc<TrackMetadata>,
    pub voice_channel: ChannelId,
    pub loudness: Option<f64>,
    pub hooks: PlayHooks,
    pub sequence: u64,
    pub skip: CancellationToken,
}

/// Read-only snapshot of the current play.
#[derive(Debug, Clone)]
pub struct NowPlaying {
    pub title: String,
    pub duration: Duration,
    pub metadata: Arc<TrackMetadata>,
    pub voice_channel: ChannelId,
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_reason_error_classification() {
        assert!(!EndReason::Completed.is_error());
        assert!(!EndReason::Skipped.is_error());
        assert!(!EndReason::Cleared.is_error());
        assert!(!EndReason::Closed.is_error());
        assert!(EndReason::StreamError(JukebotError::Internal("x".into())).is_error());
        assert!(EndReason::VoiceError(JukebotError::InvalidVoiceChannel).is_error());
    }

    #[tokio::test]
    async fn noop_hooks_complete() {
        let mut hooks = PlayHooks::noop();
        (hooks.on_start)().await;
        (hooks.on_pause)(Duration::from_secs(1)).await;
        (hooks.on_resume)(Duration::from_secs(1)).await;
        (hooks.on_progress)(Duration::from_secs(5), Vec::new()).await;
        (hooks.on_end)(Duration::from_secs(9), EndReason::Completed).await;
    }
}
