// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media provider for deterministic testing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use jukebot_core::{
    JukebotError, MediaOpener, MediaProvider, MediaSource, MediaStream, ProviderErrorKind,
    TrackMetadata,
};

/// Opener yielding an empty stream; pair with a mock transcoder that
/// scripts its own frames.
pub struct SilenceOpener;

#[async_trait]
impl MediaOpener for SilenceOpener {
    async fn open(&self) -> Result<MediaStream, JukebotError> {
        Ok(Box::new(tokio::io::empty()))
    }
}

/// Builds a track descriptor backed by a silent stream.
pub fn silent_track(title: &str, duration: Duration) -> Arc<TrackMetadata> {
    Arc::new(TrackMetadata {
        title: title.to_string(),
        duration,
        source: MediaSource::Audio(Box::new(SilenceOpener)),
    })
}

/// A mock provider that accepts arguments starting with a fixed prefix
/// and resolves them to a configured track.
pub struct MockProvider {
    name: String,
    arg_prefix: String,
    track_title: String,
    track_duration: Duration,
    fail_with: Option<ProviderErrorKind>,
    resolved: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(name: &str, arg_prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            arg_prefix: arg_prefix.to_string(),
            track_title: "Song".to_string(),
            track_duration: Duration::from_secs(180),
            fail_with: None,
            resolved: Mutex::new(Vec::new()),
        }
    }

    /// Sets the track every resolution returns.
    pub fn with_track(mut self, title: &str, duration: Duration) -> Self {
        self.track_title = title.to_string();
        self.track_duration = duration;
        self
    }

    /// Makes every resolution fail with the given kind.
    pub fn failing(mut self, kind: ProviderErrorKind) -> Self {
        self.fail_with = Some(kind);
        self
    }

    /// Arguments this provider has been asked to resolve.
    pub async fn resolved_args(&self) -> Vec<String> {
        self.resolved.lock().await.clone()
    }
}

#[async_trait]
impl MediaProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn can_handle(&self, arg: &str) -> bool {
        arg.starts_with(&self.arg_prefix)
    }

    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError> {
        self.resolved.lock().await.push(arg.to_string());
        if let Some(kind) = self.fail_with {
            return Err(JukebotError::provider(kind, "mock resolution failure"));
        }
        Ok(silent_track(&self.track_title, self.track_duration))
    }
}
