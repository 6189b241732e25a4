// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic fallback provider: probes the helper process for any URL the
//! specific providers declined.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use jukebot_core::{JukebotError, MediaProvider, TrackMetadata};
use tokio::process::Command;
use tracing::debug;

use crate::youtube::resolve_with_ytdlp;

/// Last in the catalog: asks yt-dlp whether it can extract the target
/// at all, then resolves the same way the youtube provider does.
pub struct Fallback {
    ytdlp: String,
    streamlink: String,
}

impl Fallback {
    pub fn new(ytdlp: impl Into<String>, streamlink: impl Into<String>) -> Self {
        Self {
            ytdlp: ytdlp.into(),
            streamlink: streamlink.into(),
        }
    }
}

#[async_trait]
impl MediaProvider for Fallback {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn can_handle(&self, arg: &str) -> bool {
        if arg.trim().is_empty() {
            return false;
        }
        let probe = Command::new(&self.ytdlp)
            .args(["--simulate", "--quiet", "--no-playlist", "--", arg])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match probe {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(error = %e, "capability probe failed to run");
                false
            }
        }
    }

    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError> {
        resolve_with_ytdlp(&self.ytdlp, &self.streamlink, arg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn declines_when_probe_cannot_run() {
        let fallback = Fallback::new("/nonexistent/yt-dlp", "streamlink");
        assert!(!fallback.can_handle("https://example.com/media").await);
    }

    #[tokio::test]
    async fn declines_empty_input_without_probing() {
        let fallback = Fallback::new("/nonexistent/yt-dlp", "streamlink");
        assert!(!fallback.can_handle("").await);
    }
}
