// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Youtube provider: URL resolution through yt-dlp, with live streams
//! handed to streamlink.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use jukebot_core::{
    JukebotError, MediaProvider, MediaSource, ProviderErrorKind, TrackMetadata,
};
use regex::Regex;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::stream::CommandOpener;
use crate::url_host;

fn host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"youtube\.com|youtu\.be").expect("static regex"))
}

pub struct Youtube {
    ytdlp: String,
    streamlink: String,
}

impl Youtube {
    pub fn new(ytdlp: impl Into<String>, streamlink: impl Into<String>) -> Self {
        Self {
            ytdlp: ytdlp.into(),
            streamlink: streamlink.into(),
        }
    }
}

#[async_trait]
impl MediaProvider for Youtube {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn can_handle(&self, arg: &str) -> bool {
        url_host(arg).is_some_and(|host| host_regex().is_match(&host))
    }

    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError> {
        resolve_with_ytdlp(&self.ytdlp, &self.streamlink, arg).await
    }
}

/// The slice of yt-dlp's `-J` output the providers consume. A search
/// target comes back as a playlist wrapper with `entries`.
#[derive(Debug, Deserialize)]
pub(crate) struct YtdlpInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    is_live: Option<bool>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    entries: Option<Vec<YtdlpInfo>>,
}

/// Resolves any yt-dlp target (URL or `ytsearchN:` query) to track
/// metadata with stream openers attached.
pub(crate) async fn resolve_with_ytdlp(
    ytdlp: &str,
    streamlink: &str,
    target: &str,
) -> Result<Arc<TrackMetadata>, JukebotError> {
    let output = Command::new(ytdlp)
        .args(["-J", "--no-playlist", "--", target])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            JukebotError::provider(
                ProviderErrorKind::Internal,
                format!("failed to run {ytdlp}: {e}"),
            )
        })?;
    if !output.status.success() {
        return Err(JukebotError::provider(
            ProviderErrorKind::NotFound,
            "no playable media found",
        ));
    }

    let mut info: YtdlpInfo = serde_json::from_slice(&output.stdout).map_err(|e| {
        JukebotError::provider(ProviderErrorKind::Internal, format!("bad yt-dlp output: {e}"))
    })?;

    // Search targets wrap the result in a one-entry playlist.
    if let Some(entries) = info.entries.take() {
        info = entries.into_iter().next().ok_or_else(|| {
            JukebotError::provider(ProviderErrorKind::NotFound, "no results")
        })?;
    }

    let title = info.title.unwrap_or_else(|| target.to_string());
    let stream_url = info.webpage_url.unwrap_or_else(|| target.to_string());
    let live = info.is_live.unwrap_or(false);
    let duration = info
        .duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::ZERO);

    debug!(title = %title, live, "yt-dlp resolution complete");

    let metadata = if live {
        // Live downloads through yt-dlp stall; streamlink keeps up and
        // can also serve the video side.
        TrackMetadata {
            title,
            duration: Duration::ZERO,
            source: MediaSource::AudioVideo {
                audio: Box::new(CommandOpener::new(
                    streamlink,
                    &["-O", &stream_url, "audio_only,best"],
                )),
                video: Box::new(CommandOpener::new(streamlink, &["-O", &stream_url, "best"])),
            },
        }
    } else {
        TrackMetadata {
            title,
            duration,
            source: MediaSource::Audio(Box::new(CommandOpener::new(
                ytdlp,
                &["-f", "bestaudio/best", "-o", "-", "--quiet", "--", &stream_url],
            ))),
        }
    };
    Ok(Arc::new(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Youtube {
        Youtube::new("yt-dlp", "streamlink")
    }

    #[tokio::test]
    async fn accepts_youtube_urls() {
        let yt = provider();
        assert!(yt.can_handle("https://www.youtube.com/watch?v=abc123").await);
        assert!(yt.can_handle("https://youtu.be/abc123").await);
        assert!(yt.can_handle("http://music.youtube.com/watch?v=abc").await);
    }

    #[tokio::test]
    async fn rejects_other_arguments() {
        let yt = provider();
        assert!(!yt.can_handle("https://example.com/watch?v=abc").await);
        assert!(!yt.can_handle("some search words").await);
        assert!(!yt.can_handle("").await);
        // Scheme required, host alone is not enough.
        assert!(!yt.can_handle("youtube.com/watch?v=abc").await);
    }

    #[test]
    fn ytdlp_playlist_wrapper_parses() {
        let json = r#"{"entries":[{"title":"Song","duration":180.0,"webpage_url":"https://youtu.be/x"}]}"#;
        let info: YtdlpInfo = serde_json::from_str(json).unwrap();
        let entries = info.entries.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Song"));
    }
}
