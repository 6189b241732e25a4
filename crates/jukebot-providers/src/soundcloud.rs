// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Soundcloud provider: track resolution through the public API.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use jukebot_core::{
    JukebotError, MediaProvider, MediaSource, ProviderErrorKind, TrackMetadata,
};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::stream::HttpOpener;
use crate::url_host;

const RESOLVE_ENDPOINT: &str = "https://api.soundcloud.com/resolve";

fn host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"soundcloud\.com").expect("static regex"))
}

pub struct Soundcloud {
    client: reqwest::Client,
    client_id: String,
}

impl Soundcloud {
    pub fn new(client: reqwest::Client, client_id: impl Into<String>) -> Self {
        Self {
            client,
            client_id: client_id.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TrackInfo {
    #[serde(default)]
    downloadable: bool,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    streamable: bool,
    #[serde(default)]
    stream_url: Option<String>,
    #[serde(default)]
    title: String,
    /// Milliseconds.
    #[serde(default)]
    duration: u64,
}

#[async_trait]
impl MediaProvider for Soundcloud {
    fn name(&self) -> &str {
        "soundcloud"
    }

    async fn can_handle(&self, arg: &str) -> bool {
        url_host(arg).is_some_and(|host| host_regex().is_match(&host))
    }

    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError> {
        if self.client_id.is_empty() {
            return Err(JukebotError::provider(
                ProviderErrorKind::Unsupported,
                "no soundcloud client id set up",
            ));
        }

        let response = self
            .client
            .get(RESOLVE_ENDPOINT)
            .query(&[("client_id", self.client_id.as_str()), ("url", arg)])
            .send()
            .await
            .map_err(|e| JukebotError::provider(ProviderErrorKind::Network, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(JukebotError::provider(
                ProviderErrorKind::NotFound,
                "track not found",
            ));
        }
        if !status.is_success() {
            return Err(JukebotError::provider(
                ProviderErrorKind::Network,
                format!("soundcloud resolve failed: {status}"),
            ));
        }

        let info: TrackInfo = response
            .json()
            .await
            .map_err(|e| JukebotError::provider(ProviderErrorKind::Internal, e.to_string()))?;
        debug!(title = %info.title, "soundcloud track resolved");

        let download_url = if info.downloadable {
            info.download_url
        } else if info.streamable {
            info.stream_url
        } else {
            None
        };
        let download_url = download_url.ok_or_else(|| {
            JukebotError::provider(ProviderErrorKind::Unsupported, "couldn't get a download url")
        })?;

        Ok(Arc::new(TrackMetadata {
            title: info.title,
            duration: Duration::from_millis(info.duration),
            source: MediaSource::Audio(Box::new(HttpOpener {
                client: self.client.clone(),
                url: format!("{download_url}?client_id={}", self.client_id),
            })),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> Soundcloud {
        Soundcloud::new(reqwest::Client::new(), "client123")
    }

    #[tokio::test]
    async fn accepts_soundcloud_urls_only() {
        let sc = provider();
        assert!(sc.can_handle("https://soundcloud.com/artist/track").await);
        assert!(!sc.can_handle("https://example.com/artist/track").await);
        assert!(!sc.can_handle("search words").await);
    }

    #[tokio::test]
    async fn missing_client_id_is_unsupported() {
        let sc = Soundcloud::new(reqwest::Client::new(), "");
        let err = sc
            .resolve("https://soundcloud.com/artist/track")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JukebotError::Provider {
                kind: ProviderErrorKind::Unsupported,
                ..
            }
        ));
    }

    #[test]
    fn track_info_picks_download_then_stream_url() {
        let info: TrackInfo = serde_json::from_str(
            r#"{"downloadable":true,"download_url":"https://dl","streamable":true,
                "stream_url":"https://st","title":"T","duration":1000}"#,
        )
        .unwrap();
        assert!(info.downloadable);
        assert_eq!(info.download_url.as_deref(), Some("https://dl"));
        assert_eq!(info.duration, 1000);
    }
}
