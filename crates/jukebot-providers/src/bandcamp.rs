// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bandcamp provider: scrapes the track page for the embedded
//! trackinfo blob.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use jukebot_core::{
    JukebotError, MediaProvider, MediaSource, ProviderErrorKind, TrackMetadata,
};
use regex::Regex;
use serde::Deserialize;

use crate::stream::HttpOpener;
use crate::url_host;

fn host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"bandcamp\.com").expect("static regex"))
}

fn trackinfo_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"trackinfo\s*:\s*\[(\{.*?\})\s*[,\]]"#).expect("static regex"))
}

pub struct Bandcamp {
    client: reqwest::Client,
}

impl Bandcamp {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct TrackInfo {
    #[serde(default)]
    title: String,
    /// Seconds.
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    file: Option<TrackFile>,
}

#[derive(Debug, Deserialize)]
struct TrackFile {
    #[serde(rename = "mp3-128")]
    mp3_128: Option<String>,
}

#[async_trait]
impl MediaProvider for Bandcamp {
    fn name(&self) -> &str {
        "bandcamp"
    }

    async fn can_handle(&self, arg: &str) -> bool {
        url_host(arg).is_some_and(|host| host_regex().is_match(&host))
    }

    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError> {
        let response = self
            .client
            .get(arg)
            .send()
            .await
            .map_err(|e| JukebotError::provider(ProviderErrorKind::Network, e.to_string()))?;
        if !response.status().is_success() {
            return Err(JukebotError::provider(
                ProviderErrorKind::NotFound,
                format!("track page fetch failed: {}", response.status()),
            ));
        }
        let body = response
            .text()
            .await
            .map_err(|e| JukebotError::provider(ProviderErrorKind::Network, e.to_string()))?;

        let blob = trackinfo_regex()
            .captures(&body)
            .and_then(|c| c.get(1))
            .ok_or_else(|| {
                JukebotError::provider(ProviderErrorKind::NotFound, "could not find track info")
            })?;
        let info: TrackInfo = serde_json::from_str(blob.as_str()).map_err(|e| {
            JukebotError::provider(ProviderErrorKind::Internal, format!("bad track info: {e}"))
        })?;

        let mp3 = info.file.and_then(|f| f.mp3_128).ok_or_else(|| {
            JukebotError::provider(ProviderErrorKind::Unsupported, "track has no stream")
        })?;

        Ok(Arc::new(TrackMetadata {
            title: info.title,
            duration: Duration::from_secs_f64(info.duration.max(0.0)),
            source: MediaSource::Audio(Box::new(HttpOpener {
                client: self.client.clone(),
                url: mp3,
            })),
        }))
    }
}
