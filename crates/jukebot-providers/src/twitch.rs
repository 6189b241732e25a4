// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twitch provider: live broadcasts through streamlink.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use jukebot_core::{JukebotError, MediaProvider, MediaSource, TrackMetadata};
use regex::Regex;

use crate::stream::CommandOpener;
use crate::url_host;

fn host_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"twitch\.tv").expect("static regex"))
}

pub struct Twitch {
    streamlink: String,
}

impl Twitch {
    pub fn new(streamlink: impl Into<String>) -> Self {
        Self {
            streamlink: streamlink.into(),
        }
    }
}

#[async_trait]
impl MediaProvider for Twitch {
    fn name(&self) -> &str {
        "twitch"
    }

    async fn can_handle(&self, arg: &str) -> bool {
        url_host(arg).is_some_and(|host| host_regex().is_match(&host))
    }

    // TODO query the twitch api for whether the broadcaster is online
    // and use the broadcast title instead of the raw URL.
    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError> {
        Ok(Arc::new(TrackMetadata {
            title: arg.to_string(),
            duration: Duration::ZERO,
            source: MediaSource::Audio(Box::new(CommandOpener::new(
                &self.streamlink,
                &["-O", arg, "audio_only,best"],
            ))),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_twitch_urls_only() {
        let tw = Twitch::new("streamlink");
        assert!(tw.can_handle("https://www.twitch.tv/somestreamer").await);
        assert!(!tw.can_handle("https://example.tv/somestreamer").await);
        assert!(!tw.can_handle("somestreamer").await);
    }

    #[tokio::test]
    async fn resolves_as_live_content() {
        let tw = Twitch::new("streamlink");
        let md = tw
            .resolve("https://www.twitch.tv/somestreamer")
            .await
            .unwrap();
        assert!(md.is_live());
        assert_eq!(md.title, "https://www.twitch.tv/somestreamer");
    }
}
