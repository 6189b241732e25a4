// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search provider: free-text queries resolved to the top result.

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use jukebot_core::{JukebotError, MediaProvider, TrackMetadata};
use regex::Regex;

use crate::youtube::resolve_with_ytdlp;

fn url_scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://").expect("static regex"))
}

/// Accepts any non-empty non-URL argument as a search query.
pub struct Search {
    ytdlp: String,
    streamlink: String,
}

impl Search {
    pub fn new(ytdlp: impl Into<String>, streamlink: impl Into<String>) -> Self {
        Self {
            ytdlp: ytdlp.into(),
            streamlink: streamlink.into(),
        }
    }
}

#[async_trait]
impl MediaProvider for Search {
    fn name(&self) -> &str {
        "search"
    }

    async fn can_handle(&self, arg: &str) -> bool {
        !arg.trim().is_empty() && !url_scheme_regex().is_match(arg)
    }

    async fn resolve(&self, arg: &str) -> Result<Arc<TrackMetadata>, JukebotError> {
        resolve_with_ytdlp(&self.ytdlp, &self.streamlink, &format!("ytsearch1:{arg}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_free_text() {
        let search = Search::new("yt-dlp", "streamlink");
        assert!(search.can_handle("never gonna give you up").await);
        assert!(search.can_handle("a").await);
    }

    #[tokio::test]
    async fn rejects_urls_and_empty_input() {
        let search = Search::new("yt-dlp", "streamlink");
        assert!(!search.can_handle("https://example.com/x").await);
        assert!(!search.can_handle("http://example.com/x").await);
        assert!(!search.can_handle("").await);
        assert!(!search.can_handle("   ").await);
    }
}
