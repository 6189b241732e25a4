// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media providers: resolve a URL or search term to playable track
//! metadata with on-demand stream openers.
//!
//! Catalog order is the tie-break order: specific URL providers first,
//! then the free-text search, then the generic capability-probing
//! fallback. The first `can_handle` wins.

pub mod bandcamp;
pub mod fallback;
pub mod search;
pub mod soundcloud;
pub mod stream;
pub mod twitch;
pub mod youtube;

use std::sync::Arc;

use jukebot_core::MediaProvider;
use url::Url;

pub use bandcamp::Bandcamp;
pub use fallback::Fallback;
pub use search::Search;
pub use soundcloud::Soundcloud;
pub use stream::{CommandOpener, HttpOpener};
pub use twitch::Twitch;
pub use youtube::Youtube;

/// Settings shared by the built-in providers.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub ytdlp_path: String,
    pub streamlink_path: String,
    /// `None` leaves soundcloud out of the catalog.
    pub soundcloud_client_id: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            streamlink_path: "streamlink".to_string(),
            soundcloud_client_id: None,
        }
    }
}

/// The host part of an absolute http(s) URL, lowercased. `None` for
/// anything that is not such a URL.
pub(crate) fn url_host(arg: &str) -> Option<String> {
    let url = Url::parse(arg).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str().map(|h| h.to_ascii_lowercase())
}

/// Builds the provider catalog in tie-break order.
pub fn builtin_providers(settings: &ProviderSettings) -> Vec<Arc<dyn MediaProvider>> {
    let client = reqwest::Client::new();
    let mut providers: Vec<Arc<dyn MediaProvider>> = vec![Arc::new(Youtube::new(
        &settings.ytdlp_path,
        &settings.streamlink_path,
    ))];
    if let Some(client_id) = &settings.soundcloud_client_id {
        providers.push(Arc::new(Soundcloud::new(client.clone(), client_id)));
    }
    providers.push(Arc::new(Bandcamp::new(client)));
    providers.push(Arc::new(Twitch::new(&settings.streamlink_path)));
    providers.push(Arc::new(Search::new(
        &settings.ytdlp_path,
        &settings.streamlink_path,
    )));
    providers.push(Arc::new(Fallback::new(
        &settings.ytdlp_path,
        &settings.streamlink_path,
    )));
    providers
}

#[cfg(test)]
mod tests {
    use jukebot_core::match_provider;

    use super::*;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            // A path that cannot exist keeps the fallback probe inert in
            // tests.
            ytdlp_path: "/nonexistent/yt-dlp".to_string(),
            streamlink_path: "/nonexistent/streamlink".to_string(),
            soundcloud_client_id: Some("client123".to_string()),
        }
    }

    #[test]
    fn catalog_order_is_the_tie_break_order() {
        let providers = builtin_providers(&settings());
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["youtube", "soundcloud", "bandcamp", "twitch", "search", "fallback"]
        );
    }

    #[test]
    fn soundcloud_is_omitted_without_client_id() {
        let mut s = settings();
        s.soundcloud_client_id = None;
        let providers = builtin_providers(&s);
        assert!(providers.iter().all(|p| p.name() != "soundcloud"));
    }

    #[tokio::test]
    async fn first_matching_provider_wins() {
        let providers = builtin_providers(&settings());

        let yt = match_provider(&providers, "https://youtu.be/abc")
            .await
            .unwrap();
        assert_eq!(yt.name(), "youtube");

        let sc = match_provider(&providers, "https://soundcloud.com/a/t")
            .await
            .unwrap();
        assert_eq!(sc.name(), "soundcloud");

        let tw = match_provider(&providers, "https://twitch.tv/streamer")
            .await
            .unwrap();
        assert_eq!(tw.name(), "twitch");

        let free_text = match_provider(&providers, "some song name")
            .await
            .unwrap();
        assert_eq!(free_text.name(), "search");
    }

    #[tokio::test]
    async fn unhandled_urls_fall_through_to_nothing_when_probe_fails() {
        let providers = builtin_providers(&settings());
        // URL no specific provider claims; the fallback probe cannot run.
        let result = match_provider(&providers, "https://example.org/media.mp3").await;
        assert!(result.is_none());
    }

    #[test]
    fn url_host_parses_absolute_http_urls_only() {
        assert_eq!(
            url_host("https://WWW.YouTube.com/watch").as_deref(),
            Some("www.youtube.com")
        );
        assert!(url_host("ftp://youtube.com/x").is_none());
        assert!(url_host("youtube.com/watch").is_none());
        assert!(url_host("plain words").is_none());
    }
}
