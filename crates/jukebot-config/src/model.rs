// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the jukebot process.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject
//! unrecognized config keys at startup. This is the *process* config;
//! the per-tenant record lives in the store and tolerates unknown
//! fields instead.

use serde::{Deserialize, Serialize};

/// Top-level jukebot configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections default to sensible values except
/// the gateway token.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JukebotConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Chat gateway session settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Media provider settings.
    #[serde(default)]
    pub providers: ProviderConfig,

    /// Audio pipeline settings.
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs and presence.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "jukebot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat gateway session configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Gateway authentication token. `None` means no adapter can start.
    #[serde(default)]
    pub token: Option<String>,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "jukebot.db".to_string()
}

/// Media provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Soundcloud API client id. `None` disables the soundcloud
    /// provider.
    #[serde(default)]
    pub soundcloud_client_id: Option<String>,

    /// Path to the yt-dlp helper binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    /// Path to the streamlink helper binary.
    #[serde(default = "default_streamlink_path")]
    pub streamlink_path: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            soundcloud_client_id: None,
            ytdlp_path: default_ytdlp_path(),
            streamlink_path: default_streamlink_path(),
        }
    }
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_streamlink_path() -> String {
    "streamlink".to_string()
}

/// Audio pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    /// Path to the ffmpeg binary used by the transcoder.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Default loudness target applied to tenants that have not set
    /// their own. Values outside `[-70, -5]` disable normalization.
    #[serde(default)]
    pub loudness: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            loudness: 0.0,
        }
    }
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = JukebotConfig::default();
        assert_eq!(config.bot.name, "jukebot");
        assert_eq!(config.bot.log_level, "info");
        assert!(config.gateway.token.is_none());
        assert_eq!(config.storage.database_path, "jukebot.db");
        assert_eq!(config.providers.ytdlp_path, "yt-dlp");
        assert_eq!(config.audio.ffmpeg_path, "ffmpeg");
        assert_eq!(config.audio.loudness, 0.0);
    }

    #[test]
    fn unknown_process_config_keys_are_rejected() {
        let result: Result<JukebotConfig, _> =
            serde_json::from_str(r#"{"bot":{"name":"x","log_level":"info","nope":1}}"#);
        assert!(result.is_err());
    }
}
