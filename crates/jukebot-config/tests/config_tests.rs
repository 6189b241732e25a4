// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading and merging.

use jukebot_config::{load_config_from_str, JukebotConfig};

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.bot.name, "jukebot");
    assert_eq!(config.bot.log_level, "info");
    assert_eq!(config.storage.database_path, "jukebot.db");
    assert!(config.gateway.token.is_none());
}

#[test]
fn toml_overrides_defaults() {
    let config = load_config_from_str(
        r#"
        [bot]
        log_level = "debug"

        [gateway]
        token = "secret"

        [storage]
        database_path = "/var/lib/jukebot/tenants.db"

        [providers]
        soundcloud_client_id = "abc123"
        ytdlp_path = "/usr/local/bin/yt-dlp"

        [audio]
        loudness = -18.0
        "#,
    )
    .unwrap();

    assert_eq!(config.bot.log_level, "debug");
    assert_eq!(config.gateway.token.as_deref(), Some("secret"));
    assert_eq!(config.storage.database_path, "/var/lib/jukebot/tenants.db");
    assert_eq!(
        config.providers.soundcloud_client_id.as_deref(),
        Some("abc123")
    );
    assert_eq!(config.providers.ytdlp_path, "/usr/local/bin/yt-dlp");
    assert_eq!(config.audio.loudness, -18.0);
    // Unset sections keep their defaults.
    assert_eq!(config.bot.name, "jukebot");
    assert_eq!(config.providers.streamlink_path, "streamlink");
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = load_config_from_str(
        r#"
        [audio]
        ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
        "#,
    )
    .unwrap();
    assert_eq!(config.audio.ffmpeg_path, "/opt/ffmpeg/bin/ffmpeg");
    assert_eq!(config.audio.loudness, 0.0);
}

#[test]
fn unknown_keys_fail_extraction() {
    let result = load_config_from_str(
        r#"
        [bot]
        loglevel = "debug"
        "#,
    );
    assert!(result.is_err());
}

#[test]
fn config_serializes_back_to_equivalent_toml() {
    let config = JukebotConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: JukebotConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.bot.name, config.bot.name);
    assert_eq!(back.storage.database_path, config.storage.database_path);
}
