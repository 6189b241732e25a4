// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./jukebot.toml` >
//! `~/.config/jukebot/jukebot.toml` > `/etc/jukebot/jukebot.toml`, with
//! environment variable overrides via the `JUKEBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::JukebotConfig;

/// Load configuration from the standard XDG hierarchy with env var
/// overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/jukebot/jukebot.toml` (system-wide)
/// 3. `~/.config/jukebot/jukebot.toml` (user XDG config)
/// 4. `./jukebot.toml` (local directory)
/// 5. `JUKEBOT_*` environment variables
pub fn load_config() -> Result<JukebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JukebotConfig::default()))
        .merge(Toml::file("/etc/jukebot/jukebot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("jukebot/jukebot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("jukebot.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an explicit TOML file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<JukebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JukebotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (used in tests and for
/// explicit config content).
pub fn load_config_from_str(toml_content: &str) -> Result<JukebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(JukebotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `JUKEBOT_STORAGE_DATABASE_PATH`
/// must map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("JUKEBOT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("bot_", "bot.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("providers_", "providers.", 1)
            .replacen("audio_", "audio.", 1);
        mapped.into()
    })
}
