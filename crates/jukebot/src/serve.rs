// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `jukebot serve` command implementation.
//!
//! Wires the store, provider catalog, transcoder, and event router
//! together and runs until a shutdown signal drains everything.

use std::sync::Arc;

use jukebot_agent::{shutdown_token, Catalog, EventRouter};
use jukebot_config::JukebotConfig;
use jukebot_core::JukebotError;
use jukebot_engine::{EngineConfig, FfmpegTranscoder};
use jukebot_providers::{builtin_providers, ProviderSettings};
use jukebot_storage::SqliteConfigStore;
use tracing::info;

use crate::gateway;

/// Runs the `jukebot serve` command until shutdown.
pub async fn run_serve(config: JukebotConfig) -> Result<(), JukebotError> {
    init_tracing(&config.bot.log_level);
    info!(name = %config.bot.name, "starting jukebot serve");

    // Store open failure is fatal: without persistence every tenant
    // would silently lose its configuration.
    let store = Arc::new(SqliteConfigStore::open(&config.storage.database_path).await?);

    let providers = Arc::new(builtin_providers(&ProviderSettings {
        ytdlp_path: config.providers.ytdlp_path.clone(),
        streamlink_path: config.providers.streamlink_path.clone(),
        soundcloud_client_id: config.providers.soundcloud_client_id.clone(),
    }));
    let catalog = Arc::new(Catalog::builtin());
    let transcoder = Arc::new(FfmpegTranscoder::new(&config.audio.ffmpeg_path));

    let (chat, voice) = gateway::connect(&config).await?;

    let router = EventRouter::new(
        chat,
        voice,
        transcoder,
        store,
        catalog,
        providers,
        EngineConfig::default(),
    );

    let cancel = shutdown_token();
    router.run(cancel).await
}

/// Initializes the tracing subscriber from the configured level;
/// `RUST_LOG` still overrides.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
