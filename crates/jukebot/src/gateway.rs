// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat gateway adapter selection.
//!
//! The core consumes the gateway only through the [`ChatGateway`] and
//! [`VoiceDevice`] traits; concrete platform adapters are separate
//! crates compiled in behind cargo features, the same way the channel
//! adapters are selected at build time. With no adapter compiled in,
//! `serve` refuses to start.

use std::sync::Arc;

use jukebot_config::JukebotConfig;
use jukebot_core::{ChatGateway, JukebotError, VoiceDevice};

/// Connects the configured chat gateway adapter.
pub async fn connect(
    config: &JukebotConfig,
) -> Result<(Arc<dyn ChatGateway>, Arc<dyn VoiceDevice>), JukebotError> {
    if config.gateway.token.is_none() {
        return Err(JukebotError::Config(
            "gateway token missing (set [gateway] token)".into(),
        ));
    }
    Err(JukebotError::Config(
        "no chat gateway adapter compiled in; rebuild with a gateway adapter crate enabled".into(),
    ))
}
