// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status view: one live chat message per tenant, projected from
//! playback state, with emoji reactions acting as buttons.
//!
//! All reconciliation runs under a single async mutex, so create, edit,
//! and delete for one tenant's message are strictly ordered even when
//! progress-driven edits arrive from short-lived tasks.

pub mod embed;

use std::sync::Arc;

use jukebot_core::{ChannelId, ChatGateway, Embed, JukebotError, MessageId};
use tracing::{debug, warn};

pub use embed::{debug_footer, frame_latencies, latency_stats, now_playing_embed, pretty_time};

/// Reference to the currently displayed status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessageRef {
    pub channel: ChannelId,
    pub message: MessageId,
}

/// Owns at most one status message and reconciles playback state onto
/// the chat surface.
pub struct StatusView {
    gateway: Arc<dyn ChatGateway>,
    /// Shortcut emoji attached to every new status message, in catalog
    /// order.
    buttons: Vec<String>,
    state: tokio::sync::Mutex<Option<StatusMessageRef>>,
}

impl StatusView {
    pub fn new(gateway: Arc<dyn ChatGateway>, buttons: Vec<String>) -> Self {
        Self {
            gateway,
            buttons,
            state: tokio::sync::Mutex::new(None),
        }
    }

    /// Reconciles the embed onto the chat surface:
    ///
    /// - no message yet: create one in `channel` and attach the buttons;
    /// - message exists, right channel, within the 1-message lookback:
    ///   edit in place;
    /// - message exists elsewhere or has scrolled away: delete it (best
    ///   effort, one retry) and create a replacement.
    pub async fn render(&self, channel: &ChannelId, embed: &Embed) -> Result<(), JukebotError> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.clone() {
            let same_channel = existing.channel == *channel;
            let usable = same_channel && self.within_lookback(&existing).await;
            if usable {
                return self
                    .gateway
                    .edit_embed(&existing.channel, &existing.message, embed)
                    .await;
            }
            self.delete_with_retry(&mut state).await;
        }

        let message = self.gateway.send_embed(channel, embed).await?;
        *state = Some(StatusMessageRef {
            channel: channel.clone(),
            message: message.clone(),
        });
        for emoji in &self.buttons {
            if let Err(e) = self.gateway.add_reaction(channel, &message, emoji).await {
                warn!(error = %e, emoji, "failed to attach button to status message");
            }
        }
        debug!(channel = %channel, message = %message, "status message created");
        Ok(())
    }

    /// Deletes the status message and forgets the reference. Safe to
    /// call when no message exists.
    pub async fn clear(&self) -> Result<(), JukebotError> {
        let mut state = self.state.lock().await;
        self.delete_with_retry(&mut state).await;
        Ok(())
    }

    /// The current message reference, if a status message is live.
    pub async fn message_ref(&self) -> Option<StatusMessageRef> {
        self.state.lock().await.clone()
    }

    /// True when no newer message has pushed the status message out of
    /// the lookback window. A failed lookup counts as scrolled so the
    /// message gets recreated rather than silently lost.
    async fn within_lookback(&self, existing: &StatusMessageRef) -> bool {
        match self
            .gateway
            .messages_after(&existing.channel, &existing.message, 1)
            .await
        {
            Ok(newer) => newer.is_empty(),
            Err(_) => false,
        }
    }

    async fn delete_with_retry(&self, state: &mut Option<StatusMessageRef>) {
        let Some(existing) = state.take() else {
            return;
        };
        if let Err(first) = self
            .gateway
            .delete_message(&existing.channel, &existing.message)
            .await
        {
            if let Err(second) = self
                .gateway
                .delete_message(&existing.channel, &existing.message)
                .await
            {
                warn!(error = %second, first_error = %first, "failed to delete status message");
            }
        }
    }
}
