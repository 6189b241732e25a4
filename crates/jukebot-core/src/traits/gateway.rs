// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat gateway trait: the operations the core consumes from the chat
//! surface. Adapter crates implement this against a concrete platform;
//! the in-tree mock implements it for tests.

use async_trait::async_trait;

use crate::error::JukebotError;
use crate::types::{
    ChannelId, ChatMessage, Embed, GatewayEvent, GuildInfo, MessageId, TenantId, UserId,
};

/// Bidirectional chat gateway session, shared process-wide.
///
/// Event delivery must never be blocked by consumers: `next_event` hands
/// each event to exactly one caller, and the router fans them out to
/// per-tenant inboxes without waiting on tenant work.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// The bot's own user identity.
    fn bot_user(&self) -> UserId;

    /// Receives the next gateway event. Resolves with `Closed` once the
    /// session has been shut down and the event buffer is drained.
    async fn next_event(&self) -> Result<GatewayEvent, JukebotError>;

    /// Sends a plain-text message.
    async fn send_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> Result<MessageId, JukebotError>;

    /// Sends an embed message.
    async fn send_embed(&self, channel: &ChannelId, embed: &Embed)
        -> Result<MessageId, JukebotError>;

    /// Replaces the embed of an existing message.
    async fn edit_embed(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        embed: &Embed,
    ) -> Result<(), JukebotError>;

    /// Deletes a message.
    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), JukebotError>;

    /// Adds a reaction under the bot's identity.
    async fn add_reaction(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        emoji: &str,
    ) -> Result<(), JukebotError>;

    /// Removes one of the bot's own reactions.
    async fn remove_reaction(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        emoji: &str,
    ) -> Result<(), JukebotError>;

    /// Lists up to `limit` message ids posted after `message` in the
    /// channel. Used for the status view's lookback test.
    async fn messages_after(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        limit: usize,
    ) -> Result<Vec<MessageId>, JukebotError>;

    /// Fetches a full message, falling back to the wire when the local
    /// state cache has scrolled past it.
    async fn fetch_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<ChatMessage, JukebotError>;

    /// Opens (or reuses) a direct-message channel with a user.
    async fn create_dm(&self, user: &UserId) -> Result<ChannelId, JukebotError>;

    /// Returns the current guild snapshot for a tenant.
    async fn guild(&self, tenant: &TenantId) -> Result<GuildInfo, JukebotError>;

    /// The voice channel a user currently occupies, if any.
    async fn user_voice_channel(
        &self,
        tenant: &TenantId,
        user: &UserId,
    ) -> Result<Option<ChannelId>, JukebotError>;

    /// Whether the user is a bot account (including this bot).
    async fn is_bot_user(&self, tenant: &TenantId, user: &UserId) -> Result<bool, JukebotError>;

    /// Updates the bot's presence line.
    async fn update_presence(&self, activity: &str) -> Result<(), JukebotError>;

    /// Closes the gateway session.
    async fn close(&self) -> Result<(), JukebotError>;
}
