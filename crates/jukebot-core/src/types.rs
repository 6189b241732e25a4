// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the jukebot workspace.

use serde::{Deserialize, Serialize};

/// The default command prefix recognized in every tenant.
pub const DEFAULT_COMMAND_PREFIX: &str = "#!";

/// Unique identifier for a tenant (one chat guild).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// Unique identifier for a chat or voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

/// Unique identifier for a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Unique identifier for a chat user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    /// The chat-surface mention forms for this user.
    pub fn mentions(&self) -> [String; 2] {
        [format!("<@{}>", self.0), format!("<@!{}>", self.0)]
    }
}

/// Persisted per-tenant configuration record.
///
/// Stored as JSON under the tenant id; unknown fields in stored records
/// are ignored so older and newer processes can share a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Command prefix recognized in this tenant, in addition to the
    /// global default.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Channels where channel-restricted commands are allowed.
    /// Order irrelevant, duplicates forbidden.
    #[serde(default, rename = "listen")]
    pub listen_channels: Vec<ChannelId>,

    /// Voice channel used for playback.
    #[serde(default, rename = "play")]
    pub music_channel: Option<ChannelId>,

    /// Loudness normalization target. Values in `[-70, -5]` enable the
    /// loudnorm filter with that integrated target; anything else
    /// (including the default 0) leaves streams unchanged.
    #[serde(default)]
    pub loudness: f64,
}

fn default_prefix() -> String {
    DEFAULT_COMMAND_PREFIX.to_string()
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            listen_channels: Vec::new(),
            music_channel: None,
            loudness: 0.0,
        }
    }
}

impl TenantConfig {
    /// The active loudness target, or `None` when normalization is off.
    pub fn loudness_target(&self) -> Option<f64> {
        if (-70.0..=-5.0).contains(&self.loudness) {
            Some(self.loudness)
        } else {
            None
        }
    }

    /// Adds a channel to the listen set. No-op if already present.
    pub fn add_listen_channel(&mut self, channel: ChannelId) {
        if !self.listen_channels.contains(&channel) {
            self.listen_channels.push(channel);
        }
    }

    /// Removes a channel from the listen set. No-op if absent.
    pub fn remove_listen_channel(&mut self, channel: &ChannelId) {
        self.listen_channels.retain(|c| c != channel);
    }

    /// True when the channel is in the listen set.
    pub fn listens_on(&self, channel: &ChannelId) -> bool {
        self.listen_channels.contains(channel)
    }
}

/// A field within an embed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// A chat-surface embed, kept gateway-agnostic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

/// A reaction on a chat message, summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionSummary {
    pub emoji: String,
    /// True when the bot's own identity placed this reaction.
    pub me: bool,
}

/// A chat message as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: UserId,
    pub author_is_bot: bool,
    pub content: String,
    pub mentions: Vec<UserId>,
    pub reactions: Vec<ReactionSummary>,
}

/// A voice channel within a guild snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceChannelInfo {
    pub id: ChannelId,
    pub name: String,
}

/// Guild state delivered with `GuildAvailable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: TenantId,
    pub name: String,
    pub owner: UserId,
    pub afk_channel: Option<ChannelId>,
    pub voice_channels: Vec<VoiceChannelInfo>,
}

/// Events produced by the chat gateway.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The gateway session is established.
    Ready { user: UserId },
    /// A guild became available (connect, reconnect, or invite).
    GuildAvailable { guild: GuildInfo },
    /// A message was created. `tenant` is `None` for direct messages.
    MessageCreate {
        tenant: Option<TenantId>,
        message: ChatMessage,
    },
    /// A reaction was added to a message.
    ReactionAdd {
        tenant: Option<TenantId>,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: String,
    },
    /// A reaction was removed from a message.
    ReactionRemove {
        tenant: Option<TenantId>,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_config_defaults() {
        let config = TenantConfig::default();
        assert_eq!(config.prefix, "#!");
        assert!(config.listen_channels.is_empty());
        assert!(config.music_channel.is_none());
        assert_eq!(config.loudness, 0.0);
        assert!(config.loudness_target().is_none());
    }

    #[test]
    fn loudness_boundaries_are_inclusive() {
        let mut config = TenantConfig::default();

        config.loudness = -70.0;
        assert_eq!(config.loudness_target(), Some(-70.0));
        config.loudness = -5.0;
        assert_eq!(config.loudness_target(), Some(-5.0));

        config.loudness = -70.0001;
        assert!(config.loudness_target().is_none());
        config.loudness = -4.9999;
        assert!(config.loudness_target().is_none());
        config.loudness = 0.0;
        assert!(config.loudness_target().is_none());
    }

    #[test]
    fn config_json_round_trip_is_identity() {
        let config = TenantConfig {
            prefix: "!!".into(),
            listen_channels: vec![ChannelId("c1".into()), ChannelId("c2".into())],
            music_channel: Some(ChannelId("v1".into())),
            loudness: -18.5,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: TenantConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn config_json_uses_wire_field_names() {
        let config = TenantConfig {
            prefix: "#!".into(),
            listen_channels: vec![ChannelId("c1".into())],
            music_channel: Some(ChannelId("v1".into())),
            loudness: -20.0,
        };
        let value: serde_json::Value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["prefix"], "#!");
        assert_eq!(value["listen"][0], "c1");
        assert_eq!(value["play"], "v1");
        assert_eq!(value["loudness"], -20.0);
    }

    #[test]
    fn config_json_ignores_unknown_fields() {
        let json = r#"{"prefix":"$","listen":[],"play":null,"loudness":0,"extra":"ignored"}"#;
        let config: TenantConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.prefix, "$");
    }

    #[test]
    fn config_json_missing_fields_take_defaults() {
        let config: TenantConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, TenantConfig::default());
    }

    #[test]
    fn listen_channels_stay_duplicate_free() {
        let mut config = TenantConfig::default();
        config.add_listen_channel(ChannelId("c1".into()));
        config.add_listen_channel(ChannelId("c1".into()));
        assert_eq!(config.listen_channels.len(), 1);

        config.remove_listen_channel(&ChannelId("c1".into()));
        assert!(config.listen_channels.is_empty());
        config.remove_listen_channel(&ChannelId("c1".into()));
    }

    #[test]
    fn user_mention_forms() {
        let user = UserId("42".into());
        assert_eq!(user.mentions(), ["<@42>".to_string(), "<@!42>".to_string()]);
    }
}
