// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the jukebot workspace.
//!
//! This crate provides the foundational trait definitions, error types,
//! and common types used throughout the workspace. The chat gateway,
//! voice device, media providers, and config store are all external
//! collaborators described only by the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{JukebotError, ProviderErrorKind};
pub use traits::{
    match_provider, ChatGateway, ConfigStore, MediaOpener, MediaProvider, MediaSource,
    MediaStream, TrackMetadata, VoiceDevice, VoiceSink,
};
pub use types::{
    ChannelId, ChatMessage, Embed, EmbedField, GatewayEvent, GuildInfo, MessageId,
    ReactionSummary, TenantConfig, TenantId, UserId, VoiceChannelInfo, DEFAULT_COMMAND_PREFIX,
};
