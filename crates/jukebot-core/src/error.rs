// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the jukebot workspace.

use std::time::Duration;

use thiserror::Error;

/// Classifies provider resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderErrorKind {
    /// Remote endpoint unreachable or request failed in transit.
    Network,
    /// The reference resolved to nothing (no results, 404).
    NotFound,
    /// The media exists but no playable stream is available.
    Unsupported,
    /// Parse failures, subprocess failures, and other provider bugs.
    Internal,
}

/// The primary error type used across all jukebot traits and operations.
#[derive(Debug, Error)]
pub enum JukebotError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat gateway errors (send/edit/delete failures, lookup misses).
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Media provider resolution errors, classified by kind.
    #[error("{kind} error: {message}")]
    Provider {
        kind: ProviderErrorKind,
        message: String,
    },

    /// The playback queue is at capacity; the request was not admitted.
    #[error("the queue is full")]
    QueueFull,

    /// The configured music channel is not a voice channel.
    #[error("set a valid voice channel for music playback, then call reconnect")]
    InvalidVoiceChannel,

    /// The service (engine or actor) has been disposed.
    #[error("service is disposed")]
    Closed,

    /// An enqueue or lookup did not complete within its deadline.
    #[error("service timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// User-input errors: unknown argument, missing value, bad number.
    /// Surfaced as a chat reply, never logged at warn.
    #[error("{0}")]
    CommandUsage(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl JukebotError {
    /// Shorthand for a provider error with the given kind.
    pub fn provider(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self::Provider {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a gateway error with no underlying source.
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway {
            message: message.into(),
            source: None,
        }
    }

    /// True when this error should be shown to the user as a chat reply
    /// rather than logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::CommandUsage(_)
                | Self::Provider { .. }
                | Self::QueueFull
                | Self::InvalidVoiceChannel
        )
    }
}
