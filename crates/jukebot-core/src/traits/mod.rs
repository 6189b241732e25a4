// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the external collaborators the core consumes.

pub mod gateway;
pub mod provider;
pub mod store;
pub mod voice;

pub use gateway::ChatGateway;
pub use provider::{
    match_provider, MediaOpener, MediaProvider, MediaSource, MediaStream, TrackMetadata,
};
pub use store::ConfigStore;
pub use voice::{VoiceDevice, VoiceSink};
