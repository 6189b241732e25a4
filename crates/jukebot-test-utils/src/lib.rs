// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the jukebot workspace: an injectable chat gateway
//! (with voice device), a scripted media provider, an in-memory config
//! store, and a scripted transcoder.

pub mod mock_gateway;
pub mod mock_provider;
pub mod mock_store;
pub mod mock_transcoder;

pub use mock_gateway::MockGateway;
pub use mock_provider::{silent_track, MockProvider, SilenceOpener};
pub use mock_store::MockStore;
pub use mock_transcoder::MockTranscoder;
