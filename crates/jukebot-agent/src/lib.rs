// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant control plane: per-tenant actors that serialize chat-driven
//! mutation, the command catalog, the playback glue, and the event
//! router that fans gateway events out to actors.

pub mod actor;
pub mod catalog;
pub mod fields;
pub mod playback;
pub mod router;
pub mod shutdown;

pub use actor::{TenantActor, TenantContext, TenantEvent};
pub use catalog::{Catalog, Command, CommandAction};
pub use fields::{config_fields, field_by_name, find_fields, ConfigField};
pub use playback::TenantPlayer;
pub use router::{detect_music_channel, EventRouter};
pub use shutdown::shutdown_token;
