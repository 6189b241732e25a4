// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event router: fans gateway events out to tenant actors without
//! blocking event delivery.
//!
//! The only shared mutable state is the tenant map behind one RwLock;
//! everything with real invariants lives inside the actors.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use jukebot_core::{
    ChatGateway, ChatMessage, ConfigStore, GatewayEvent, GuildInfo, JukebotError,
    MediaProvider, TenantId, VoiceDevice, ChannelId, DEFAULT_COMMAND_PREFIX,
};
use jukebot_engine::{EngineConfig, Transcoder};
use regex::Regex;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::actor::{TenantActor, TenantContext, TenantEvent};
use crate::catalog::Catalog;

fn music_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bmusic\b").expect("static regex"))
}

/// The first voice channel whose name contains the whole word "music"
/// (case-insensitive), falling back to the AFK channel.
pub fn detect_music_channel(guild: &GuildInfo) -> Option<ChannelId> {
    guild
        .voice_channels
        .iter()
        .find(|vc| music_regex().is_match(&vc.name.to_lowercase()))
        .map(|vc| vc.id.clone())
        .or_else(|| guild.afk_channel.clone())
}

/// Routes gateway events to per-tenant actors and owns their lifecycle.
pub struct EventRouter {
    gateway: Arc<dyn ChatGateway>,
    device: Arc<dyn VoiceDevice>,
    transcoder: Arc<dyn Transcoder>,
    store: Arc<dyn ConfigStore>,
    catalog: Arc<Catalog>,
    providers: Arc<Vec<Arc<dyn MediaProvider>>>,
    engine_config: EngineConfig,
    actors: RwLock<HashMap<TenantId, TenantActor>>,
}

impl EventRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gateway: Arc<dyn ChatGateway>,
        device: Arc<dyn VoiceDevice>,
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn ConfigStore>,
        catalog: Arc<Catalog>,
        providers: Arc<Vec<Arc<dyn MediaProvider>>>,
        engine_config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            device,
            transcoder,
            store,
            catalog,
            providers,
            engine_config,
            actors: RwLock::new(HashMap::new()),
        }
    }

    /// Pumps gateway events until cancellation, then shuts everything
    /// down: all actors concurrently, then the gateway, then the store.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), JukebotError> {
        info!("event router running");
        loop {
            tokio::select! {
                event = self.gateway.next_event() => match event {
                    Ok(event) => self.handle_event(event).await,
                    Err(JukebotError::Closed) => {
                        info!("gateway closed, stopping router");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "gateway event error");
                    }
                },
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping router");
                    break;
                }
            }
        }
        self.shutdown().await;
        Ok(())
    }

    /// Number of registered tenants.
    pub async fn tenant_count(&self) -> usize {
        self.actors.read().await.len()
    }

    async fn handle_event(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready { user } => {
                debug!(user = %user, "gateway ready");
                let presence = format!(
                    "{DEFAULT_COMMAND_PREFIX} <url or search> | {DEFAULT_COMMAND_PREFIX} skip | {DEFAULT_COMMAND_PREFIX} pause"
                );
                if let Err(e) = self.gateway.update_presence(&presence).await {
                    debug!(error = %e, "presence update failed");
                }
            }
            GatewayEvent::GuildAvailable { guild } => self.register_guild(guild).await,
            GatewayEvent::MessageCreate { tenant, message } => match tenant {
                Some(tenant) => {
                    self.dispatch(tenant, TenantEvent::Message(message)).await;
                }
                None => self.handle_direct_message(message).await,
            },
            GatewayEvent::ReactionAdd {
                tenant,
                channel,
                message,
                user,
                emoji,
            }
            | GatewayEvent::ReactionRemove {
                tenant,
                channel,
                message,
                user,
                emoji,
            } => {
                if let Some(tenant) = tenant {
                    self.dispatch(
                        tenant,
                        TenantEvent::Reaction {
                            channel,
                            message,
                            user,
                            emoji,
                        },
                    )
                    .await;
                }
            }
        }
    }

    /// Registers (or replaces) the actor for a guild. A guild can
    /// reappear after a disconnect or re-invite; the stale actor is
    /// closed first.
    async fn register_guild(&self, guild: GuildInfo) {
        let tenant = guild.id.clone();
        let previous = self.actors.write().await.remove(&tenant);
        if let Some(previous) = previous {
            debug!(tenant = %tenant, "closing stale actor");
            if let Err(e) = previous.close().await {
                debug!(tenant = %tenant, error = %e, "stale actor close");
            }
        }

        let context = TenantContext {
            tenant: tenant.clone(),
            guild,
            gateway: self.gateway.clone(),
            device: self.device.clone(),
            transcoder: self.transcoder.clone(),
            store: self.store.clone(),
            catalog: self.catalog.clone(),
            providers: self.providers.clone(),
            engine_config: self.engine_config.clone(),
        };
        match TenantActor::spawn(context).await {
            Ok(actor) => {
                self.actors.write().await.insert(tenant, actor);
            }
            Err(e) => error!(tenant = %tenant, error = %e, "failed to start tenant actor"),
        }
    }

    /// Hands an event to its actor off the router task, so a slow or
    /// backed-up tenant cannot delay event delivery to the others.
    async fn dispatch(&self, tenant: TenantId, event: TenantEvent) {
        let actor = match self.actors.read().await.get(&tenant) {
            Some(actor) => actor.clone(),
            None => {
                debug!(tenant = %tenant, "event for unknown tenant dropped");
                return;
            }
        };
        tokio::spawn(async move {
            if let Err(e) = actor.send(event).await {
                warn!(tenant = %tenant, error = %e, "event dropped");
            }
        });
    }

    /// Direct messages run only the help command; no actor exists for
    /// them. The global prefix is optional.
    async fn handle_direct_message(&self, message: ChatMessage) {
        if message.author_is_bot {
            return;
        }
        let body = message
            .content
            .trim()
            .strip_prefix(DEFAULT_COMMAND_PREFIX)
            .unwrap_or(message.content.trim())
            .trim();
        let mut tokens = body.split_whitespace();
        let command = tokens.next().unwrap_or("help");
        let Some(matched) = self.catalog.match_command(command) else {
            return;
        };
        if matched.name != "help" {
            return;
        }
        let embed = match tokens.next().and_then(|a| self.catalog.match_command(a)) {
            Some(about) => self.catalog.help_embed(about),
            None => self.catalog.help_list_embed(),
        };
        if let Err(e) = self.gateway.send_embed(&message.channel, &embed).await {
            debug!(error = %e, "failed to send help to direct message");
        }
    }

    async fn shutdown(&self) {
        let actors: Vec<(TenantId, TenantActor)> =
            self.actors.write().await.drain().collect();
        info!(tenants = actors.len(), "closing tenant actors");
        let closes = actors.into_iter().map(|(tenant, actor)| async move {
            if let Err(e) = actor.close().await {
                debug!(tenant = %tenant, error = %e, "actor close");
            }
        });
        futures::future::join_all(closes).await;

        if let Err(e) = self.gateway.close().await {
            warn!(error = %e, "gateway close failed");
        }
        if let Err(e) = self.store.close().await {
            warn!(error = %e, "store close failed");
        }
        info!("router shutdown complete");
    }
}
