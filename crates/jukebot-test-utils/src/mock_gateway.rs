// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat gateway for deterministic testing.
//!
//! Implements both [`ChatGateway`] and [`VoiceDevice`]: events are
//! injected, every outbound operation is captured for assertion, and
//! per-channel message timelines back the lookback and fetch lookups.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use jukebot_core::{
    ChannelId, ChatGateway, ChatMessage, Embed, GatewayEvent, GuildInfo, JukebotError,
    MessageId, TenantId, UserId, VoiceDevice, VoiceSink,
};

#[derive(Default)]
struct Inner {
    events: VecDeque<GatewayEvent>,
    closed: bool,

    sent_messages: Vec<(ChannelId, String, MessageId)>,
    sent_embeds: Vec<(ChannelId, Embed, MessageId)>,
    edited_embeds: Vec<(ChannelId, MessageId, Embed)>,
    deleted_messages: Vec<(ChannelId, MessageId)>,
    added_reactions: Vec<(ChannelId, MessageId, String)>,
    removed_reactions: Vec<(ChannelId, MessageId, String)>,
    presence: Vec<String>,
    dm_channels: Vec<UserId>,
    voice_joins: Vec<ChannelId>,

    /// Per-channel timelines of message ids, oldest first.
    timelines: HashMap<ChannelId, Vec<MessageId>>,
    /// Full messages by (channel, id) for fetch lookups.
    messages: HashMap<(ChannelId, MessageId), ChatMessage>,

    guilds: HashMap<TenantId, GuildInfo>,
    user_voice: HashMap<(TenantId, UserId), ChannelId>,
    bot_users: HashSet<UserId>,
    valid_voice_channels: HashSet<ChannelId>,
    fail_voice_open: bool,
    fail_deletes: u32,
}

/// A mock chat gateway.
///
/// Outbound operations append to capture logs; inbound events come from
/// [`inject_event`](MockGateway::inject_event). Message ids are
/// generated sequentially so tests can reason about ordering.
pub struct MockGateway {
    inner: Mutex<Inner>,
    notify: Notify,
    bot: UserId,
    next_id: AtomicU64,
    frames_written: Arc<AtomicUsize>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
            bot: UserId("bot".into()),
            next_id: AtomicU64::new(1),
            frames_written: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn make_id(&self) -> MessageId {
        MessageId(format!("m{}", self.next_id.fetch_add(1, Ordering::Relaxed)))
    }

    // --- test setup -------------------------------------------------

    /// Queues an event for delivery through `next_event`.
    pub async fn inject_event(&self, event: GatewayEvent) {
        self.inner.lock().await.events.push_back(event);
        self.notify.notify_one();
    }

    /// Registers a guild snapshot returned by `guild()`.
    pub async fn set_guild(&self, guild: GuildInfo) {
        let mut inner = self.inner.lock().await;
        for vc in &guild.voice_channels {
            inner.valid_voice_channels.insert(vc.id.clone());
        }
        inner.guilds.insert(guild.id.clone(), guild);
    }

    /// Marks a channel id as a valid voice channel.
    pub async fn add_voice_channel(&self, channel: ChannelId) {
        self.inner
            .lock()
            .await
            .valid_voice_channels
            .insert(channel);
    }

    /// Puts a user in a voice channel for `user_voice_channel` lookups.
    pub async fn set_user_voice(&self, tenant: TenantId, user: UserId, channel: ChannelId) {
        self.inner
            .lock()
            .await
            .user_voice
            .insert((tenant, user), channel);
    }

    /// Marks a user id as a bot account.
    pub async fn add_bot_user(&self, user: UserId) {
        self.inner.lock().await.bot_users.insert(user);
    }

    /// Makes `open()` fail until cleared.
    pub async fn set_fail_voice_open(&self, fail: bool) {
        self.inner.lock().await.fail_voice_open = fail;
    }

    /// Makes the next `count` delete calls fail.
    pub async fn fail_next_deletes(&self, count: u32) {
        self.inner.lock().await.fail_deletes = count;
    }

    /// Appends a user-authored message to a channel timeline (e.g. to
    /// push the status message out of the lookback window).
    pub async fn push_channel_message(&self, channel: &ChannelId, content: &str) -> ChatMessage {
        let message = ChatMessage {
            id: self.make_id(),
            channel: channel.clone(),
            author: UserId("someone".into()),
            author_is_bot: false,
            content: content.to_string(),
            mentions: Vec::new(),
            reactions: Vec::new(),
        };
        self.insert_message(message.clone()).await;
        message
    }

    /// Inserts a full message into the timeline and fetch store.
    pub async fn insert_message(&self, message: ChatMessage) {
        let mut inner = self.inner.lock().await;
        inner
            .timelines
            .entry(message.channel.clone())
            .or_default()
            .push(message.id.clone());
        inner
            .messages
            .insert((message.channel.clone(), message.id.clone()), message);
    }

    // --- capture accessors ------------------------------------------

    pub async fn sent_messages(&self) -> Vec<(ChannelId, String)> {
        self.inner
            .lock()
            .await
            .sent_messages
            .iter()
            .map(|(c, t, _)| (c.clone(), t.clone()))
            .collect()
    }

    pub async fn sent_embeds(&self) -> Vec<(ChannelId, Embed)> {
        self.inner
            .lock()
            .await
            .sent_embeds
            .iter()
            .map(|(c, e, _)| (c.clone(), e.clone()))
            .collect()
    }

    pub async fn edited_embeds(&self) -> Vec<(ChannelId, MessageId, Embed)> {
        self.inner.lock().await.edited_embeds.clone()
    }

    pub async fn deleted_messages(&self) -> Vec<(ChannelId, MessageId)> {
        self.inner.lock().await.deleted_messages.clone()
    }

    pub async fn added_reactions(&self) -> Vec<(ChannelId, MessageId, String)> {
        self.inner.lock().await.added_reactions.clone()
    }

    pub async fn presence_updates(&self) -> Vec<String> {
        self.inner.lock().await.presence.clone()
    }

    pub async fn voice_joins(&self) -> Vec<ChannelId> {
        self.inner.lock().await.voice_joins.clone()
    }

    pub async fn dm_channels_opened(&self) -> Vec<UserId> {
        self.inner.lock().await.dm_channels.clone()
    }

    /// Total opus frames written through any sink this gateway opened.
    pub fn frames_written(&self) -> usize {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// The id of the most recently sent embed, if any.
    pub async fn last_embed_id(&self) -> Option<MessageId> {
        self.inner
            .lock()
            .await
            .sent_embeds
            .last()
            .map(|(_, _, id)| id.clone())
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }
}

#[async_trait]
impl ChatGateway for MockGateway {
    fn bot_user(&self) -> UserId {
        self.bot.clone()
    }

    async fn next_event(&self) -> Result<GatewayEvent, JukebotError> {
        loop {
            {
                let mut inner = self.inner.lock().await;
                if let Some(event) = inner.events.pop_front() {
                    return Ok(event);
                }
                if inner.closed {
                    return Err(JukebotError::Closed);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn send_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> Result<MessageId, JukebotError> {
        let id = self.make_id();
        let mut inner = self.inner.lock().await;
        inner
            .timelines
            .entry(channel.clone())
            .or_default()
            .push(id.clone());
        inner
            .sent_messages
            .push((channel.clone(), text.to_string(), id.clone()));
        Ok(id)
    }

    async fn send_embed(
        &self,
        channel: &ChannelId,
        embed: &Embed,
    ) -> Result<MessageId, JukebotError> {
        let id = self.make_id();
        let mut inner = self.inner.lock().await;
        inner
            .timelines
            .entry(channel.clone())
            .or_default()
            .push(id.clone());
        inner
            .sent_embeds
            .push((channel.clone(), embed.clone(), id.clone()));
        Ok(id)
    }

    async fn edit_embed(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        embed: &Embed,
    ) -> Result<(), JukebotError> {
        self.inner
            .lock()
            .await
            .edited_embeds
            .push((channel.clone(), message.clone(), embed.clone()));
        Ok(())
    }

    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), JukebotError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_deletes > 0 {
            inner.fail_deletes -= 1;
            return Err(JukebotError::gateway("delete failed (injected)"));
        }
        if let Some(timeline) = inner.timelines.get_mut(channel) {
            timeline.retain(|id| id != message);
        }
        inner.messages.remove(&(channel.clone(), message.clone()));
        inner
            .deleted_messages
            .push((channel.clone(), message.clone()));
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        emoji: &str,
    ) -> Result<(), JukebotError> {
        let mut inner = self.inner.lock().await;
        // Keep the fetch store consistent so requeue checks see the
        // bot's own reactions.
        if let Some(stored) = inner.messages.get_mut(&(channel.clone(), message.clone())) {
            stored.reactions.push(jukebot_core::ReactionSummary {
                emoji: emoji.to_string(),
                me: true,
            });
        }
        inner
            .added_reactions
            .push((channel.clone(), message.clone(), emoji.to_string()));
        Ok(())
    }

    async fn remove_reaction(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        emoji: &str,
    ) -> Result<(), JukebotError> {
        self.inner
            .lock()
            .await
            .removed_reactions
            .push((channel.clone(), message.clone(), emoji.to_string()));
        Ok(())
    }

    async fn messages_after(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        limit: usize,
    ) -> Result<Vec<MessageId>, JukebotError> {
        let inner = self.inner.lock().await;
        let Some(timeline) = inner.timelines.get(channel) else {
            return Ok(Vec::new());
        };
        let newer = match timeline.iter().position(|id| id == message) {
            Some(pos) => timeline[pos + 1..].iter().take(limit).cloned().collect(),
            None => Vec::new(),
        };
        Ok(newer)
    }

    async fn fetch_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<ChatMessage, JukebotError> {
        self.inner
            .lock()
            .await
            .messages
            .get(&(channel.clone(), message.clone()))
            .cloned()
            .ok_or_else(|| JukebotError::gateway("message not found"))
    }

    async fn create_dm(&self, user: &UserId) -> Result<ChannelId, JukebotError> {
        self.inner.lock().await.dm_channels.push(user.clone());
        Ok(ChannelId(format!("dm:{user}")))
    }

    async fn guild(&self, tenant: &TenantId) -> Result<GuildInfo, JukebotError> {
        self.inner
            .lock()
            .await
            .guilds
            .get(tenant)
            .cloned()
            .ok_or_else(|| JukebotError::gateway("unknown guild"))
    }

    async fn user_voice_channel(
        &self,
        tenant: &TenantId,
        user: &UserId,
    ) -> Result<Option<ChannelId>, JukebotError> {
        Ok(self
            .inner
            .lock()
            .await
            .user_voice
            .get(&(tenant.clone(), user.clone()))
            .cloned())
    }

    async fn is_bot_user(&self, _tenant: &TenantId, user: &UserId) -> Result<bool, JukebotError> {
        if *user == self.bot {
            return Ok(true);
        }
        Ok(self.inner.lock().await.bot_users.contains(user))
    }

    async fn update_presence(&self, activity: &str) -> Result<(), JukebotError> {
        self.inner.lock().await.presence.push(activity.to_string());
        Ok(())
    }

    async fn close(&self) -> Result<(), JukebotError> {
        self.inner.lock().await.closed = true;
        self.notify.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl VoiceDevice for MockGateway {
    async fn is_voice_channel(&self, channel: &ChannelId) -> bool {
        self.inner
            .lock()
            .await
            .valid_voice_channels
            .contains(channel)
    }

    async fn open(&self, channel: &ChannelId) -> Result<Box<dyn VoiceSink>, JukebotError> {
        let mut inner = self.inner.lock().await;
        if !inner.valid_voice_channels.contains(channel) {
            return Err(JukebotError::InvalidVoiceChannel);
        }
        if inner.fail_voice_open {
            return Err(JukebotError::gateway("voice backend down (injected)"));
        }
        inner.voice_joins.push(channel.clone());
        Ok(Box::new(MockVoiceSink {
            frames: self.frames_written.clone(),
        }))
    }
}

struct MockVoiceSink {
    frames: Arc<AtomicUsize>,
}

#[async_trait]
impl VoiceSink for MockVoiceSink {
    async fn write_frame(&mut self, _frame: &[u8]) -> Result<(), JukebotError> {
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), JukebotError> {
        Ok(())
    }
}
