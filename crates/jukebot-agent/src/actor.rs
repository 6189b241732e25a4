// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tenant actor: a single-writer task that serializes every
//! chat-driven mutation for one tenant.
//!
//! All tenant state (config, status view, playback engine handle) is
//! owned by the worker; the rest of the process talks to it through a
//! bounded inbox with a 1 s admission timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jukebot_core::{
    match_provider, ChannelId, ChatGateway, ChatMessage, ConfigStore, GuildInfo, JukebotError,
    MediaProvider, MessageId, TenantConfig, TenantId, UserId, VoiceDevice,
    DEFAULT_COMMAND_PREFIX,
};
use jukebot_engine::{EngineConfig, Transcoder};
use jukebot_status::StatusView;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CommandAction};
use crate::fields::{field_by_name, find_fields};
use crate::playback::TenantPlayer;
use crate::router::detect_music_channel;

/// Inbox depth. Events beyond this back up into `send` and hit its
/// timeout.
const INBOX_CAPACITY: usize = 16;

/// How long `send` waits for inbox space before reporting `Timeout`.
const SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Instructions for a tenant actor.
#[derive(Debug, Clone)]
pub enum TenantEvent {
    /// A chat message in one of the tenant's channels.
    Message(ChatMessage),
    /// A reaction added to or removed from a message.
    Reaction {
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: String,
    },
}

/// Everything needed to build a tenant actor.
pub struct TenantContext {
    pub tenant: TenantId,
    pub guild: GuildInfo,
    pub gateway: Arc<dyn ChatGateway>,
    pub device: Arc<dyn VoiceDevice>,
    pub transcoder: Arc<dyn Transcoder>,
    pub store: Arc<dyn ConfigStore>,
    pub catalog: Arc<Catalog>,
    pub providers: Arc<Vec<Arc<dyn MediaProvider>>>,
    pub engine_config: EngineConfig,
}

/// Handle to a tenant actor. Cheap to clone; all clones share the
/// closed flag.
#[derive(Clone)]
pub struct TenantActor {
    tx: mpsc::Sender<TenantEvent>,
    closed: Arc<AtomicBool>,
    closing: CancellationToken,
    worker: Arc<tokio::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl TenantActor {
    /// Loads (or initializes) the tenant's config and spawns the worker.
    pub async fn spawn(ctx: TenantContext) -> Result<Self, JukebotError> {
        let config = match ctx.store.get(&ctx.tenant).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                let mut config = TenantConfig::default();
                config.music_channel = detect_music_channel(&ctx.guild);
                if let Err(e) = ctx.store.put(&ctx.tenant, &config).await {
                    warn!(tenant = %ctx.tenant, error = %e, "failed to persist initial config");
                }
                config
            }
            Err(e) => {
                warn!(tenant = %ctx.tenant, error = %e, "config lookup failed, using defaults");
                let mut config = TenantConfig::default();
                config.music_channel = detect_music_channel(&ctx.guild);
                config
            }
        };

        let view = Arc::new(StatusView::new(
            ctx.gateway.clone(),
            ctx.catalog.shortcuts(),
        ));
        let player = TenantPlayer::new(
            ctx.device.clone(),
            ctx.transcoder.clone(),
            view.clone(),
            config.music_channel.clone(),
            ctx.engine_config.clone(),
        );

        let worker = TenantWorker {
            tenant: ctx.tenant.clone(),
            owner: ctx.guild.owner.clone(),
            me: ctx.gateway.bot_user(),
            gateway: ctx.gateway,
            device: ctx.device,
            transcoder: ctx.transcoder,
            store: ctx.store,
            catalog: ctx.catalog,
            providers: ctx.providers,
            engine_config: ctx.engine_config,
            config,
            player,
            view,
        };

        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let closing = CancellationToken::new();
        let handle = tokio::spawn(worker.run(rx, closing.clone()));
        info!(tenant = %ctx.tenant, "tenant actor started");

        Ok(Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
            closing,
            worker: Arc::new(tokio::sync::Mutex::new(Some(handle))),
        })
    }

    /// Delivers an event to the actor. Fails with `Closed` after
    /// `close`, or `Timeout` when the inbox stays full for 1 s.
    pub async fn send(&self, event: TenantEvent) -> Result<(), JukebotError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(JukebotError::Closed);
        }
        self.tx
            .send_timeout(event, SEND_TIMEOUT)
            .await
            .map_err(|e| match e {
                mpsc::error::SendTimeoutError::Timeout(_) => JukebotError::Timeout {
                    duration: SEND_TIMEOUT,
                },
                mpsc::error::SendTimeoutError::Closed(_) => JukebotError::Closed,
            })
    }

    /// Stops the actor: drains pending events, closes the engine
    /// (which deletes the status message), and persists the config.
    /// The first call returns Ok; later calls fail with `Closed`.
    pub async fn close(&self) -> Result<(), JukebotError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(JukebotError::Closed);
        }
        self.closing.cancel();
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Ok(())
    }
}

struct TenantWorker {
    tenant: TenantId,
    owner: UserId,
    me: UserId,
    gateway: Arc<dyn ChatGateway>,
    device: Arc<dyn VoiceDevice>,
    transcoder: Arc<dyn Transcoder>,
    store: Arc<dyn ConfigStore>,
    catalog: Arc<Catalog>,
    providers: Arc<Vec<Arc<dyn MediaProvider>>>,
    engine_config: EngineConfig,
    config: TenantConfig,
    player: TenantPlayer,
    view: Arc<StatusView>,
}

impl TenantWorker {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<TenantEvent>,
        closing: CancellationToken,
    ) {
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                _ = closing.cancelled() => {
                    // Refuse new events, then drain what is buffered.
                    rx.close();
                    while let Some(event) = rx.recv().await {
                        self.handle_event(event).await;
                    }
                    break;
                }
            }
        }

        if let Err(e) = self.player.close().await {
            debug!(tenant = %self.tenant, error = %e, "player close");
        }
        if let Err(e) = self.store.put(&self.tenant, &self.config).await {
            warn!(tenant = %self.tenant, error = %e, "failed to persist config on shutdown");
        }
        info!(tenant = %self.tenant, "tenant actor stopped");
    }

    async fn handle_event(&mut self, event: TenantEvent) {
        match event {
            TenantEvent::Message(message) => self.handle_message(message).await,
            TenantEvent::Reaction {
                channel,
                message,
                user,
                emoji,
            } => self.handle_reaction(channel, message, user, emoji).await,
        }
    }

    /// Prefix check: the tenant prefix, the global default, or a
    /// leading mention of the bot. Returns the stripped argument.
    fn check_message(&self, msg: &ChatMessage) -> Option<String> {
        let content = msg.content.trim();
        if content.is_empty() {
            return None;
        }
        if let Some(rest) = content.strip_prefix(self.config.prefix.as_str()) {
            return Some(rest.trim().to_string());
        }
        if let Some(rest) = content.strip_prefix(DEFAULT_COMMAND_PREFIX) {
            return Some(rest.trim().to_string());
        }
        if msg.mentions.contains(&self.me) {
            for mention in self.me.mentions() {
                if content.starts_with(mention.as_str()) {
                    // Strip every mention of the bot, normalize spacing.
                    let mut arg = content.to_string();
                    for m in self.me.mentions() {
                        arg = arg.replace(&m, "");
                    }
                    return Some(arg.split_whitespace().collect::<Vec<_>>().join(" "));
                }
            }
        }
        None
    }

    fn is_allowed(&self, restrict_channel: bool, owner_only: bool, msg: &ChatMessage) -> bool {
        let channel_ok = !restrict_channel || self.config.listens_on(&msg.channel);
        let author_ok = !owner_only || msg.author == self.owner;
        channel_ok && author_ok
    }

    async fn handle_message(&mut self, msg: ChatMessage) {
        let Some(arg) = self.check_message(&msg) else {
            return;
        };
        let tokens: Vec<String> = arg.split_whitespace().map(str::to_string).collect();
        let Some(first) = tokens.first() else {
            return;
        };

        let catalog = self.catalog.clone();
        if let Some(command) = catalog.match_command(first) {
            if !self.is_allowed(command.restrict_channel, command.owner_only, &msg) {
                debug!(tenant = %self.tenant, command = command.name, "command not allowed");
                return;
            }
            info!(tenant = %self.tenant, command = command.name, "command dispatched");
            let args = &tokens[1..];
            let result = self.run_action(command.action, &msg, args).await;
            self.finish(command.ack, result, &msg).await;
            return;
        }

        // Plugin fallback: validate the synthesized command's ACL
        // before querying providers, since probing can be slow.
        if !self.is_allowed(true, false, &msg) {
            return;
        }
        let providers = self.providers.clone();
        let Some(provider) = match_provider(&providers, &arg).await else {
            return;
        };
        info!(tenant = %self.tenant, provider = provider.name(), "request matched a provider");
        let result = self.enqueue_from(provider.as_ref(), &arg, &msg.channel).await;
        match result {
            Ok(()) => {
                // The ☑ ack, plus the requeue mark that lets a later 🔂
                // reaction replay this message.
                for emoji in ["☑", self.catalog.requeue_shortcut()] {
                    if let Err(e) = self
                        .gateway
                        .add_reaction(&msg.channel, &msg.id, emoji)
                        .await
                    {
                        debug!(error = %e, "ack reaction failed");
                    }
                }
            }
            Err(e) => self.reply_error(&msg.channel, &e).await,
        }
    }

    async fn handle_reaction(
        &mut self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: String,
    ) {
        if user == self.me {
            return;
        }

        // Reactions on the current status message are buttons.
        if let Some(current) = self.view.message_ref().await {
            if current.channel == channel && current.message == message {
                match self.gateway.is_bot_user(&self.tenant, &user).await {
                    Ok(true) | Err(_) => return,
                    Ok(false) => {}
                }
                let catalog = self.catalog.clone();
                if let Some(command) = catalog.by_shortcut(&emoji) {
                    info!(tenant = %self.tenant, command = command.name, "shortcut invoked");
                    let synthetic = ChatMessage {
                        id: message,
                        channel,
                        author: user,
                        author_is_bot: false,
                        content: String::new(),
                        mentions: Vec::new(),
                        reactions: Vec::new(),
                    };
                    // No viable vector for an error reply or ack here.
                    let _ = self.run_action(command.action, &synthetic, &[]).await;
                }
                return;
            }
        }

        // A 🔂 reaction on a message this bot previously marked replays
        // that message.
        if emoji != self.catalog.requeue_shortcut() {
            return;
        }
        let Ok(full) = self.gateway.fetch_message(&channel, &message).await else {
            return;
        };
        if self.requeueable(&full) {
            self.handle_message(full).await;
        }
    }

    /// Requeueable: not authored by a bot, and carrying this bot's own
    /// requeue reaction. False negatives are tolerated.
    fn requeueable(&self, msg: &ChatMessage) -> bool {
        if msg.author_is_bot {
            return false;
        }
        let shortcut = self.catalog.requeue_shortcut();
        msg.reactions.iter().any(|r| r.me && r.emoji == shortcut)
    }

    async fn run_action(
        &mut self,
        action: CommandAction,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), JukebotError> {
        match action {
            CommandAction::Help => self.cmd_help(msg, args).await,
            CommandAction::Playlist => {
                let mut body = String::new();
                for title in self.player.playlist() {
                    body.push_str(&title);
                    body.push('\n');
                }
                self.gateway
                    .send_message(&msg.channel, &format!("```\n{body}```"))
                    .await?;
                Ok(())
            }
            CommandAction::Pause => {
                self.player.pause();
                Ok(())
            }
            CommandAction::Skip => {
                self.player.skip();
                Ok(())
            }
            CommandAction::Clear => {
                self.player.clear().await;
                Ok(())
            }
            CommandAction::Requeue => {
                let now_playing = self
                    .player
                    .now_playing()
                    .ok_or_else(|| JukebotError::CommandUsage("nothing is playing".into()))?;
                self.enqueue_metadata(now_playing.metadata, &msg.channel)
                    .await
            }
            CommandAction::Reconnect => self.cmd_reconnect().await,
            CommandAction::Get => self.cmd_get(msg, args).await,
            CommandAction::Set => self.cmd_set(args).await,
            CommandAction::Playback => self.cmd_playback(msg, args).await,
            CommandAction::Whitelist => {
                self.config.add_listen_channel(msg.channel.clone());
                self.persist().await
            }
            CommandAction::Unwhitelist => {
                self.config.remove_listen_channel(&msg.channel);
                self.persist().await
            }
        }
    }

    async fn cmd_help(&self, msg: &ChatMessage, args: &[String]) -> Result<(), JukebotError> {
        let embed = match args.first().and_then(|a| self.catalog.match_command(a)) {
            Some(command) => self.catalog.help_embed(command),
            None => self.catalog.help_list_embed(),
        };
        let dm = self.gateway.create_dm(&msg.author).await?;
        self.gateway.send_embed(&dm, &embed).await?;
        Ok(())
    }

    async fn cmd_get(&self, msg: &ChatMessage, args: &[String]) -> Result<(), JukebotError> {
        let pattern = args.first().map(String::as_str).unwrap_or(".*");
        let fields = find_fields(pattern)?;
        if fields.is_empty() {
            return Err(JukebotError::CommandUsage(format!(
                "no config field matches {pattern}"
            )));
        }
        let mut body = String::new();
        for field in fields {
            body.push_str(&format!("{}: {}\n", field.name, (field.read)(&self.config)));
        }
        self.gateway
            .send_message(&msg.channel, &format!("```\n{body}```"))
            .await?;
        Ok(())
    }

    async fn cmd_set(&mut self, args: &[String]) -> Result<(), JukebotError> {
        let name = args
            .first()
            .ok_or_else(|| JukebotError::CommandUsage("field please".into()))?;
        let field = field_by_name(name).ok_or_else(|| {
            JukebotError::CommandUsage(format!("unknown config field: {name}"))
        })?;
        let value = args[1..].join(" ");
        (field.write)(&mut self.config, value.trim())?;
        self.persist().await
    }

    async fn cmd_playback(&mut self, msg: &ChatMessage, args: &[String]) -> Result<(), JukebotError> {
        let channel = match args.first().map(String::as_str) {
            Some("detect") => {
                let guild = self.gateway.guild(&self.tenant).await?;
                detect_music_channel(&guild).ok_or_else(|| {
                    JukebotError::CommandUsage("no music channel detected".into())
                })?
            }
            _ => self
                .gateway
                .user_voice_channel(&self.tenant, &msg.author)
                .await?
                .ok_or_else(|| {
                    JukebotError::CommandUsage(
                        "join a voice channel first, or pass \"detect\"".into(),
                    )
                })?,
        };
        self.config.music_channel = Some(channel);
        self.persist().await
    }

    /// Tears the engine down and rebuilds it against the configured
    /// music channel. An unusable channel still rebuilds (so later
    /// commands are not stuck on a disposed engine) but reports the
    /// configuration error.
    async fn cmd_reconnect(&mut self) -> Result<(), JukebotError> {
        if let Err(e) = self.player.close().await {
            debug!(tenant = %self.tenant, error = %e, "player close during reconnect");
        }
        let idle = match &self.config.music_channel {
            Some(channel) if self.device.is_voice_channel(channel).await => Some(channel.clone()),
            _ => None,
        };
        let usable = idle.is_some();
        self.player = TenantPlayer::new(
            self.device.clone(),
            self.transcoder.clone(),
            self.view.clone(),
            idle,
            self.engine_config.clone(),
        );
        if usable {
            Ok(())
        } else {
            Err(JukebotError::InvalidVoiceChannel)
        }
    }

    async fn enqueue_from(
        &self,
        provider: &dyn MediaProvider,
        arg: &str,
        status_channel: &ChannelId,
    ) -> Result<(), JukebotError> {
        let metadata = provider.resolve(arg).await?;
        self.enqueue_metadata(metadata, status_channel).await
    }

    async fn enqueue_metadata(
        &self,
        metadata: Arc<jukebot_core::TrackMetadata>,
        status_channel: &ChannelId,
    ) -> Result<(), JukebotError> {
        let voice_channel = self
            .config
            .music_channel
            .clone()
            .ok_or(JukebotError::InvalidVoiceChannel)?;
        self.player
            .enqueue(
                metadata,
                voice_channel,
                status_channel.clone(),
                self.config.loudness_target(),
            )
            .await
    }

    async fn persist(&self) -> Result<(), JukebotError> {
        self.store.put(&self.tenant, &self.config).await
    }

    async fn finish(
        &self,
        ack: Option<&str>,
        result: Result<(), JukebotError>,
        msg: &ChatMessage,
    ) {
        match result {
            Err(e) => self.reply_error(&msg.channel, &e).await,
            Ok(()) => {
                if let Some(ack) = ack {
                    if let Err(e) = self.gateway.add_reaction(&msg.channel, &msg.id, ack).await {
                        debug!(error = %e, "ack reaction failed");
                    }
                }
            }
        }
    }

    async fn reply_error(&self, channel: &ChannelId, err: &JukebotError) {
        if let Err(e) = self
            .gateway
            .send_message(channel, &format!("🤔 ...\n{err}"))
            .await
        {
            warn!(error = %e, "failed to send error reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use jukebot_core::VoiceChannelInfo;
    use jukebot_test_utils::{MockGateway, MockStore, MockTranscoder};

    use super::*;

    async fn test_worker(prefix: &str) -> TenantWorker {
        let gateway = Arc::new(MockGateway::new());
        let store = Arc::new(MockStore::new());
        let catalog = Arc::new(Catalog::builtin());
        let view = Arc::new(StatusView::new(gateway.clone(), catalog.shortcuts()));
        let transcoder = Arc::new(MockTranscoder {
            frames: 0,
            frame_gap: Duration::ZERO,
        });
        let player = TenantPlayer::new(
            gateway.clone(),
            transcoder.clone(),
            view.clone(),
            None,
            EngineConfig::default(),
        );
        let mut config = TenantConfig::default();
        config.prefix = prefix.to_string();
        TenantWorker {
            tenant: TenantId("guild".into()),
            owner: UserId("owner".into()),
            me: gateway.bot_user(),
            gateway,
            device: Arc::new(MockGateway::new()),
            transcoder,
            store,
            catalog,
            providers: Arc::new(Vec::new()),
            engine_config: EngineConfig::default(),
            config,
            player,
            view,
        }
    }

    fn message(content: &str, mentions: Vec<UserId>) -> ChatMessage {
        ChatMessage {
            id: MessageId("message".into()),
            channel: ChannelId("channel".into()),
            author: UserId("author".into()),
            author_is_bot: false,
            content: content.to_string(),
            mentions,
            reactions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn check_message_prefix_and_mention_table() {
        let worker = test_worker("xx").await;
        let me = worker.me.clone();
        let someone_else = UserId("someoneelse".into());
        let me_mention = format!("<@{me}>");
        let other_mention = format!("<@{someone_else}>");

        struct Case {
            description: &'static str,
            content: String,
            mentions: Vec<UserId>,
            expected: Option<String>,
        }
        let cases = vec![
            Case {
                description: "empty",
                content: String::new(),
                mentions: vec![],
                expected: None,
            },
            Case {
                description: "arbitrary message",
                content: "lorem ipsum dolor sit amet".into(),
                mentions: vec![],
                expected: None,
            },
            Case {
                description: "global prefix",
                content: format!("{DEFAULT_COMMAND_PREFIX} hello world    "),
                mentions: vec![],
                expected: Some("hello world".into()),
            },
            Case {
                description: "guild prefix",
                content: "xx abc 123".into(),
                mentions: vec![],
                expected: Some("abc 123".into()),
            },
            Case {
                description: "mentions bot at the beginning",
                content: format!("{me_mention} hello world"),
                mentions: vec![me.clone()],
                expected: Some("hello world".into()),
            },
            Case {
                description: "mentions bot in the middle",
                content: format!("hello {me_mention} world"),
                mentions: vec![me.clone()],
                expected: None,
            },
            Case {
                description: "mentions bot at the end",
                content: format!("hello world {me_mention}"),
                mentions: vec![me.clone()],
                expected: None,
            },
            Case {
                description: "mentions someone else",
                content: "hello world".into(),
                mentions: vec![someone_else.clone()],
                expected: None,
            },
            Case {
                description: "mentions bot first, then someone else",
                content: format!("{me_mention} hello {other_mention}"),
                mentions: vec![me.clone(), someone_else.clone()],
                expected: Some(format!("hello {other_mention}")),
            },
        ];

        for case in cases {
            let msg = message(&case.content, case.mentions.clone());
            let got = worker.check_message(&msg);
            assert_eq!(got, case.expected, "{}", case.description);
        }
    }

    #[tokio::test]
    async fn acl_checks_channel_and_owner() {
        let mut worker = test_worker("#!").await;
        worker
            .config
            .add_listen_channel(ChannelId("allowed".into()));

        let mut msg = message("#! skip", vec![]);
        msg.channel = ChannelId("allowed".into());
        assert!(worker.is_allowed(true, false, &msg));

        msg.channel = ChannelId("elsewhere".into());
        assert!(!worker.is_allowed(true, false, &msg));
        assert!(worker.is_allowed(false, false, &msg));

        msg.author = UserId("owner".into());
        assert!(worker.is_allowed(false, true, &msg));
        msg.author = UserId("not-owner".into());
        assert!(!worker.is_allowed(false, true, &msg));
    }

    #[tokio::test]
    async fn requeueable_requires_non_bot_author_and_own_mark() {
        let worker = test_worker("#!").await;

        let mut msg = message("#! https://youtu.be/x", vec![]);
        assert!(!worker.requeueable(&msg));

        msg.reactions.push(jukebot_core::ReactionSummary {
            emoji: "🔂".into(),
            me: true,
        });
        assert!(worker.requeueable(&msg));

        msg.author_is_bot = true;
        assert!(!worker.requeueable(&msg));

        msg.author_is_bot = false;
        msg.reactions[0].me = false;
        assert!(!worker.requeueable(&msg));
    }

    #[tokio::test]
    async fn detect_music_channel_prefers_whole_word_match() {
        let guild = GuildInfo {
            id: TenantId("g".into()),
            name: "Guild".into(),
            owner: UserId("owner".into()),
            afk_channel: Some(ChannelId("afk".into())),
            voice_channels: vec![
                VoiceChannelInfo {
                    id: ChannelId("v1".into()),
                    name: "general".into(),
                },
                VoiceChannelInfo {
                    id: ChannelId("v2".into()),
                    name: "Music-Room".into(),
                },
            ],
        };
        assert_eq!(detect_music_channel(&guild), Some(ChannelId("v2".into())));
    }
}
