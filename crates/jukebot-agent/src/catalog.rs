// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The command catalog: a closed set of commands with aliases, ACL
//! flags, reaction shortcuts, and success acks, plus help rendering.
//!
//! Dispatch is data-driven: each command carries a [`CommandAction`]
//! discriminant the actor matches on. Help receives the catalog as an
//! argument rather than through a global.

use jukebot_core::{Embed, EmbedField};

/// What a command does, matched by the actor's dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Help,
    Playlist,
    Pause,
    Skip,
    Clear,
    Requeue,
    Reconnect,
    Get,
    Set,
    Playback,
    Whitelist,
    Unwhitelist,
}

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub description: &'static str,
    /// Only runs in whitelisted channels.
    pub restrict_channel: bool,
    /// Only runs for the guild owner.
    pub owner_only: bool,
    /// Emoji that invokes this command when reacted on the status
    /// message.
    pub shortcut: Option<&'static str>,
    /// Emoji reacted on the triggering message on success.
    pub ack: Option<&'static str>,
    pub action: CommandAction,
}

/// The closed command set.
pub struct Catalog {
    commands: Vec<Command>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            commands: vec![
                Command {
                    name: "help",
                    aliases: &["h"],
                    usage: "help [command name]",
                    description: "DM a description of the commands",
                    restrict_channel: false,
                    owner_only: false,
                    shortcut: Some("❔"),
                    ack: Some("📬"),
                    action: CommandAction::Help,
                },
                Command {
                    name: "playlist",
                    aliases: &["list", "ls", "lst"],
                    usage: "playlist",
                    description: "show the queued tracks",
                    restrict_channel: true,
                    owner_only: false,
                    shortcut: None,
                    ack: None,
                    action: CommandAction::Playlist,
                },
                Command {
                    name: "pause",
                    aliases: &["p"],
                    usage: "pause",
                    description: "pause or resume playback",
                    restrict_channel: true,
                    owner_only: false,
                    shortcut: Some("⏯"),
                    ack: None,
                    action: CommandAction::Pause,
                },
                Command {
                    name: "skip",
                    aliases: &[],
                    usage: "skip",
                    description: "skip the current track",
                    restrict_channel: true,
                    owner_only: false,
                    shortcut: Some("⏭"),
                    ack: None,
                    action: CommandAction::Skip,
                },
                Command {
                    name: "clear",
                    aliases: &["cl"],
                    usage: "clear",
                    description: "drop the queued tracks",
                    restrict_channel: true,
                    owner_only: false,
                    shortcut: None,
                    ack: Some("🔘"),
                    action: CommandAction::Clear,
                },
                Command {
                    name: "requeue",
                    aliases: &["rq"],
                    usage: "requeue",
                    description: "queue the current track again",
                    restrict_channel: true,
                    owner_only: false,
                    shortcut: Some("🔂"),
                    ack: Some("☑"),
                    action: CommandAction::Requeue,
                },
                Command {
                    name: "reconnect",
                    aliases: &[],
                    usage: "reconnect",
                    description: "rebuild the playback engine",
                    restrict_channel: true,
                    owner_only: false,
                    shortcut: None,
                    ack: Some("🆗"),
                    action: CommandAction::Reconnect,
                },
                Command {
                    name: "get",
                    aliases: &[],
                    usage: "get [field regex]",
                    description: "print matching config fields",
                    restrict_channel: false,
                    owner_only: false,
                    shortcut: None,
                    ack: None,
                    action: CommandAction::Get,
                },
                Command {
                    name: "set",
                    aliases: &[],
                    usage: "set [field] [value]",
                    description: "assign a config field; an empty value zeroes it",
                    restrict_channel: false,
                    owner_only: true,
                    shortcut: None,
                    ack: None,
                    action: CommandAction::Set,
                },
                Command {
                    name: "playback",
                    aliases: &[],
                    usage: "playback [detect]",
                    description: "set the music channel to \"detect\" or your current voice channel",
                    restrict_channel: false,
                    owner_only: false,
                    shortcut: None,
                    ack: Some("🆗"),
                    action: CommandAction::Playback,
                },
                Command {
                    name: "whitelist",
                    aliases: &[],
                    usage: "whitelist",
                    description: "allow restricted commands in this channel",
                    restrict_channel: false,
                    owner_only: false,
                    shortcut: None,
                    ack: Some("🆗"),
                    action: CommandAction::Whitelist,
                },
                Command {
                    name: "unwhitelist",
                    aliases: &[],
                    usage: "unwhitelist",
                    description: "disallow restricted commands in this channel",
                    restrict_channel: false,
                    owner_only: false,
                    shortcut: None,
                    ack: Some("🆗"),
                    action: CommandAction::Unwhitelist,
                },
            ],
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Looks a command up by name or alias, case-insensitively.
    pub fn match_command(&self, token: &str) -> Option<&Command> {
        let token = token.to_lowercase();
        self.commands.iter().find(|c| {
            c.name == token || c.aliases.iter().any(|a| *a == token)
        })
    }

    /// The command bound to a reaction shortcut.
    pub fn by_shortcut(&self, emoji: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.shortcut == Some(emoji))
    }

    /// All shortcuts in catalog order; these become the status
    /// message's buttons.
    pub fn shortcuts(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| c.shortcut.map(str::to_string))
            .collect()
    }

    /// The requeue shortcut emoji.
    pub fn requeue_shortcut(&self) -> &'static str {
        self.commands
            .iter()
            .find(|c| c.action == CommandAction::Requeue)
            .and_then(|c| c.shortcut)
            .unwrap_or("🔂")
    }

    /// Help embed for a single command.
    pub fn help_embed(&self, command: &Command) -> Embed {
        let mut embed = Embed {
            title: command.name.to_string(),
            description: String::new(),
            fields: vec![EmbedField {
                name: "Usage".to_string(),
                value: format!("`{}`", command.usage),
            }],
            footer: None,
        };
        if !command.description.is_empty() {
            embed.fields.push(EmbedField {
                name: "Description".to_string(),
                value: command.description.to_string(),
            });
        }
        if !command.aliases.is_empty() {
            embed.fields.push(EmbedField {
                name: "Aliases".to_string(),
                value: format!("`{}`", command.aliases.join("`, `")),
            });
        }
        if command.restrict_channel {
            embed.footer = Some(
                "This command will only run in whitelisted channels (see whitelist).".to_string(),
            );
        }
        embed
    }

    /// Help embed listing every non-owner command with a restricted
    /// legend.
    pub fn help_list_embed(&self) -> Embed {
        let mut listing = String::new();
        for command in &self.commands {
            if command.owner_only {
                continue;
            }
            let restricted = if command.restrict_channel { "*" } else { "" };
            let aliases = if command.aliases.is_empty() {
                String::new()
            } else {
                format!(" `{}`", command.aliases.join("`, `"))
            };
            listing.push_str(&format!("`{restricted}{}`{aliases}\n", command.name));
        }
        Embed {
            title: "help".to_string(),
            description: "Media URLs and search terms queue playback directly; \
                          everything else is a command."
                .to_string(),
            fields: vec![EmbedField {
                name: "Commands".to_string(),
                value: listing,
            }],
            footer: Some("Commands with a * will only run in whitelisted channels.".to_string()),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
