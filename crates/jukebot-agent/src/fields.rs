// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit config field table backing the `get`/`set` commands.
//!
//! Each field pairs a reader with a typed writer, keeping the config
//! contract textual: field names here are the names users type.

use jukebot_core::{ChannelId, JukebotError, TenantConfig, DEFAULT_COMMAND_PREFIX};
use regex::Regex;

/// One row of the field table.
pub struct ConfigField {
    pub name: &'static str,
    pub read: fn(&TenantConfig) -> String,
    /// Parses and assigns. An empty value zeroes the field.
    pub write: fn(&mut TenantConfig, &str) -> Result<(), JukebotError>,
}

fn read_prefix(config: &TenantConfig) -> String {
    config.prefix.clone()
}

fn write_prefix(config: &mut TenantConfig, value: &str) -> Result<(), JukebotError> {
    config.prefix = if value.is_empty() {
        DEFAULT_COMMAND_PREFIX.to_string()
    } else {
        value.to_string()
    };
    Ok(())
}

fn read_listen(config: &TenantConfig) -> String {
    config
        .listen_channels
        .iter()
        .map(|c| c.0.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_listen(config: &mut TenantConfig, value: &str) -> Result<(), JukebotError> {
    config.listen_channels.clear();
    for id in value.split_whitespace() {
        config.add_listen_channel(ChannelId(id.to_string()));
    }
    Ok(())
}

fn read_play(config: &TenantConfig) -> String {
    config
        .music_channel
        .as_ref()
        .map(|c| c.0.clone())
        .unwrap_or_default()
}

fn write_play(config: &mut TenantConfig, value: &str) -> Result<(), JukebotError> {
    config.music_channel = if value.is_empty() {
        None
    } else {
        Some(ChannelId(value.to_string()))
    };
    Ok(())
}

fn read_loudness(config: &TenantConfig) -> String {
    format!("{}", config.loudness)
}

fn write_loudness(config: &mut TenantConfig, value: &str) -> Result<(), JukebotError> {
    if value.is_empty() {
        config.loudness = 0.0;
        return Ok(());
    }
    config.loudness = value
        .parse()
        .map_err(|_| JukebotError::CommandUsage(format!("invalid number: {value}")))?;
    Ok(())
}

static FIELDS: [ConfigField; 4] = [
    ConfigField {
        name: "prefix",
        read: read_prefix,
        write: write_prefix,
    },
    ConfigField {
        name: "listen",
        read: read_listen,
        write: write_listen,
    },
    ConfigField {
        name: "play",
        read: read_play,
        write: write_play,
    },
    ConfigField {
        name: "loudness",
        read: read_loudness,
        write: write_loudness,
    },
];

/// The full field table.
pub fn config_fields() -> &'static [ConfigField] {
    &FIELDS
}

/// Fields whose names match the given regex.
pub fn find_fields(pattern: &str) -> Result<Vec<&'static ConfigField>, JukebotError> {
    let re = Regex::new(pattern)
        .map_err(|e| JukebotError::CommandUsage(format!("bad field pattern: {e}")))?;
    Ok(FIELDS.iter().filter(|f| re.is_match(f.name)).collect())
}

/// A field by exact name, case-insensitive.
pub fn field_by_name(name: &str) -> Option<&'static ConfigField> {
    let name = name.to_lowercase();
    FIELDS.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_round_trips() {
        let mut config = TenantConfig::default();

        let prefix = field_by_name("prefix").unwrap();
        (prefix.write)(&mut config, "!!").unwrap();
        assert_eq!((prefix.read)(&config), "!!");

        let listen = field_by_name("listen").unwrap();
        (listen.write)(&mut config, "c1 c2 c1").unwrap();
        assert_eq!((listen.read)(&config), "c1 c2");
        assert_eq!(config.listen_channels.len(), 2);

        let play = field_by_name("play").unwrap();
        (play.write)(&mut config, "v1").unwrap();
        assert_eq!(config.music_channel, Some(ChannelId("v1".into())));

        let loudness = field_by_name("loudness").unwrap();
        (loudness.write)(&mut config, "-18.5").unwrap();
        assert_eq!(config.loudness, -18.5);
        assert_eq!((loudness.read)(&config), "-18.5");
    }

    #[test]
    fn empty_value_zeroes_each_field() {
        let mut config = TenantConfig {
            prefix: "!!".into(),
            listen_channels: vec![ChannelId("c1".into())],
            music_channel: Some(ChannelId("v1".into())),
            loudness: -18.0,
        };
        for field in config_fields() {
            (field.write)(&mut config, "").unwrap();
        }
        assert_eq!(config, TenantConfig::default());
    }

    #[test]
    fn bad_loudness_is_a_usage_error() {
        let mut config = TenantConfig::default();
        let loudness = field_by_name("loudness").unwrap();
        let err = (loudness.write)(&mut config, "loud").unwrap_err();
        assert!(matches!(err, JukebotError::CommandUsage(_)));
        assert_eq!(config.loudness, 0.0);
    }

    #[test]
    fn find_fields_filters_by_regex() {
        let all = find_fields(".*").unwrap();
        assert_eq!(all.len(), 4);

        let some = find_fields("l").unwrap();
        let names: Vec<&str> = some.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["listen", "play", "loudness"]);

        assert!(find_fields("(").is_err());
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        assert!(field_by_name("PREFIX").is_some());
        assert!(field_by_name("nope").is_none());
    }
}
