use std::{env, str::FromStr};

use twilight_model::id::{
    Id,
    marker::{ChannelMarker, RoleMarker},
};

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_HISTORY_SCAN_LIMIT: usize = 5_000;

/// How the room feed is interpreted by `/move`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RoomMode {
    /// Any known room name is a valid destination.
    Flat,
    /// Only exits declared for the current room are valid destinations.
    #[default]
    Graph,
}

impl FromStr for RoomMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "graph" => Ok(Self::Graph),
            other => Err(ConfigError::Invalid {
                key: "FLEUR_ROOM_MODE",
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
    #[error("invalid value `{value}` for `{key}`")]
    Invalid { key: &'static str, value: String },
}

/// Guild-specific identifiers and limits the bot runs with.
#[derive(Clone, Debug)]
pub struct Config {
    /// Message-command prefix.
    pub prefix: String,
    /// Members holding any of these roles may run moderation commands.
    pub allowed_role_ids: Vec<Id<RoleMarker>>,
    /// Channel that receives every log record.
    pub log_channel_id: Id<ChannelMarker>,
    /// Channel whose messages declare the rooms.
    pub rooms_channel_id: Id<ChannelMarker>,
    /// Category that holds the room channels.
    pub allowed_category_id: Id<ChannelMarker>,
    pub room_mode: RoomMode,
    /// Upper bound on messages inspected by a single history scan.
    pub history_scan_limit: usize,
}

impl Config {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let prefix = lookup("FLEUR_PREFIX")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_owned());

        let roles_raw = required(&lookup, "FLEUR_ALLOWED_ROLE_IDS")?;
        let allowed_role_ids = roles_raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_id(part, "FLEUR_ALLOWED_ROLE_IDS"))
            .collect::<Result<Vec<_>, _>>()?;

        if allowed_role_ids.is_empty() {
            return Err(ConfigError::Invalid {
                key: "FLEUR_ALLOWED_ROLE_IDS",
                value: roles_raw,
            });
        }

        let log_channel_id = parse_id(
            &required(&lookup, "FLEUR_LOG_CHANNEL_ID")?,
            "FLEUR_LOG_CHANNEL_ID",
        )?;
        let rooms_channel_id = parse_id(
            &required(&lookup, "FLEUR_ROOMS_CHANNEL_ID")?,
            "FLEUR_ROOMS_CHANNEL_ID",
        )?;
        let allowed_category_id = parse_id(
            &required(&lookup, "FLEUR_ALLOWED_CATEGORY_ID")?,
            "FLEUR_ALLOWED_CATEGORY_ID",
        )?;

        let room_mode = match lookup("FLEUR_ROOM_MODE") {
            Some(raw) => raw.parse()?,
            None => RoomMode::default(),
        };

        let history_scan_limit = match lookup("FLEUR_HISTORY_SCAN_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::Invalid {
                    key: "FLEUR_HISTORY_SCAN_LIMIT",
                    value: raw,
                })?,
            None => DEFAULT_HISTORY_SCAN_LIMIT,
        };

        Ok(Self {
            prefix,
            allowed_role_ids,
            log_channel_id,
            rooms_channel_id,
            allowed_category_id,
            room_mode,
            history_scan_limit,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_id<T>(raw: &str, key: &'static str) -> Result<Id<T>, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("FLEUR_ALLOWED_ROLE_IDS", "11, 12"),
            ("FLEUR_LOG_CHANNEL_ID", "21"),
            ("FLEUR_ROOMS_CHANNEL_ID", "22"),
            ("FLEUR_ALLOWED_CATEGORY_ID", "23"),
        ]
    }

    #[test]
    fn loads_defaults_for_optional_keys() {
        let config = Config::from_lookup(lookup_from(&base_pairs())).unwrap();

        assert_eq!(config.prefix, "!");
        assert_eq!(config.allowed_role_ids, vec![Id::new(11), Id::new(12)]);
        assert_eq!(config.log_channel_id, Id::new(21));
        assert_eq!(config.room_mode, RoomMode::Graph);
        assert_eq!(config.history_scan_limit, 5_000);
    }

    #[test]
    fn reads_overrides() {
        let mut pairs = base_pairs();
        pairs.push(("FLEUR_PREFIX", "!!!!"));
        pairs.push(("FLEUR_ROOM_MODE", "Flat"));
        pairs.push(("FLEUR_HISTORY_SCAN_LIMIT", "300"));

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.prefix, "!!!!");
        assert_eq!(config.room_mode, RoomMode::Flat);
        assert_eq!(config.history_scan_limit, 300);
    }

    #[test]
    fn rejects_non_numeric_ids() {
        let mut pairs = base_pairs();
        pairs[1] = ("FLEUR_LOG_CHANNEL_ID", "logs");

        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "FLEUR_LOG_CHANNEL_ID",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_ids_and_unknown_modes() {
        let mut pairs = base_pairs();
        pairs[3] = ("FLEUR_ALLOWED_CATEGORY_ID", "0");
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = base_pairs();
        pairs.push(("FLEUR_ROOM_MODE", "maze"));
        assert!(matches!(
            Config::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::Invalid {
                key: "FLEUR_ROOM_MODE",
                ..
            })
        ));
    }

    #[test]
    fn reports_missing_keys() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("FLEUR_ALLOWED_ROLE_IDS")));
    }
}
