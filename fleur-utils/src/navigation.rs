//! Destination checks for `/move`.

use fleur_core::RoomMode;
use twilight_model::{
    channel::{Channel, ChannelType},
    id::{Id, marker::ChannelMarker},
};

use crate::rooms::{AUTOCOMPLETE_LIMIT, RoomGraph, known_room_names, suggest};

/// The bits of a guild channel navigation cares about.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoomChannel {
    pub id: Id<ChannelMarker>,
    pub name: String,
    pub parent_id: Option<Id<ChannelMarker>>,
}

impl RoomChannel {
    /// Project a text channel; other channel kinds are not rooms.
    pub fn from_channel(channel: &Channel) -> Option<Self> {
        if channel.kind != ChannelType::GuildText {
            return None;
        }

        Some(Self {
            id: channel.id,
            name: channel.name.clone()?,
            parent_id: channel.parent_id,
        })
    }
}

/// Why a move was refused. Each variant is a warning, not an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MoveRefusal {
    OutsideCategory,
    UnknownRoom(String),
    NoExit { from: String, to: String },
    MissingChannel(String),
    AlreadyThere(String),
}

impl MoveRefusal {
    /// Short description for the log record.
    pub fn log_description(&self) -> String {
        match self {
            Self::OutsideCategory => "/move used outside the room category".to_owned(),
            Self::UnknownRoom(room) => format!("/move to unknown room: {room}"),
            Self::NoExit { from, to } => format!("/move without an exit: {from} → {to}"),
            Self::MissingChannel(room) => format!("/move to a room without a channel: {room}"),
            Self::AlreadyThere(room) => format!("/move to the current room: {room}"),
        }
    }

    /// Ephemeral notice shown to the member.
    pub fn notice(&self) -> String {
        match self {
            Self::OutsideCategory => {
                "This command can only be used in the room category.".to_owned()
            }
            Self::UnknownRoom(room) => format!("Room **{room}** is not in the room list."),
            Self::NoExit { from, to } => {
                format!("There is no way from **{from}** to **{to}**.")
            }
            Self::MissingChannel(room) => {
                format!("Room **{room}** has no channel in the room category.")
            }
            Self::AlreadyThere(room) => format!("You are already in **{room}**."),
        }
    }
}

/// A validated move from one room channel to another.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MovePlan {
    pub from: RoomChannel,
    pub to: RoomChannel,
}

/// Check, in order, that the source is a room, the destination is reachable
/// and that a channel exists for it.
pub fn plan_move(
    mode: RoomMode,
    allowed_category_id: Id<ChannelMarker>,
    source: &RoomChannel,
    feed_lines: &[String],
    requested: &str,
    guild_channels: &[RoomChannel],
) -> Result<MovePlan, MoveRefusal> {
    if source.parent_id != Some(allowed_category_id) {
        return Err(MoveRefusal::OutsideCategory);
    }

    let requested = requested.trim();
    match mode {
        RoomMode::Flat => {
            if !known_room_names(feed_lines).contains(requested) {
                return Err(MoveRefusal::UnknownRoom(requested.to_owned()));
            }
        }
        RoomMode::Graph => {
            if !RoomGraph::parse(feed_lines).contains_exit(&source.name, requested) {
                return Err(MoveRefusal::NoExit {
                    from: source.name.clone(),
                    to: requested.to_owned(),
                });
            }
        }
    }

    let wanted = requested.to_lowercase();
    let Some(target) = guild_channels.iter().find(|channel| {
        channel.parent_id == Some(allowed_category_id) && channel.name.to_lowercase() == wanted
    }) else {
        return Err(MoveRefusal::MissingChannel(requested.to_owned()));
    };

    if target.id == source.id {
        return Err(MoveRefusal::AlreadyThere(requested.to_owned()));
    }

    Ok(MovePlan {
        from: source.clone(),
        to: target.clone(),
    })
}

/// Autocomplete choices for the `room` option.
///
/// Flat mode offers every known room, graph mode the exits of `current_room`.
pub fn destination_suggestions(
    mode: RoomMode,
    feed_lines: &[String],
    current_room: Option<&str>,
    typed: &str,
) -> Vec<String> {
    match mode {
        RoomMode::Flat => {
            let names = known_room_names(feed_lines);
            suggest(names.iter().map(String::as_str), typed, AUTOCOMPLETE_LIMIT)
        }
        RoomMode::Graph => {
            let graph = RoomGraph::parse(feed_lines);
            let exits = current_room.map(|room| graph.exits_from(room)).unwrap_or(&[]);
            suggest(exits.iter().map(String::as_str), typed, AUTOCOMPLETE_LIMIT)
        }
    }
}
