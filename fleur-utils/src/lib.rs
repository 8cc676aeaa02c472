/// Per-member channel access and the move transfer.
pub mod access;
/// Log and help embed builders.
pub mod embed;
/// Channel history access and bounded walks.
pub mod history;
/// Interaction response helpers.
pub mod interaction;
/// Message permalink parsing.
pub mod link;
/// Destination checks for room navigation.
pub mod navigation;
/// Pure parser helpers.
pub mod parse;
/// Permission and role helper utilities.
pub mod permissions;
/// Message selection and deletion.
pub mod purge;
/// Room graph parsing and lookup.
pub mod rooms;
/// Shared time helpers.
pub mod time;
