//! Room graph parsed from the lines of the room feed channel.
//!
//! A declaration line reads `name: exit1, exit2, ...`. Lines without the
//! separator are not declarations and are skipped. The graph is never cached;
//! callers rebuild it from the current feed on every lookup.

use std::collections::BTreeSet;

const ROOM_SEPARATOR: char = ':';

/// Maximum number of suggestions Discord accepts in one autocomplete response.
pub const AUTOCOMPLETE_LIMIT: usize = 25;

/// One `name: exits` declaration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoomDecl {
    pub name: String,
    /// Exits in declaration order, without duplicates.
    pub exits: Vec<String>,
}

impl RoomDecl {
    /// Parse a single feed line. Returns `None` when the line has no separator.
    pub fn parse(line: &str) -> Option<Self> {
        let (name, exits_raw) = line.split_once(ROOM_SEPARATOR)?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut exits: Vec<String> = Vec::new();
        for exit in exits_raw.split(',').map(str::trim) {
            if !exit.is_empty() && !exits.iter().any(|known| known == exit) {
                exits.push(exit.to_owned());
            }
        }

        Some(Self {
            name: name.to_owned(),
            exits,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoomGraph {
    rooms: Vec<RoomDecl>,
}

impl RoomGraph {
    /// Build a graph from feed lines, keeping declarations in feed order.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rooms = lines
            .into_iter()
            .filter_map(|line| RoomDecl::parse(line.as_ref()))
            .collect();

        Self { rooms }
    }

    pub fn rooms(&self) -> &[RoomDecl] {
        &self.rooms
    }

    /// Exits of the first declaration whose name matches `name` ignoring case.
    pub fn exits_from(&self, name: &str) -> &[String] {
        let wanted = name.trim().to_lowercase();
        self.rooms
            .iter()
            .find(|room| room.name.to_lowercase() == wanted)
            .map(|room| room.exits.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `to` is an exit of `from`. The exit comparison is case-sensitive.
    pub fn contains_exit(&self, from: &str, to: &str) -> bool {
        self.exits_from(from).iter().any(|exit| exit == to)
    }
}

/// Every room name the feed knows about, for flat-list navigation.
///
/// Declaration lines contribute their name part; bare lines contribute
/// themselves.
pub fn known_room_names<I, S>(lines: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if line.is_empty() {
                return None;
            }
            match RoomDecl::parse(line) {
                Some(room) => Some(room.name),
                None if line.contains(ROOM_SEPARATOR) => None,
                None => Some(line.to_owned()),
            }
        })
        .collect()
}

/// Split raw feed message contents into trimmed, non-empty lines.
pub fn feed_lines<I, S>(contents: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    contents
        .into_iter()
        .flat_map(|content| {
            content
                .as_ref()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Filter candidates by case-insensitive substring, prefix matches first.
pub fn suggest<'a, I>(candidates: I, typed: &str, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = typed.trim().to_lowercase();
    let unique: BTreeSet<&str> = candidates.into_iter().collect();

    let (mut prefixed, mut contained): (Vec<&str>, Vec<&str>) = unique
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .partition(|name| name.to_lowercase().starts_with(&needle));

    prefixed.append(&mut contained);
    prefixed
        .into_iter()
        .take(limit)
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_without_separator_are_skipped() {
        let graph = RoomGraph::parse(["Hall", "just chatter", "Hall: Library"]);

        assert_eq!(graph.rooms().len(), 1);
        assert_eq!(graph.rooms()[0].name, "Hall");
    }

    #[test]
    fn room_lookup_ignores_case() {
        let graph = RoomGraph::parse(["Library: Hall"]);

        assert_eq!(graph.exits_from("library"), ["Hall".to_owned()]);
        assert_eq!(graph.exits_from("  LIBRARY "), ["Hall".to_owned()]);
    }

    #[test]
    fn exits_are_trimmed_and_deduplicated() {
        let room = RoomDecl::parse("  Hall :  Library, ,Garden , Library,").unwrap();

        assert_eq!(room.name, "Hall");
        assert_eq!(room.exits, vec!["Library".to_owned(), "Garden".to_owned()]);
    }

    #[test]
    fn only_first_separator_splits_name() {
        let room = RoomDecl::parse("Tower: Gate: East, Roof").unwrap();

        assert_eq!(room.name, "Tower");
        assert_eq!(room.exits, vec!["Gate: East".to_owned(), "Roof".to_owned()]);
    }

    #[test]
    fn empty_names_are_not_rooms() {
        assert!(RoomDecl::parse(": Hall").is_none());
    }

    #[test]
    fn first_declaration_wins() {
        let graph = RoomGraph::parse(["Hall: Library", "hall: Kitchen"]);

        assert_eq!(graph.exits_from("Hall"), ["Library".to_owned()]);
    }

    #[test]
    fn unknown_room_has_no_exits() {
        let graph = RoomGraph::parse(["Hall: Library"]);

        assert!(graph.exits_from("Cellar").is_empty());
        assert!(!graph.contains_exit("Cellar", "Hall"));
    }

    #[test]
    fn exit_identity_is_case_sensitive() {
        let graph = RoomGraph::parse(["Hall: Library, Garden"]);

        assert!(graph.contains_exit("hall", "Garden"));
        assert!(!graph.contains_exit("hall", "garden"));
    }

    #[test]
    fn known_names_mix_bare_and_declared_lines() {
        let names = known_room_names(["Attic", "Hall: Library", "  ", ": orphan"]);

        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["Attic".to_owned(), "Hall".to_owned()]
        );
    }

    #[test]
    fn feed_lines_split_multiline_messages() {
        let lines = feed_lines(["Hall: Library\n\n Library: Hall ", "Garden"]);

        assert_eq!(lines, vec!["Hall: Library", "Library: Hall", "Garden"]);
    }

    #[test]
    fn suggest_ranks_prefix_matches_first() {
        let out = suggest(
            ["Garden", "Rose garden", "Hall", "Garden"],
            "gar",
            AUTOCOMPLETE_LIMIT,
        );

        assert_eq!(out, vec!["Garden".to_owned(), "Rose garden".to_owned()]);
    }

    #[test]
    fn suggest_caps_results() {
        let names: Vec<String> = (0..40).map(|index| format!("Room {index:02}")).collect();
        let out = suggest(names.iter().map(String::as_str), "", AUTOCOMPLETE_LIMIT);

        assert_eq!(out.len(), AUTOCOMPLETE_LIMIT);
        assert_eq!(out[0], "Room 00");
    }
}
