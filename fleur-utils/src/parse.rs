use chrono::NaiveDate;
use twilight_model::id::{Id, marker::UserMarker};

/// Parse a target user from a raw argument (`<@id>`, `<@!id>`, or raw ID).
pub fn parse_target_user_id(raw: &str) -> Option<Id<UserMarker>> {
    let trimmed = raw.trim();

    let numeric = if trimmed.starts_with("<@") && trimmed.ends_with('>') {
        let without_wrappers = trimmed.strip_prefix("<@")?.strip_suffix('>')?;
        without_wrappers
            .strip_prefix('!')
            .unwrap_or(without_wrappers)
    } else {
        trimmed
    };

    let id = numeric.parse::<u64>().ok()?;

    Id::new_checked(id)
}

/// Parse a positive message count.
pub fn parse_count(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|count| *count >= 1)
}

/// Strip one pair of matching straight or typographic quotes around a phrase.
pub fn unquote_phrase(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let inner = [('"', '"'), ('«', '»'), ('“', '”')]
        .into_iter()
        .find_map(|(open, close)| trimmed.strip_prefix(open)?.strip_suffix(close))
        .unwrap_or(trimmed);

    Some(inner).filter(|phrase| !phrase.is_empty())
}

/// Parse a `DD.MM.YYYY` day into the unix timestamp of its midnight (UTC).
pub fn parse_day_start(raw: &str) -> Option<i64> {
    let day = NaiveDate::parse_from_str(raw.trim(), "%d.%m.%Y").ok()?;

    Some(day.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

/// Find the known name closest to `entered`, if it is close enough to be a
/// plausible typo.
pub fn closest_name<'a>(
    entered: &str,
    known: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let entered = entered.to_lowercase();
    let entered_len = entered.chars().count();

    known
        .into_iter()
        .map(|name| (name, edit_distance(&entered, &name.to_lowercase())))
        .filter(|(name, distance)| {
            let longest = entered_len.max(name.chars().count()).max(1);
            // Close enough: at most 40% of the longer word differs.
            distance * 5 <= longest * 2
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name)
}

fn edit_distance(left: &str, right: &str) -> usize {
    let right: Vec<char> = right.chars().collect();
    let mut previous: Vec<usize> = (0..=right.len()).collect();
    let mut current = vec![0; right.len() + 1];

    for (row, left_char) in left.chars().enumerate() {
        current[0] = row + 1;
        for (col, right_char) in right.iter().enumerate() {
            let substitution = previous[col] + usize::from(left_char != *right_char);
            current[col + 1] = substitution
                .min(previous[col + 1] + 1)
                .min(current[col] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right.len()]
}
