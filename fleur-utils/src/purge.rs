//! Message selection and deletion for the purge commands.
//!
//! Predicate purges run in two phases: a bulk pass over the recent window,
//! then a one-by-one fallback scan of older history when the window did not
//! hold enough matches. Range purges select first and delete afterwards.

use std::collections::HashSet;

use tracing::{error, warn};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, MessageMarker, UserMarker},
};

use crate::history::{HistoryMessage, HistoryWalk, MessageHistory};
use crate::time::now_unix_secs;

/// Messages inspected by the bulk pass.
pub const BULK_WINDOW: usize = 200;

const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;
const BULK_DELETE_SAFETY_BUFFER_SECS: i64 = 60 * 60;
const BULK_DELETE_CHUNK: usize = 100;

/// Which messages a predicate purge removes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PurgeFilter {
    Any,
    Author(Id<UserMarker>),
    /// Lowercased needle.
    Contains(String),
    /// Lowercased phrase.
    Exact(String),
}

impl PurgeFilter {
    pub fn contains(phrase: &str) -> Self {
        Self::Contains(phrase.to_lowercase())
    }

    pub fn exact(phrase: &str) -> Self {
        Self::Exact(phrase.to_lowercase())
    }

    pub fn matches(&self, message: &HistoryMessage) -> bool {
        match self {
            Self::Any => true,
            Self::Author(author_id) => message.author_id == *author_id,
            Self::Contains(needle) => message.content.to_lowercase().contains(needle.as_str()),
            Self::Exact(phrase) => message.content.to_lowercase() == *phrase,
        }
    }
}

/// How a scan ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PurgeOutcome {
    /// The requested count was reached.
    Complete,
    /// History ran out first.
    Exhausted,
    /// The scan ceiling was reached first.
    Partial,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PurgeReport {
    pub deleted: usize,
    pub outcome: PurgeOutcome,
}

/// Messages picked by a range or date selector, in deletion order.
#[derive(Clone, Debug)]
pub struct Selection {
    pub messages: Vec<HistoryMessage>,
    pub outcome: PurgeOutcome,
}

#[derive(Clone, Copy, Debug)]
pub struct ScanLimits {
    pub bulk_window: usize,
    /// Most messages a single scan may inspect.
    pub scan_ceiling: usize,
    /// Reference "now" for the bulk-delete age limit, unix seconds.
    pub now_secs: i64,
}

impl ScanLimits {
    pub fn new(scan_ceiling: usize) -> Self {
        Self {
            bulk_window: BULK_WINDOW,
            scan_ceiling,
            now_secs: now_unix_secs() as i64,
        }
    }
}

/// Delete up to `count` messages matching `filter`, newest first.
pub async fn purge_matching<H>(
    history: &H,
    channel_id: Id<ChannelMarker>,
    filter: &PurgeFilter,
    count: usize,
    limits: ScanLimits,
) -> anyhow::Result<PurgeReport>
where
    H: MessageHistory + ?Sized,
{
    let window = limits.bulk_window.min(limits.scan_ceiling);
    let mut walk = HistoryWalk::new(history, channel_id, window);
    let mut selected = Vec::new();

    while selected.len() < count {
        let Some(message) = walk.next().await? else {
            break;
        };
        if filter.matches(&message) {
            selected.push(message);
        }
    }

    let mut attempted: HashSet<Id<MessageMarker>> =
        selected.iter().map(|message| message.id).collect();
    let mut deleted = delete_selection(history, channel_id, &selected, limits.now_secs).await?;

    if deleted >= count {
        return Ok(PurgeReport {
            deleted,
            outcome: PurgeOutcome::Complete,
        });
    }
    if walk.is_exhausted() {
        return Ok(PurgeReport {
            deleted,
            outcome: PurgeOutcome::Exhausted,
        });
    }

    let mut walk = HistoryWalk::new(history, channel_id, limits.scan_ceiling);
    while deleted < count {
        let Some(message) = walk.next().await? else {
            break;
        };
        if !filter.matches(&message) || !attempted.insert(message.id) {
            continue;
        }

        match history.remove_message(channel_id, message.id).await {
            Ok(()) => deleted += 1,
            Err(source) => {
                warn!(?source, message_id = message.id.get(), "single delete failed");
            }
        }
    }

    let outcome = if deleted >= count {
        PurgeOutcome::Complete
    } else if walk.hit_ceiling() {
        PurgeOutcome::Partial
    } else {
        PurgeOutcome::Exhausted
    };

    Ok(PurgeReport { deleted, outcome })
}

/// Newest-first messages down to and including `reference`, capped at `cap`.
pub async fn select_after<H>(
    history: &H,
    channel_id: Id<ChannelMarker>,
    reference: Id<MessageMarker>,
    cap: usize,
    scan_ceiling: usize,
) -> anyhow::Result<Selection>
where
    H: MessageHistory + ?Sized,
{
    let mut walk = HistoryWalk::new(history, channel_id, scan_ceiling);
    let mut messages = Vec::new();

    while messages.len() < cap {
        let Some(message) = walk.next().await? else {
            break;
        };
        let reached = message.id == reference;
        messages.push(message);
        if reached {
            return Ok(Selection {
                messages,
                outcome: PurgeOutcome::Complete,
            });
        }
    }

    let outcome = if messages.len() >= cap {
        PurgeOutcome::Complete
    } else if walk.hit_ceiling() {
        PurgeOutcome::Partial
    } else {
        PurgeOutcome::Exhausted
    };

    Ok(Selection { messages, outcome })
}

/// Up to `cap - 1` messages strictly older than `reference`, nearest first,
/// followed by `reference` itself.
pub async fn select_before<H>(
    history: &H,
    channel_id: Id<ChannelMarker>,
    reference: HistoryMessage,
    cap: usize,
    scan_ceiling: usize,
) -> anyhow::Result<Selection>
where
    H: MessageHistory + ?Sized,
{
    let older_cap = cap.saturating_sub(1);
    let mut walk = HistoryWalk::starting_before(
        history,
        channel_id,
        Some(reference.id),
        scan_ceiling.min(older_cap),
    );
    let mut messages = Vec::with_capacity(older_cap.min(scan_ceiling).saturating_add(1));

    while let Some(message) = walk.next().await? {
        if message.created_at <= reference.created_at {
            messages.push(message);
        }
    }

    let outcome = if messages.len() >= older_cap {
        PurgeOutcome::Complete
    } else if older_cap > scan_ceiling && walk.hit_ceiling() {
        PurgeOutcome::Partial
    } else {
        PurgeOutcome::Exhausted
    };

    if cap > 0 {
        messages.push(reference);
    }

    Ok(Selection { messages, outcome })
}

/// Every message created at or after `start_secs`, oldest first.
///
/// The walk runs newest first and stops at the first older message.
pub async fn select_since<H>(
    history: &H,
    channel_id: Id<ChannelMarker>,
    start_secs: i64,
    scan_ceiling: usize,
) -> anyhow::Result<Selection>
where
    H: MessageHistory + ?Sized,
{
    let mut walk = HistoryWalk::new(history, channel_id, scan_ceiling);
    let mut messages = Vec::new();
    let mut reached_start = false;

    while let Some(message) = walk.next().await? {
        if message.created_at < start_secs {
            reached_start = true;
            break;
        }
        messages.push(message);
    }

    messages.reverse();
    let outcome = if !reached_start && walk.hit_ceiling() {
        PurgeOutcome::Partial
    } else {
        PurgeOutcome::Complete
    };

    Ok(Selection { messages, outcome })
}

/// Delete the given messages, bulk where the platform allows it.
///
/// Returns the number of messages actually deleted.
pub async fn delete_selection<H>(
    history: &H,
    channel_id: Id<ChannelMarker>,
    messages: &[HistoryMessage],
    now_secs: i64,
) -> anyhow::Result<usize>
where
    H: MessageHistory + ?Sized,
{
    let bulk_cutoff =
        now_secs.saturating_sub(BULK_DELETE_MAX_AGE_SECS - BULK_DELETE_SAFETY_BUFFER_SECS);

    let (bulk_candidates, mut single_delete): (Vec<_>, Vec<_>) = messages
        .iter()
        .map(|message| (message.id, message.created_at))
        .partition(|(_, created_at)| *created_at >= bulk_cutoff);
    let bulk_candidates: Vec<Id<MessageMarker>> =
        bulk_candidates.into_iter().map(|(id, _)| id).collect();
    let mut single_ids: Vec<Id<MessageMarker>> = Vec::new();
    let mut deleted = 0_usize;

    for chunk in bulk_candidates.chunks(BULK_DELETE_CHUNK) {
        if chunk.len() < 2 {
            single_ids.extend_from_slice(chunk);
            continue;
        }

        match history.remove_messages(channel_id, chunk).await {
            Ok(()) => deleted += chunk.len(),
            Err(source) => {
                error!(
                    ?source,
                    channel_id = channel_id.get(),
                    count = chunk.len(),
                    "bulk delete failed, falling back to single delete"
                );
                single_ids.extend_from_slice(chunk);
            }
        }
    }

    single_ids.extend(single_delete.drain(..).map(|(id, _)| id));
    for message_id in single_ids {
        match history.remove_message(channel_id, message_id).await {
            Ok(()) => deleted += 1,
            Err(source) => {
                warn!(?source, message_id = message_id.get(), "single delete failed");
            }
        }
    }

    Ok(deleted)
}
