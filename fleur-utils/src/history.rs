//! Channel history access behind a trait, so scans can run against the live
//! HTTP client or an in-memory channel.

use std::collections::VecDeque;

use async_trait::async_trait;
use twilight_http::Client;
use twilight_model::{
    channel::Message,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

/// Largest page Discord returns for a history request.
pub const HISTORY_PAGE_SIZE: u16 = 100;

/// The parts of a message that selection and deletion look at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HistoryMessage {
    pub id: Id<MessageMarker>,
    pub author_id: Id<UserMarker>,
    pub content: String,
    /// Creation time, unix seconds.
    pub created_at: i64,
}

impl From<Message> for HistoryMessage {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            author_id: message.author.id,
            content: message.content,
            created_at: message.timestamp.as_secs(),
        }
    }
}

#[async_trait]
pub trait MessageHistory: Send + Sync {
    /// Newest-first page of messages strictly older than `before`, or the
    /// newest page when `before` is `None`.
    async fn fetch_page(
        &self,
        channel_id: Id<ChannelMarker>,
        before: Option<Id<MessageMarker>>,
        limit: u16,
    ) -> anyhow::Result<Vec<HistoryMessage>>;

    async fn fetch_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> anyhow::Result<HistoryMessage>;

    async fn remove_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> anyhow::Result<()>;

    /// Bulk delete. Discord accepts 2..=100 ids younger than 14 days.
    async fn remove_messages(
        &self,
        channel_id: Id<ChannelMarker>,
        message_ids: &[Id<MessageMarker>],
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl MessageHistory for Client {
    async fn fetch_page(
        &self,
        channel_id: Id<ChannelMarker>,
        before: Option<Id<MessageMarker>>,
        limit: u16,
    ) -> anyhow::Result<Vec<HistoryMessage>> {
        let response = match before {
            Some(before_id) => {
                self.channel_messages(channel_id)
                    .before(before_id)
                    .limit(limit)
                    .await?
            }
            None => self.channel_messages(channel_id).limit(limit).await?,
        };

        let messages = response.model().await?;
        Ok(messages.into_iter().map(HistoryMessage::from).collect())
    }

    async fn fetch_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> anyhow::Result<HistoryMessage> {
        let message = self.message(channel_id, message_id).await?.model().await?;
        Ok(message.into())
    }

    async fn remove_message(
        &self,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> anyhow::Result<()> {
        self.delete_message(channel_id, message_id).await?;
        Ok(())
    }

    async fn remove_messages(
        &self,
        channel_id: Id<ChannelMarker>,
        message_ids: &[Id<MessageMarker>],
    ) -> anyhow::Result<()> {
        self.delete_messages(channel_id, message_ids).await?;
        Ok(())
    }
}

/// Newest-to-oldest walk over a channel's history, bounded by a ceiling on
/// the number of messages inspected.
pub struct HistoryWalk<'a, H: ?Sized> {
    history: &'a H,
    channel_id: Id<ChannelMarker>,
    before: Option<Id<MessageMarker>>,
    buffer: VecDeque<HistoryMessage>,
    scanned: usize,
    ceiling: usize,
    exhausted: bool,
}

impl<'a, H> HistoryWalk<'a, H>
where
    H: MessageHistory + ?Sized,
{
    /// Start from the newest message.
    pub fn new(history: &'a H, channel_id: Id<ChannelMarker>, ceiling: usize) -> Self {
        Self::starting_before(history, channel_id, None, ceiling)
    }

    /// Start from the newest message older than `before`.
    pub fn starting_before(
        history: &'a H,
        channel_id: Id<ChannelMarker>,
        before: Option<Id<MessageMarker>>,
        ceiling: usize,
    ) -> Self {
        Self {
            history,
            channel_id,
            before,
            buffer: VecDeque::new(),
            scanned: 0,
            ceiling,
            exhausted: false,
        }
    }

    /// Next older message, or `None` once history or the ceiling is reached.
    pub async fn next(&mut self) -> anyhow::Result<Option<HistoryMessage>> {
        if self.scanned >= self.ceiling {
            if self.ceiling > 0 && self.buffer.is_empty() && !self.exhausted {
                self.settle_end().await?;
            }
            return Ok(None);
        }

        if self.buffer.is_empty() && !self.exhausted {
            let remaining = self.ceiling - self.scanned;
            let limit = u16::try_from(remaining)
                .unwrap_or(HISTORY_PAGE_SIZE)
                .min(HISTORY_PAGE_SIZE);
            let page = self
                .history
                .fetch_page(self.channel_id, self.before, limit)
                .await?;

            if page.len() < usize::from(limit) {
                self.exhausted = true;
            }
            self.before = page.last().map(|message| message.id).or(self.before);
            self.buffer.extend(page);
        }

        let next = self.buffer.pop_front();
        if next.is_some() {
            self.scanned += 1;
        }
        Ok(next)
    }

    /// At the ceiling, look one message further so a channel holding exactly
    /// `ceiling` messages counts as exhausted.
    async fn settle_end(&mut self) -> anyhow::Result<()> {
        let page = self
            .history
            .fetch_page(self.channel_id, self.before, 1)
            .await?;

        if page.is_empty() {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }

    /// Whether the walk stopped because it hit the ceiling rather than the
    /// end of history.
    pub fn hit_ceiling(&self) -> bool {
        self.scanned >= self.ceiling && !(self.exhausted && self.buffer.is_empty())
    }

    /// Whether the channel has no messages beyond what was already yielded.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buffer.is_empty()
    }
}

/// Read every message of a feed channel, newest first, up to `ceiling`.
pub async fn read_feed<H>(
    history: &H,
    channel_id: Id<ChannelMarker>,
    ceiling: usize,
) -> anyhow::Result<Vec<String>>
where
    H: MessageHistory + ?Sized,
{
    let mut walk = HistoryWalk::new(history, channel_id, ceiling);
    let mut contents = Vec::new();

    while let Some(message) = walk.next().await? {
        contents.push(message.content);
    }

    Ok(contents)
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryChannel;
    use super::*;

    fn numbered(count: usize) -> MemoryChannel {
        let contents: Vec<String> = (0..count).map(|index| format!("m{index}")).collect();
        let entries: Vec<(u64, &str, i64)> = contents
            .iter()
            .map(|content| (1, content.as_str(), 0))
            .collect();
        MemoryChannel::with(&entries)
    }

    #[tokio::test]
    async fn walk_yields_newest_first_across_pages() {
        let channel = numbered(250);
        let mut walk = HistoryWalk::new(&channel, Id::new(1), usize::MAX);

        let mut ids = Vec::new();
        while let Some(message) = walk.next().await.unwrap() {
            ids.push(message.id.get());
        }

        assert_eq!(ids.len(), 250);
        assert_eq!(ids.first(), Some(&250));
        assert_eq!(ids.last(), Some(&1));
        assert!(walk.is_exhausted());
        assert!(!walk.hit_ceiling());
        assert_eq!(*channel.page_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn walk_stops_at_ceiling() {
        let channel = numbered(50);
        let mut walk = HistoryWalk::new(&channel, Id::new(1), 30);

        let mut seen = 0;
        while walk.next().await.unwrap().is_some() {
            seen += 1;
        }

        assert_eq!(seen, 30);
        assert!(walk.hit_ceiling());
        assert!(!walk.is_exhausted());
    }

    #[tokio::test]
    async fn walk_over_exactly_ceiling_messages_is_exhausted() {
        let channel = numbered(30);
        let mut walk = HistoryWalk::new(&channel, Id::new(1), 30);

        let mut seen = 0;
        while walk.next().await.unwrap().is_some() {
            seen += 1;
        }

        assert_eq!(seen, 30);
        assert!(walk.is_exhausted());
        assert!(!walk.hit_ceiling());
    }

    #[tokio::test]
    async fn walk_can_start_before_a_message() {
        let channel = numbered(10);
        let mut walk = HistoryWalk::starting_before(&channel, Id::new(1), Some(Id::new(4)), 100);

        let first = walk.next().await.unwrap().unwrap();
        assert_eq!(first.id, Id::new(3));
    }

    #[tokio::test]
    async fn feed_reads_every_message() {
        let channel = MemoryChannel::with(&[(1, "Hall: Library", 0), (1, "Library: Hall", 0)]);

        let feed = read_feed(&channel, Id::new(1), 1_000).await.unwrap();
        assert_eq!(feed, vec!["Library: Hall", "Hall: Library"]);
    }
}
