//! Message permalink parsing.

use std::sync::LazyLock;

use regex::Regex;
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, GuildMarker, MessageMarker},
};

static MESSAGE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://(?:(?:ptb|canary)\.)?discord(?:app)?\.com/channels/(\d{1,20})/(\d{1,20})/(\d{1,20})/?$",
    )
    .expect("message link pattern is valid")
});

/// The three ids of a message permalink.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageLink {
    pub guild_id: Id<GuildMarker>,
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("not a message link")]
    Malformed,
    #[error("the link points to another server")]
    ForeignGuild,
    #[error("the link points to another channel")]
    ForeignChannel,
}

impl MessageLink {
    /// Reject links that do not point into the invoking guild and channel.
    pub fn ensure_local(
        self,
        guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Self, LinkError> {
        if self.guild_id != guild_id {
            return Err(LinkError::ForeignGuild);
        }
        if self.channel_id != channel_id {
            return Err(LinkError::ForeignChannel);
        }

        Ok(self)
    }
}

/// Parse a message permalink, returning `None` on any structural mismatch.
pub fn parse_message_link(raw: &str) -> Option<MessageLink> {
    let captures = MESSAGE_LINK.captures(raw.trim())?;
    let id = |index: usize| -> Option<u64> { captures.get(index)?.as_str().parse().ok() };

    Some(MessageLink {
        guild_id: Id::new_checked(id(1)?)?,
        channel_id: Id::new_checked(id(2)?)?,
        message_id: Id::new_checked(id(3)?)?,
    })
}

/// Parse a permalink and confirm it targets the invoking channel.
pub fn parse_local_message_link(
    raw: &str,
    guild_id: Id<GuildMarker>,
    channel_id: Id<ChannelMarker>,
) -> Result<MessageLink, LinkError> {
    parse_message_link(raw)
        .ok_or(LinkError::Malformed)?
        .ensure_local(guild_id, channel_id)
}

/// Build the jump URL for a guild message.
pub fn message_jump_url(
    guild_id: Id<GuildMarker>,
    channel_id: Id<ChannelMarker>,
    message_id: Id<MessageMarker>,
) -> String {
    format!(
        "https://discord.com/channels/{}/{}/{}",
        guild_id.get(),
        channel_id.get(),
        message_id.get()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_host_variants() {
        for host in [
            "discord.com",
            "discordapp.com",
            "ptb.discord.com",
            "canary.discord.com",
        ] {
            let raw = format!("https://{host}/channels/1/2/3");
            let link = parse_message_link(&raw).unwrap();
            assert_eq!(link.guild_id, Id::new(1));
            assert_eq!(link.channel_id, Id::new(2));
            assert_eq!(link.message_id, Id::new(3));
        }
    }

    #[test]
    fn rejects_structural_mismatches() {
        for raw in [
            "http://discord.com/channels/1/2/3",
            "https://discord.gg/channels/1/2/3",
            "https://discord.com/channels/1/2",
            "https://discord.com/channels/1/2/3/4",
            "https://discord.com/channels/@me/2/3",
            "https://evil.example/https://discord.com/channels/1/2/3",
            "https://discord.com/channels/0/2/3",
            "see https://discord.com/channels/1/2/3",
        ] {
            assert!(parse_message_link(raw).is_none(), "{raw} should not parse");
        }
    }

    #[test]
    fn accepts_trailing_slash_and_whitespace() {
        assert!(parse_message_link("  https://discord.com/channels/1/2/3/ ").is_some());
    }

    #[test]
    fn rejects_links_outside_invoking_context() {
        let raw = "https://discord.com/channels/10/20/30";

        assert_eq!(
            parse_local_message_link(raw, Id::new(11), Id::new(20)),
            Err(LinkError::ForeignGuild)
        );
        assert_eq!(
            parse_local_message_link(raw, Id::new(10), Id::new(21)),
            Err(LinkError::ForeignChannel)
        );
        assert_eq!(
            parse_local_message_link("nope", Id::new(10), Id::new(20)),
            Err(LinkError::Malformed)
        );
        assert_eq!(
            parse_local_message_link(raw, Id::new(10), Id::new(20))
                .unwrap()
                .message_id,
            Id::new(30)
        );
    }

    #[test]
    fn jump_url_round_trips() {
        let url = message_jump_url(Id::new(5), Id::new(6), Id::new(7));

        assert_eq!(url, "https://discord.com/channels/5/6/7");
        assert!(parse_message_link(&url).is_some());
    }
}
