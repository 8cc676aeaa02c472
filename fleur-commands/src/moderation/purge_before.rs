use twilight_model::gateway::payload::incoming::MessageCreate;

use super::messages::guild_only_message;
use super::{authorize, delete_invocation, report_purge, warn_usage};
use crate::CommandMeta;
use crate::log::{Actor, log_action};
use fleur_core::Context;
use fleur_utils::embed::LogLevel;
use fleur_utils::history::MessageHistory;
use fleur_utils::link::parse_local_message_link;
use fleur_utils::parse::parse_count;
use fleur_utils::purge::{PurgeReport, ScanLimits, delete_selection, select_before};

pub const META: CommandMeta = CommandMeta {
    name: "purgebefore",
    aliases: &["очиститьперед"],
    desc: "Delete the linked message and the N-1 messages right before it.",
    category: "moderation",
    usage: "purgebefore <message link> <N>",
};

/// Delete the linked message together with the messages preceding it.
pub async fn run(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
    arg_tail: Option<&str>,
) -> anyhow::Result<()> {
    if !authorize(&ctx, &msg, &META).await? {
        return Ok(());
    }

    let actor = Actor::from_message(&msg);
    let Some(guild_id) = msg.guild_id else {
        let out = guild_only_message(META.name);
        log_action(&ctx, &actor, LogLevel::Warn, &out, None, true).await;
        return Ok(());
    };

    let (Some(raw_link), Some(count)) = (arg1, arg_tail.and_then(parse_count)) else {
        warn_usage(&ctx, &actor, &META).await;
        return Ok(());
    };

    let link = match parse_local_message_link(raw_link, guild_id, msg.channel_id) {
        Ok(link) => link,
        Err(reason) => {
            let out = format!("Invalid message link: {reason}.");
            log_action(&ctx, &actor, LogLevel::Warn, &out, None, true).await;
            return Ok(());
        }
    };

    delete_invocation(&ctx, &msg).await;

    let http = ctx.http.as_ref();
    let Ok(reference) = http.fetch_message(msg.channel_id, link.message_id).await else {
        let out = "The linked message was not found in this channel.";
        log_action(&ctx, &actor, LogLevel::Warn, out, None, true).await;
        return Ok(());
    };

    let limits = ScanLimits::new(ctx.config.history_scan_limit);
    let selection =
        select_before(http, msg.channel_id, reference, count, limits.scan_ceiling).await?;
    let deleted =
        delete_selection(http, msg.channel_id, &selection.messages, limits.now_secs).await?;

    let report = PurgeReport {
        deleted,
        outcome: selection.outcome,
    };
    report_purge(&ctx, &actor, &report, "up to the linked message").await;

    Ok(())
}
