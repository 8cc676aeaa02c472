use twilight_model::gateway::payload::incoming::MessageCreate;

use super::{authorize, delete_invocation, report_purge, warn_usage};
use crate::CommandMeta;
use crate::log::Actor;
use fleur_core::Context;
use fleur_utils::parse::{parse_count, unquote_phrase};
use fleur_utils::purge::{PurgeFilter, ScanLimits, purge_matching};

pub const META: CommandMeta = CommandMeta {
    name: "purgephrase",
    aliases: &["очиститьфразы"],
    desc: "Delete N messages containing a phrase (case-insensitive).",
    category: "moderation",
    usage: "purgephrase <N> \"phrase\"",
};

/// Delete recent messages that contain a phrase anywhere in their text.
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
    let (Some(count), Some(phrase)) = (
        arg1.and_then(parse_count),
        arg_tail.and_then(unquote_phrase),
    ) else {
        warn_usage(&ctx, &actor, &META).await;
        return Ok(());
    };

    delete_invocation(&ctx, &msg).await;

    let limits = ScanLimits::new(ctx.config.history_scan_limit);
    let report = purge_matching(
        ctx.http.as_ref(),
        msg.channel_id,
        &PurgeFilter::contains(phrase),
        count,
        limits,
    )
    .await?;

    let scope = format!("containing «{phrase}»");
    report_purge(&ctx, &actor, &report, &scope).await;

    Ok(())
}
