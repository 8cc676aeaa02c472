use twilight_model::gateway::payload::incoming::MessageCreate;

use super::{authorize, delete_invocation, report_purge, warn_usage};
use crate::CommandMeta;
use crate::log::Actor;
use fleur_core::Context;
use fleur_utils::parse::{parse_count, parse_target_user_id};
use fleur_utils::purge::{PurgeFilter, ScanLimits, purge_matching};

pub const META: CommandMeta = CommandMeta {
    name: "purgeuser",
    aliases: &["очиститьюзера"],
    desc: "Delete the latest N messages sent by one member.",
    category: "moderation",
    usage: "purgeuser <N> <@user>",
};

/// Delete a member's most recent messages in the channel.
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
    let (Some(count), Some(target_user_id)) = (
        arg1.and_then(parse_count),
        arg_tail.and_then(parse_target_user_id),
    ) else {
        warn_usage(&ctx, &actor, &META).await;
        return Ok(());
    };

    delete_invocation(&ctx, &msg).await;

    let limits = ScanLimits::new(ctx.config.history_scan_limit);
    let report = purge_matching(
        ctx.http.as_ref(),
        msg.channel_id,
        &PurgeFilter::Author(target_user_id),
        count,
        limits,
    )
    .await?;

    let scope = format!("from <@{}>", target_user_id.get());
    report_purge(&ctx, &actor, &report, &scope).await;

    Ok(())
}
