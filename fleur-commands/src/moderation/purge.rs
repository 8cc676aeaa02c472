use twilight_model::gateway::payload::incoming::MessageCreate;

use super::{authorize, delete_invocation, report_purge, warn_usage};
use crate::CommandMeta;
use crate::log::Actor;
use fleur_core::Context;
use fleur_utils::parse::parse_count;
use fleur_utils::purge::{PurgeFilter, ScanLimits, purge_matching};

pub const META: CommandMeta = CommandMeta {
    name: "purge",
    aliases: &["очистить"],
    desc: "Delete the latest N messages in this channel.",
    category: "moderation",
    usage: "purge <N>",
};

/// Delete the most recent messages of the channel.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    if !authorize(&ctx, &msg, &META).await? {
        return Ok(());
    }

    let actor = Actor::from_message(&msg);
    let Some(count) = arg1.and_then(parse_count) else {
        warn_usage(&ctx, &actor, &META).await;
        return Ok(());
    };

    delete_invocation(&ctx, &msg).await;

    let limits = ScanLimits::new(ctx.config.history_scan_limit);
    let report = purge_matching(
        ctx.http.as_ref(),
        msg.channel_id,
        &PurgeFilter::Any,
        count,
        limits,
    )
    .await?;

    report_purge(&ctx, &actor, &report, "").await;

    Ok(())
}
