use twilight_model::gateway::payload::incoming::MessageCreate;

use super::{authorize, delete_invocation, report_purge, warn_usage};
use crate::CommandMeta;
use crate::log::{Actor, log_action};
use fleur_core::Context;
use fleur_utils::embed::LogLevel;
use fleur_utils::parse::parse_day_start;
use fleur_utils::purge::{PurgeReport, ScanLimits, delete_selection, select_since};

pub const META: CommandMeta = CommandMeta {
    name: "purgeuntil",
    aliases: &["очиститьдо"],
    desc: "Delete every message sent since the start of a date (UTC), oldest first.",
    category: "moderation",
    usage: "purgeuntil DD.MM.YYYY",
};

/// Delete all messages from midnight of the given day onward, oldest first.
pub async fn run(ctx: Context, msg: Box<MessageCreate>, arg1: Option<&str>) -> anyhow::Result<()> {
    if !authorize(&ctx, &msg, &META).await? {
        return Ok(());
    }

    let actor = Actor::from_message(&msg);
    let Some(raw_date) = arg1 else {
        warn_usage(&ctx, &actor, &META).await;
        return Ok(());
    };

    let Some(start) = parse_day_start(raw_date) else {
        let out = "Invalid date format: use DD.MM.YYYY.";
        log_action(&ctx, &actor, LogLevel::Warn, out, None, true).await;
        return Ok(());
    };

    delete_invocation(&ctx, &msg).await;

    let http = ctx.http.as_ref();
    let limits = ScanLimits::new(ctx.config.history_scan_limit);
    let selection = select_since(http, msg.channel_id, start, limits.scan_ceiling).await?;
    let deleted =
        delete_selection(http, msg.channel_id, &selection.messages, limits.now_secs).await?;

    let report = PurgeReport {
        deleted,
        outcome: selection.outcome,
    };
    let scope = format!("sent since {}", raw_date.trim());
    report_purge(&ctx, &actor, &report, &scope).await;

    Ok(())
}
