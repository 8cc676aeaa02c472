pub mod messages;
pub mod purge;
pub mod purge_after;
pub mod purge_before;
pub mod purge_exact;
pub mod purge_phrase;
pub mod purge_until;
pub mod purge_user;

use twilight_model::{gateway::payload::incoming::MessageCreate, guild::Permissions};

use crate::CommandMeta;
use crate::log::{Actor, log_action};
use fleur_core::Context;
use fleur_utils::embed::LogLevel;
use fleur_utils::permissions::{
    has_allowed_role, has_message_permission, resolve_message_author_roles,
};
use fleur_utils::purge::{PurgeOutcome, PurgeReport};
use messages::{
    guild_only_message, missing_permission_message, missing_role_message, purge_outcome_note,
    purge_summary, usage_message,
};

/// Check the caller may run a purge command, logging a warning when not.
pub(crate) async fn authorize(
    ctx: &Context,
    msg: &MessageCreate,
    meta: &CommandMeta,
) -> anyhow::Result<bool> {
    let actor = Actor::from_message(msg);
    let http = &ctx.http;

    let Some(roles) = resolve_message_author_roles(http, msg).await? else {
        let out = guild_only_message(meta.name);
        log_action(ctx, &actor, LogLevel::Warn, &out, None, true).await;
        return Ok(false);
    };

    if !has_allowed_role(&roles, &ctx.config.allowed_role_ids) {
        let out = missing_role_message(meta.name);
        log_action(ctx, &actor, LogLevel::Warn, &out, None, true).await;
        return Ok(false);
    }

    if !has_message_permission(http, msg, Permissions::MANAGE_MESSAGES).await? {
        let out = missing_permission_message(meta.name);
        log_action(ctx, &actor, LogLevel::Warn, &out, None, true).await;
        return Ok(false);
    }

    Ok(true)
}

/// Log the usage line of a command as a warning.
pub(crate) async fn warn_usage(ctx: &Context, actor: &Actor, meta: &CommandMeta) {
    let out = usage_message(&ctx.config.prefix, meta);
    log_action(ctx, actor, LogLevel::Warn, &out, None, true).await;
}

/// Remove the command message so it is not counted by the purge.
pub(crate) async fn delete_invocation(ctx: &Context, msg: &MessageCreate) {
    let _ = ctx.http.delete_message(msg.channel_id, msg.id).await;
}

/// Log the result of a purge; partial scans are reported as warnings.
pub(crate) async fn report_purge(
    ctx: &Context,
    actor: &Actor,
    report: &PurgeReport,
    scope: &str,
) {
    let summary = purge_summary(report, scope);
    let note = purge_outcome_note(report, ctx.config.history_scan_limit);
    let level = match report.outcome {
        PurgeOutcome::Partial => LogLevel::Warn,
        PurgeOutcome::Complete | PurgeOutcome::Exhausted => LogLevel::Success,
    };

    log_action(ctx, actor, level, &summary, note.as_deref(), true).await;
}
