pub mod log;
pub mod moderation;
pub mod navigation;
pub mod utility;

use tracing::{debug, error};
use twilight_model::{
    application::{
        command::Command,
        interaction::{InteractionData, InteractionType},
    },
    gateway::payload::incoming::{InteractionCreate, MessageCreate},
};

use fleur_core::Context;
use fleur_utils::embed::LogLevel;
use fleur_utils::parse::closest_name;
use log::{Actor, log_action, send_direct_text};
use moderation::messages::failure_message;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InteractionRoute {
    Move,
    MoveAutocomplete,
}

fn route_interaction(kind: InteractionType, command_name: &str) -> Option<InteractionRoute> {
    const MOVE: &str = navigation::move_room::META.name;

    match (kind, command_name) {
        (InteractionType::ApplicationCommand, MOVE) => Some(InteractionRoute::Move),
        (InteractionType::ApplicationCommandAutocomplete, MOVE) => {
            Some(InteractionRoute::MoveAutocomplete)
        }
        _ => None,
    }
}

// Global command meta data
pub struct CommandMeta {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub desc: &'static str,
    pub category: &'static str,
    /// Usage without the prefix, e.g. `purge <N>`.
    pub usage: &'static str,
}

impl CommandMeta {
    pub fn usage_with(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.usage)
    }

    /// Case-insensitive match against the name and every alias.
    pub fn answers_to(&self, entered: &str) -> bool {
        let entered = entered.to_lowercase();
        self.name == entered || self.aliases.iter().any(|alias| *alias == entered)
    }
}

/// Prefix commands.
pub const COMMANDS: &[CommandMeta] = &[
    moderation::purge::META,
    moderation::purge_user::META,
    moderation::purge_phrase::META,
    moderation::purge_exact::META,
    moderation::purge_after::META,
    moderation::purge_before::META,
    moderation::purge_until::META,
    utility::help::META,
];

/// Application commands, registered once the gateway is ready.
pub const SLASH_COMMANDS: &[CommandMeta] = &[navigation::move_room::META];

pub fn find_command(entered: &str) -> Option<&'static CommandMeta> {
    COMMANDS.iter().find(|meta| meta.answers_to(entered))
}

pub fn slash_commands() -> anyhow::Result<Vec<Command>> {
    Ok(vec![navigation::move_room::command()?])
}

/// Split `content` into a command word and its first argument and the rest,
/// or `None` when it does not start with `prefix`.
fn split_invocation<'a>(
    prefix: &str,
    content: &'a str,
) -> Option<(&'a str, Option<&'a str>, Option<&'a str>)> {
    let content = content.trim().strip_prefix(prefix)?.trim();
    let mut command_and_rest = content.splitn(2, char::is_whitespace);
    let cmd = command_and_rest.next().unwrap_or("");
    if cmd.is_empty() {
        return None;
    }

    let rest = command_and_rest
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let (arg1, arg_tail) = match rest {
        Some(value) => {
            let mut args = value.splitn(2, char::is_whitespace);
            let first = args.next().filter(|arg| !arg.is_empty());
            let tail = args
                .next()
                .map(str::trim)
                .filter(|remaining| !remaining.is_empty());

            (first, tail)
        }
        None => (None, None),
    };

    Some((cmd, arg1, arg_tail))
}

pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    let content_owned = msg.content.clone();
    let Some((cmd, arg1, arg_tail)) = split_invocation(&ctx.config.prefix, &content_owned) else {
        return Ok(());
    };

    let actor = Actor::from_message(&msg);
    let Some(meta) = find_command(cmd) else {
        suggest_command(&ctx, &actor, cmd).await;
        return Ok(());
    };

    let result = match meta.name {
        "purge" => moderation::purge::run(ctx.clone(), msg, arg1).await,
        "purgeuser" => moderation::purge_user::run(ctx.clone(), msg, arg1, arg_tail).await,
        "purgephrase" => moderation::purge_phrase::run(ctx.clone(), msg, arg1, arg_tail).await,
        "purgeexact" => moderation::purge_exact::run(ctx.clone(), msg, arg1, arg_tail).await,
        "purgeafter" => moderation::purge_after::run(ctx.clone(), msg, arg1, arg_tail).await,
        "purgebefore" => moderation::purge_before::run(ctx.clone(), msg, arg1, arg_tail).await,
        "purgeuntil" => moderation::purge_until::run(ctx.clone(), msg, arg1).await,
        "help" => utility::help::run(ctx.clone(), msg).await,
        _ => Ok(()),
    };

    if let Err(source) = result {
        error!(?source, command = meta.name, "command failed");
        let out = failure_message(meta.name, &format!("{source:#}"));
        log_action(&ctx, &actor, LogLevel::Error, &out, None, true).await;
    }

    Ok(())
}

async fn suggest_command(ctx: &Context, actor: &Actor, entered: &str) {
    let Some(user_id) = actor.user_id else {
        return;
    };

    let prefix = &ctx.config.prefix;
    let known = COMMANDS
        .iter()
        .flat_map(|meta| std::iter::once(meta.name).chain(meta.aliases.iter().copied()));
    let out = match closest_name(entered, known) {
        Some(name) => {
            format!("Unknown command `{prefix}{entered}`. Did you mean `{prefix}{name}`?")
        }
        None => format!("Unknown command `{prefix}{entered}`. Use `{prefix}help` for the list."),
    };

    if let Err(source) = send_direct_text(ctx, user_id, &out).await {
        debug!(?source, user_id = user_id.get(), "command hint DM dropped");
    }
}

pub async fn handle_interaction(
    ctx: Context,
    interaction: Box<InteractionCreate>,
) -> anyhow::Result<()> {
    let Some(InteractionData::ApplicationCommand(data)) = interaction.data.as_ref() else {
        return Ok(());
    };

    let Some(route) = route_interaction(interaction.kind, &data.name) else {
        return Ok(());
    };

    let room = navigation::move_room::room_option(data)
        .unwrap_or_default()
        .to_owned();
    let actor = Actor::from_interaction(&interaction);

    let result = match route {
        InteractionRoute::Move => navigation::move_room::run(ctx.clone(), interaction, &room).await,
        InteractionRoute::MoveAutocomplete => {
            navigation::move_room::autocomplete(ctx.clone(), interaction, &room).await
        }
    };

    if let Err(source) = result {
        error!(?source, ?route, "interaction failed");
        if route == InteractionRoute::Move {
            let out = failure_message("/move", &format!("{source:#}"));
            log_action(&ctx, &actor, LogLevel::Error, &out, None, false).await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_command_and_arguments() {
        assert_eq!(
            split_invocation("!", "  !purgephrase  5 «buy now» "),
            Some(("purgephrase", Some("5"), Some("«buy now»")))
        );
        assert_eq!(split_invocation("!", "!purge"), Some(("purge", None, None)));
        assert_eq!(split_invocation("!", "purge 5"), None);
        assert_eq!(split_invocation("!", "!"), None);
        assert_eq!(
            split_invocation("fl.", "fl.purge 5"),
            Some(("purge", Some("5"), None))
        );
    }

    #[test]
    fn commands_resolve_by_alias_in_any_case() {
        assert_eq!(find_command("PURGE").map(|meta| meta.name), Some("purge"));
        assert_eq!(
            find_command("Очистить").map(|meta| meta.name),
            Some("purge")
        );
        assert_eq!(find_command("помоги").map(|meta| meta.name), Some("help"));
        assert!(find_command("ban").is_none());
    }

    #[test]
    fn command_names_and_aliases_are_unique() {
        let mut names: Vec<&str> = COMMANDS
            .iter()
            .flat_map(|meta| std::iter::once(meta.name).chain(meta.aliases.iter().copied()))
            .collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), total);
    }

    #[test]
    fn routes_only_move_interactions() {
        assert_eq!(
            route_interaction(InteractionType::ApplicationCommand, "move"),
            Some(InteractionRoute::Move)
        );
        assert_eq!(
            route_interaction(InteractionType::ApplicationCommandAutocomplete, "move"),
            Some(InteractionRoute::MoveAutocomplete)
        );
        assert_eq!(
            route_interaction(InteractionType::ApplicationCommand, "ping"),
            None
        );
        assert_eq!(route_interaction(InteractionType::Ping, "move"), None);
    }
}
