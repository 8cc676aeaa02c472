use tokio::time::{Duration, sleep};
use tracing::debug;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::log::send_direct_embed;
use crate::{COMMANDS, CommandMeta, SLASH_COMMANDS};
use fleur_core::Context;
use fleur_utils::embed::help_embed;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    aliases: &["помощь", "помоги"],
    desc: "Send the list of commands by direct message.",
    category: "utility",
    usage: "help",
};

/// How long the "check your DMs" fallback notice stays in the channel.
const NOTICE_LIFETIME_SECS: u64 = 10;

/// One embed field per command: `!name (aliases)` and its usage and description.
/// Slash commands follow the prefix commands.
pub fn help_entries(prefix: &str) -> Vec<(String, String)> {
    let mut commands: Vec<&CommandMeta> = COMMANDS.iter().collect();
    commands.sort_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });

    commands
        .into_iter()
        .map(|meta| {
            let mut name = format!("{prefix}{}", meta.name);
            if !meta.aliases.is_empty() {
                let aliases = meta
                    .aliases
                    .iter()
                    .map(|alias| format!("{prefix}{alias}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                name.push_str(&format!(" ({aliases})"));
            }
            let value = format!("`{}`\n{}", meta.usage_with(prefix), meta.desc);
            (name, value)
        })
        .chain(SLASH_COMMANDS.iter().map(|meta| {
            let value = format!("`{}`\n{}", meta.usage, meta.desc);
            (format!("/{}", meta.name), value)
        }))
        .collect()
}

pub async fn run(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let _ = http.delete_message(msg.channel_id, msg.id).await;

    let entries = help_entries(&ctx.config.prefix);
    let embed = help_embed(
        "Fleur commands",
        "Moderation commands need an allowed role and Manage Messages.",
        entries.iter().map(|(name, value)| (name.clone(), value.as_str())),
    )?;

    let Err(source) = send_direct_embed(&ctx, msg.author.id, &embed).await else {
        return Ok(());
    };
    debug!(?source, user_id = msg.author.id.get(), "help DM failed");

    let notice = format!(
        "<@{}>, I could not send you a direct message. Please enable DMs from server members.",
        msg.author.id.get()
    );
    let notice_message = http
        .create_message(msg.channel_id)
        .content(&notice)
        .await?
        .model()
        .await?;

    sleep(Duration::from_secs(NOTICE_LIFETIME_SECS)).await;
    let _ = http.delete_message(msg.channel_id, notice_message.id).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_cover_every_command_with_prefix() {
        let entries = help_entries("!");

        assert_eq!(entries.len(), COMMANDS.len() + SLASH_COMMANDS.len());
        assert_eq!(
            entries.iter().filter(|(name, _)| name.starts_with('!')).count(),
            COMMANDS.len()
        );

        let (name, value) = entries
            .iter()
            .find(|(name, _)| name.starts_with("!purge "))
            .unwrap();
        assert_eq!(name, "!purge (!очистить)");
        assert!(value.starts_with("`!purge <N>`"));
    }

    #[test]
    fn slash_commands_come_last_without_prefix() {
        let entries = help_entries("?");
        let (name, value) = entries.last().unwrap();

        assert_eq!(name, "/move");
        assert!(value.starts_with("`/move <room>`"));
        assert!(entries[entries.len() - 2].0.starts_with("?help"));
    }
}
