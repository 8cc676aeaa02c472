use tracing::error;
use twilight_model::{
    application::{
        command::{Command, CommandType},
        interaction::application_command::{CommandData, CommandOptionValue},
    },
    gateway::payload::incoming::InteractionCreate,
    id::{
        Id,
        marker::{ChannelMarker, GuildMarker, UserMarker},
    },
};
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

use crate::CommandMeta;
use crate::log::{Actor, log_action};
use fleur_core::{Context, RoomMode};
use fleur_utils::access::{TransferError, transfer_access};
use fleur_utils::embed::LogLevel;
use fleur_utils::history::read_feed;
use fleur_utils::interaction::{
    complete_deferred, defer_ephemeral, respond_autocomplete, respond_ephemeral_message,
};
use fleur_utils::link::message_jump_url;
use fleur_utils::navigation::{
    MovePlan, MoveRefusal, RoomChannel, destination_suggestions, plan_move,
};
use fleur_utils::rooms::feed_lines;

pub const META: CommandMeta = CommandMeta {
    name: "move",
    aliases: &[],
    desc: "Move to another room.",
    category: "navigation",
    usage: "/move <room>",
};

/// Name of the single string option.
pub const ROOM_OPTION: &str = "room";

/// Slash command definition registered on startup.
pub fn command() -> anyhow::Result<Command> {
    let command = CommandBuilder::new(META.name, META.desc, CommandType::ChatInput)
        .option(
            StringBuilder::new(ROOM_OPTION, "Destination room")
                .required(true)
                .autocomplete(true),
        )
        .validate()?
        .build();

    Ok(command)
}

/// Value of the `room` option, typed or focused.
pub fn room_option(data: &CommandData) -> Option<&str> {
    data.options
        .iter()
        .find(|option| option.name == ROOM_OPTION)
        .and_then(|option| match &option.value {
            CommandOptionValue::String(value) => Some(value.as_str()),
            CommandOptionValue::Focused(value, _) => Some(value.as_str()),
            _ => None,
        })
}

async fn fetch_room_channel(
    ctx: &Context,
    channel_id: Id<ChannelMarker>,
) -> anyhow::Result<Option<RoomChannel>> {
    let channel = ctx.http.channel(channel_id).await?.model().await?;
    Ok(RoomChannel::from_channel(&channel))
}

async fn fetch_feed_lines(ctx: &Context) -> anyhow::Result<Vec<String>> {
    let contents = read_feed(
        ctx.http.as_ref(),
        ctx.config.rooms_channel_id,
        ctx.config.history_scan_limit,
    )
    .await?;

    Ok(feed_lines(contents))
}

/// Where an attempted move ended.
#[derive(Debug)]
pub enum MoveStep {
    Refused(MoveRefusal),
    TransferFailed(TransferError),
    Moved(MovePlan),
}

/// Private reply shown to the member once the deferred response resolves.
///
/// Every outcome, including a lookup failure, answers the member.
pub fn move_reply(step: &anyhow::Result<MoveStep>) -> String {
    match step {
        Ok(MoveStep::Moved(plan)) => format!("You moved to <#{}>.", plan.to.id.get()),
        Ok(MoveStep::Refused(refusal)) => refusal.notice(),
        Ok(MoveStep::TransferFailed(_)) => "Could not change permissions.".to_owned(),
        Err(_) => "Something went wrong while moving, please try again.".to_owned(),
    }
}

/// Move the invoking member to the requested room.
///
/// The interaction is deferred first: the rooms feed read may take longer
/// than the initial response window.
pub async fn run(
    ctx: Context,
    interaction: Box<InteractionCreate>,
    requested: &str,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    let actor = Actor::from_interaction(&interaction);

    let (Some(guild_id), Some(user_id)) = (interaction.guild_id, actor.user_id) else {
        respond_ephemeral_message(http, &interaction, "This command only works in servers.")
            .await?;
        return Ok(());
    };

    defer_ephemeral(http, &interaction).await?;

    let step = attempt_move(&ctx, &interaction, guild_id, user_id, requested).await;
    if let Err(source) = complete_deferred(http, &interaction, &move_reply(&step)).await {
        error!(?source, "could not answer /move");
    }

    match step {
        Ok(MoveStep::Moved(plan)) => announce_move(&ctx, &actor, guild_id, &plan).await,
        Ok(MoveStep::Refused(refusal)) => {
            let description = refusal.log_description();
            log_action(&ctx, &actor, LogLevel::Warn, &description, None, false).await;
        }
        Ok(MoveStep::TransferFailed(failure)) => {
            error!(?failure, user_id = user_id.get(), "room transfer failed");
            let detail = failure.to_string();
            log_action(
                &ctx,
                &actor,
                LogLevel::Error,
                "could not change room permissions",
                Some(&detail),
                false,
            )
            .await;
        }
        Err(source) => {
            error!(?source, "move lookup failed");
            let detail = format!("{source:#}");
            log_action(&ctx, &actor, LogLevel::Error, "move failed", Some(&detail), false).await;
        }
    }

    Ok(())
}

async fn attempt_move(
    ctx: &Context,
    interaction: &InteractionCreate,
    guild_id: Id<GuildMarker>,
    user_id: Id<UserMarker>,
    requested: &str,
) -> anyhow::Result<MoveStep> {
    let http = &ctx.http;

    let source = match interaction.channel.as_ref() {
        Some(channel) => fetch_room_channel(ctx, channel.id).await?,
        None => None,
    };
    let Some(source) = source else {
        return Ok(MoveStep::Refused(MoveRefusal::OutsideCategory));
    };

    let lines = fetch_feed_lines(ctx).await?;
    let guild_channels: Vec<RoomChannel> = http
        .guild_channels(guild_id)
        .await?
        .model()
        .await?
        .iter()
        .filter_map(RoomChannel::from_channel)
        .collect();

    let plan = match plan_move(
        ctx.config.room_mode,
        ctx.config.allowed_category_id,
        &source,
        &lines,
        requested,
        &guild_channels,
    ) {
        Ok(plan) => plan,
        Err(refusal) => return Ok(MoveStep::Refused(refusal)),
    };

    match transfer_access(http.as_ref(), user_id, plan.from.id, plan.to.id).await {
        Ok(()) => Ok(MoveStep::Moved(plan)),
        Err(failure) => Ok(MoveStep::TransferFailed(failure)),
    }
}

/// Public notes in the rooms involved, then the success record. The member
/// already holds the new access, so failures here are only traced.
async fn announce_move(ctx: &Context, actor: &Actor, guild_id: Id<GuildMarker>, plan: &MovePlan) {
    let http = &ctx.http;

    let departure = format!("{} went to <#{}>", actor.display_name, plan.to.id.get());
    let link = match http.create_message(plan.from.id).content(&departure).await {
        Ok(response) => match response.model().await {
            Ok(message) => format!(
                " [link]({})",
                message_jump_url(guild_id, message.channel_id, message.id)
            ),
            Err(source) => {
                error!(?source, "could not read move announcement");
                String::new()
            }
        },
        Err(source) => {
            error!(?source, channel_id = plan.from.id.get(), "move announcement failed");
            String::new()
        }
    };

    if ctx.config.room_mode == RoomMode::Graph {
        let arrival = format!("{} arrived from <#{}>", actor.display_name, plan.from.id.get());
        if let Err(source) = http.create_message(plan.to.id).content(&arrival).await {
            error!(?source, channel_id = plan.to.id.get(), "arrival announcement failed");
        }
    }

    let extra = format!("<#{}> → <#{}>{link}", plan.from.id.get(), plan.to.id.get());
    log_action(ctx, actor, LogLevel::Success, "moved", Some(&extra), false).await;
}

/// Offer room names matching what the member typed so far. Lookup failures
/// answer with an empty list.
pub async fn autocomplete(
    ctx: Context,
    interaction: Box<InteractionCreate>,
    typed: &str,
) -> anyhow::Result<()> {
    let names = match suggestions(&ctx, &interaction, typed).await {
        Ok(names) => names,
        Err(source) => {
            error!(?source, "room autocomplete lookup failed");
            Vec::new()
        }
    };

    respond_autocomplete(&ctx.http, &interaction, names).await
}

async fn suggestions(
    ctx: &Context,
    interaction: &InteractionCreate,
    typed: &str,
) -> anyhow::Result<Vec<String>> {
    let current_room = match (ctx.config.room_mode, interaction.channel.as_ref()) {
        (RoomMode::Graph, Some(channel)) => fetch_room_channel(ctx, channel.id)
            .await?
            .map(|room| room.name),
        _ => None,
    };

    let lines = fetch_feed_lines(ctx).await?;
    Ok(destination_suggestions(
        ctx.config.room_mode,
        &lines,
        current_room.as_deref(),
        typed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_has_autocompleted_room_option() {
        let command = command().unwrap();

        assert_eq!(command.name, "move");
        assert_eq!(command.options.len(), 1);
        assert_eq!(command.options[0].name, ROOM_OPTION);
        assert_eq!(command.options[0].autocomplete, Some(true));
        assert_eq!(command.options[0].required, Some(true));
    }

    fn room(id: u64, name: &str) -> RoomChannel {
        RoomChannel {
            id: Id::new(id),
            name: name.to_owned(),
            parent_id: Some(Id::new(500)),
        }
    }

    #[test]
    fn every_outcome_answers_the_member() {
        let moved = Ok(MoveStep::Moved(MovePlan {
            from: room(1, "hall"),
            to: room(2, "garden"),
        }));
        assert_eq!(move_reply(&moved), "You moved to <#2>.");

        let refused = Ok(MoveStep::Refused(MoveRefusal::OutsideCategory));
        assert_eq!(
            move_reply(&refused),
            MoveRefusal::OutsideCategory.notice()
        );

        let failed_transfer = Ok(MoveStep::TransferFailed(TransferError::GrantFailed(
            anyhow::anyhow!("missing access"),
        )));
        assert_eq!(move_reply(&failed_transfer), "Could not change permissions.");

        let lookup_failed: anyhow::Result<MoveStep> = Err(anyhow::anyhow!("feed unavailable"));
        assert!(!move_reply(&lookup_failed).is_empty());
    }
}
