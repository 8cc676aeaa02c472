//! Log records: a tracing event plus an embed in the log channel, optionally
//! mirrored to the acting member by direct message.

use tracing::{debug, error, info, warn};
use twilight_model::{
    application::interaction::Interaction,
    channel::{Message, message::embed::Embed},
    guild::PartialMember,
    id::{Id, marker::UserMarker},
    user::User,
};

use fleur_core::Context;
use fleur_utils::embed::{LogLevel, log_embed};
use fleur_utils::time::now_unix_secs;

/// Name used for records the bot emits about itself.
pub const BOT_DISPLAY_NAME: &str = "Fleur";

/// Who performed a logged action.
#[derive(Clone, Debug)]
pub struct Actor {
    /// `None` for the bot itself; such records are never sent by DM.
    pub user_id: Option<Id<UserMarker>>,
    pub display_name: String,
}

impl Actor {
    pub fn bot() -> Self {
        Self {
            user_id: None,
            display_name: BOT_DISPLAY_NAME.to_owned(),
        }
    }

    pub fn from_message(msg: &Message) -> Self {
        Self {
            user_id: Some(msg.author.id),
            display_name: display_name(msg.member.as_ref(), &msg.author),
        }
    }

    pub fn from_interaction(interaction: &Interaction) -> Self {
        match interaction.author() {
            Some(user) => Self {
                user_id: Some(user.id),
                display_name: display_name(interaction.member.as_ref(), user),
            },
            None => Self {
                user_id: None,
                display_name: "unknown".to_owned(),
            },
        }
    }
}

fn display_name(member: Option<&PartialMember>, user: &User) -> String {
    member
        .and_then(|member| member.nick.clone())
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.name.clone())
}

/// Emit a log record. Delivery failures are traced and never returned.
pub async fn log_action(
    ctx: &Context,
    actor: &Actor,
    level: LogLevel,
    description: &str,
    extra: Option<&str>,
    notify_actor: bool,
) {
    let actor_name = actor.display_name.as_str();
    let extra_text = extra.unwrap_or_default();
    match level {
        LogLevel::Success => info!(actor = actor_name, extra = extra_text, "{description}"),
        LogLevel::Warn => warn!(actor = actor_name, extra = extra_text, "{description}"),
        LogLevel::Error => error!(actor = actor_name, extra = extra_text, "{description}"),
    }

    let now = now_unix_secs() as i64;
    let embed = match log_embed(level, description, actor_name, extra, now) {
        Ok(embed) => embed,
        Err(source) => {
            error!(?source, "failed to build log embed");
            return;
        }
    };

    if let Err(source) = ctx
        .http
        .create_message(ctx.config.log_channel_id)
        .embeds(std::slice::from_ref(&embed))
        .await
    {
        error!(?source, level = level.as_str(), "failed to send log record");
    }

    if notify_actor
        && let Some(user_id) = actor.user_id
        && let Err(source) = send_direct_embed(ctx, user_id, &embed).await
    {
        debug!(?source, user_id = user_id.get(), "direct log notice dropped");
    }
}

/// Send an embed to a member's DMs.
pub async fn send_direct_embed(
    ctx: &Context,
    user_id: Id<UserMarker>,
    embed: &Embed,
) -> anyhow::Result<()> {
    let channel = ctx
        .http
        .create_private_channel(user_id)
        .await?
        .model()
        .await?;
    ctx.http
        .create_message(channel.id)
        .embeds(std::slice::from_ref(embed))
        .await?;

    Ok(())
}

/// Send plain text to a member's DMs.
pub async fn send_direct_text(
    ctx: &Context,
    user_id: Id<UserMarker>,
    content: &str,
) -> anyhow::Result<()> {
    let channel = ctx
        .http
        .create_private_channel(user_id)
        .await?
        .model()
        .await?;
    ctx.http.create_message(channel.id).content(content).await?;

    Ok(())
}
