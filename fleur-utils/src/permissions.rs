use twilight_http::Client;
use twilight_model::{
    channel::{ChannelType, permission_overwrite::PermissionOverwrite},
    gateway::payload::incoming::MessageCreate,
    guild::Permissions,
    id::{
        Id,
        marker::{GuildMarker, RoleMarker, UserMarker},
    },
};
use twilight_util::permission_calculator::PermissionCalculator;

/// Whether any of the member's roles is on the allow list.
pub fn has_allowed_role(member_roles: &[Id<RoleMarker>], allowed: &[Id<RoleMarker>]) -> bool {
    member_roles.iter().any(|role| allowed.contains(role))
}

/// Resolve the invoking author's role ids for a message command.
///
/// Returns `Ok(None)` when the message is not from a guild context.
pub async fn resolve_message_author_roles(
    http: &Client,
    msg: &MessageCreate,
) -> anyhow::Result<Option<Vec<Id<RoleMarker>>>> {
    if let Some(member) = msg.member.as_ref() {
        return Ok(Some(member.roles.clone()));
    }

    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };

    let member = http
        .guild_member(guild_id, msg.author.id)
        .await?
        .model()
        .await?;

    Ok(Some(member.roles))
}

/// Effective permissions of the message author in the message's channel,
/// role grants and channel overwrites applied.
///
/// Returns `Ok(None)` when the message is not from a guild context.
pub async fn resolve_message_channel_permissions(
    http: &Client,
    msg: &MessageCreate,
) -> anyhow::Result<Option<Permissions>> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(None);
    };
    let Some(member_roles) = resolve_message_author_roles(http, msg).await? else {
        return Ok(None);
    };

    let guild = http.guild(guild_id).await?.model().await?;
    let everyone_id = guild_id.cast::<RoleMarker>();
    let everyone = guild
        .roles
        .iter()
        .find(|role| role.id == everyone_id)
        .map_or(Permissions::empty(), |role| role.permissions);
    let roles: Vec<(Id<RoleMarker>, Permissions)> = guild
        .roles
        .iter()
        .filter(|role| member_roles.contains(&role.id))
        .map(|role| (role.id, role.permissions))
        .collect();

    let channel = http.channel(msg.channel_id).await?.model().await?;
    let overwrites = channel.permission_overwrites.unwrap_or_default();

    let member = MemberGrants {
        guild_id,
        user_id: msg.author.id,
        owner_id: guild.owner_id,
        everyone,
        roles: &roles,
    };
    Ok(Some(member.in_channel(channel.kind, &overwrites)))
}

/// What a member holds at guild level, before channel overwrites.
pub struct MemberGrants<'a> {
    pub guild_id: Id<GuildMarker>,
    pub user_id: Id<UserMarker>,
    pub owner_id: Id<UserMarker>,
    /// Permissions of the `@everyone` role.
    pub everyone: Permissions,
    pub roles: &'a [(Id<RoleMarker>, Permissions)],
}

impl MemberGrants<'_> {
    /// Effective permissions in a channel of `kind` with `overwrites` applied.
    /// The guild owner holds every permission.
    pub fn in_channel(&self, kind: ChannelType, overwrites: &[PermissionOverwrite]) -> Permissions {
        if self.user_id == self.owner_id {
            return Permissions::all();
        }

        PermissionCalculator::new(self.guild_id, self.user_id, self.everyone, self.roles)
            .in_channel(kind, overwrites)
    }
}

/// Check whether the message author holds `required` in the message's channel.
///
/// Returns `Ok(false)` when the message is outside a guild context.
pub async fn has_message_permission(
    http: &Client,
    msg: &MessageCreate,
    required: Permissions,
) -> anyhow::Result<bool> {
    let Some(perms) = resolve_message_channel_permissions(http, msg).await? else {
        return Ok(false);
    };

    Ok(perms.contains(Permissions::ADMINISTRATOR) || perms.contains(required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use twilight_model::channel::permission_overwrite::PermissionOverwriteType;

    const MEMBER: u64 = 7;
    const MODERATOR_ROLE: u64 = 20;

    fn base() -> Permissions {
        Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES | Permissions::READ_MESSAGE_HISTORY
    }

    fn moderator<'a>(roles: &'a [(Id<RoleMarker>, Permissions)]) -> MemberGrants<'a> {
        MemberGrants {
            guild_id: Id::new(1),
            user_id: Id::new(MEMBER),
            owner_id: Id::new(2),
            everyone: base(),
            roles,
        }
    }

    #[test]
    fn role_grant_applies_in_plain_channel() {
        let roles = [(Id::new(MODERATOR_ROLE), Permissions::MANAGE_MESSAGES)];

        let perms = moderator(&roles).in_channel(ChannelType::GuildText, &[]);
        assert!(perms.contains(Permissions::MANAGE_MESSAGES));
    }

    #[test]
    fn member_overwrite_denies_in_that_channel() {
        let roles = [(Id::new(MODERATOR_ROLE), Permissions::MANAGE_MESSAGES)];
        let overwrites = [PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::MANAGE_MESSAGES,
            id: Id::new(MEMBER),
            kind: PermissionOverwriteType::Member,
        }];

        let perms = moderator(&roles).in_channel(ChannelType::GuildText, &overwrites);
        assert!(!perms.contains(Permissions::MANAGE_MESSAGES));
        assert!(perms.contains(Permissions::VIEW_CHANNEL));
    }

    #[test]
    fn owner_holds_everything() {
        let grants = MemberGrants {
            owner_id: Id::new(MEMBER),
            ..moderator(&[])
        };

        let perms = grants.in_channel(ChannelType::GuildText, &[]);
        assert!(perms.contains(Permissions::MANAGE_MESSAGES));
    }

    #[test]
    fn any_allowed_role_is_enough() {
        let allowed = [Id::new(1), Id::new(2)];

        assert!(has_allowed_role(&[Id::new(9), Id::new(2)], &allowed));
        assert!(!has_allowed_role(&[Id::new(9)], &allowed));
        assert!(!has_allowed_role(&[], &allowed));
    }
}
