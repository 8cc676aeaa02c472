//! Per-member channel access used by room navigation.

use async_trait::async_trait;
use tracing::{error, warn};
use twilight_http::Client;
use twilight_model::{
    guild::Permissions,
    http::permission_overwrite::{PermissionOverwrite, PermissionOverwriteType},
    id::{
        Id,
        marker::{ChannelMarker, UserMarker},
    },
};

/// Read and write access to a room channel.
pub const ROOM_ACCESS: Permissions = Permissions::VIEW_CHANNEL.union(Permissions::SEND_MESSAGES);

#[async_trait]
pub trait ChannelAccess: Send + Sync {
    /// Allow the member to read and write in the channel.
    async fn grant(
        &self,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> anyhow::Result<()>;

    /// Deny the member reading and writing in the channel.
    async fn revoke(
        &self,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl ChannelAccess for Client {
    async fn grant(
        &self,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> anyhow::Result<()> {
        let overwrite = PermissionOverwrite {
            allow: Some(ROOM_ACCESS),
            deny: None,
            id: user_id.cast(),
            kind: PermissionOverwriteType::Member,
        };
        self.update_channel_permission(channel_id, &overwrite).await?;
        Ok(())
    }

    async fn revoke(
        &self,
        channel_id: Id<ChannelMarker>,
        user_id: Id<UserMarker>,
    ) -> anyhow::Result<()> {
        let overwrite = PermissionOverwrite {
            allow: None,
            deny: Some(ROOM_ACCESS),
            id: user_id.cast(),
            kind: PermissionOverwriteType::Member,
        };
        self.update_channel_permission(channel_id, &overwrite).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Nothing changed.
    #[error("could not grant access to the destination: {0}")]
    GrantFailed(#[source] anyhow::Error),
    /// The destination grant was applied, then the source revoke failed.
    #[error("could not revoke access to the source: {source}")]
    RevokeFailed {
        #[source]
        source: anyhow::Error,
        /// Whether the destination grant was rolled back.
        compensated: bool,
    },
}

/// Move a member's access from `from` to `to`.
///
/// Grants first; if the following revoke fails, the grant is revoked again so
/// the member does not end up with access to both channels.
pub async fn transfer_access<A>(
    access: &A,
    user_id: Id<UserMarker>,
    from: Id<ChannelMarker>,
    to: Id<ChannelMarker>,
) -> Result<(), TransferError>
where
    A: ChannelAccess + ?Sized,
{
    access
        .grant(to, user_id)
        .await
        .map_err(TransferError::GrantFailed)?;

    let Err(source) = access.revoke(from, user_id).await else {
        return Ok(());
    };

    warn!(
        ?source,
        user_id = user_id.get(),
        from = from.get(),
        to = to.get(),
        "source revoke failed, rolling back destination grant"
    );

    let compensated = match access.revoke(to, user_id).await {
        Ok(()) => true,
        Err(rollback) => {
            error!(?rollback, to = to.get(), "destination grant rollback failed");
            false
        }
    };

    Err(TransferError::RevokeFailed {
        source,
        compensated,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryAccess;
    use super::*;

    const USER: u64 = 7;
    const HALL: u64 = 100;
    const GARDEN: u64 = 200;

    #[tokio::test]
    async fn transfer_grants_destination_and_revokes_source() {
        let access = MemoryAccess::default();

        transfer_access(&access, Id::new(USER), Id::new(HALL), Id::new(GARDEN))
            .await
            .unwrap();

        assert_eq!(access.access(GARDEN, USER), Some(true));
        assert_eq!(access.access(HALL, USER), Some(false));
        assert_eq!(
            *access.calls.lock().unwrap(),
            vec![("grant", GARDEN), ("revoke", HALL)]
        );
    }

    #[tokio::test]
    async fn failed_grant_changes_nothing() {
        let access = MemoryAccess::default();
        access.failing_grant.lock().unwrap().push(GARDEN);

        let err = transfer_access(&access, Id::new(USER), Id::new(HALL), Id::new(GARDEN))
            .await
            .unwrap_err();

        assert!(matches!(err, TransferError::GrantFailed(_)));
        assert_eq!(access.access(HALL, USER), None);
        assert_eq!(*access.calls.lock().unwrap(), vec![("grant", GARDEN)]);
    }

    #[tokio::test]
    async fn failed_revoke_rolls_back_grant() {
        let access = MemoryAccess::default();
        access.failing_revoke.lock().unwrap().push(HALL);

        let err = transfer_access(&access, Id::new(USER), Id::new(HALL), Id::new(GARDEN))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransferError::RevokeFailed {
                compensated: true,
                ..
            }
        ));
        assert_eq!(access.access(GARDEN, USER), Some(false));
        assert_eq!(
            *access.calls.lock().unwrap(),
            vec![("grant", GARDEN), ("revoke", HALL), ("revoke", GARDEN)]
        );
    }

    #[tokio::test]
    async fn reports_failed_rollback() {
        let access = MemoryAccess::default();
        access.failing_revoke.lock().unwrap().extend([HALL, GARDEN]);

        let err = transfer_access(&access, Id::new(USER), Id::new(HALL), Id::new(GARDEN))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransferError::RevokeFailed {
                compensated: false,
                ..
            }
        ));
        assert_eq!(access.access(GARDEN, USER), Some(true));
    }
}
