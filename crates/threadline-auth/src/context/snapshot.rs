use threadline_core::error::ThreadlineResult;
use threadline_core::models::feed::Feed;
use threadline_core::models::membership::{FeedMembership, UserFeeds};
use threadline_core::models::user::User;
use threadline_core::repository::{MembershipRepository, UserRepository};
use uuid::Uuid;

use super::{AuthContext, resolve_principal};
use crate::decision::Principal;
use crate::identity::Identity;

/// Client-side context over rows fetched ahead of time.
///
/// Holds the caller's memberships and the feeds they belong to, plus any
/// feeds added with [`SnapshotAuthContext::with_feeds`]. Membership lookups
/// never fail. `can_view` and `can_join` on a feed outside the snapshot
/// fail with `NotFound`; pass the row via [`AuthContext::feed_with`] or add
/// it to the snapshot first.
#[derive(Debug, Clone)]
pub struct SnapshotAuthContext {
    org_id: Uuid,
    principal: Principal,
    memberships: Vec<FeedMembership>,
    feeds: Vec<Feed>,
}

impl SnapshotAuthContext {
    pub fn new(
        org_id: Uuid,
        user: Option<User>,
        memberships: Vec<FeedMembership>,
        feeds: Vec<Feed>,
    ) -> Self {
        Self::with_principal(org_id, user.into(), memberships, feeds)
    }

    pub fn with_principal(
        org_id: Uuid,
        principal: Principal,
        memberships: Vec<FeedMembership>,
        feeds: Vec<Feed>,
    ) -> Self {
        Self {
            org_id,
            principal,
            memberships,
            feeds,
        }
    }

    pub fn from_user_feeds(org_id: Uuid, user: Option<User>, user_feeds: UserFeeds) -> Self {
        Self::new(org_id, user, user_feeds.memberships, user_feeds.feeds)
    }

    pub fn anonymous(org_id: Uuid) -> Self {
        Self::with_principal(org_id, Principal::Anonymous, Vec::new(), Vec::new())
    }

    /// Add feed rows the caller is not a member of, such as feeds being
    /// browsed, so visibility and join checks can be answered for them.
    pub fn with_feeds(mut self, feeds: impl IntoIterator<Item = Feed>) -> Self {
        for feed in feeds {
            if !self.feeds.iter().any(|f| f.id == feed.id) {
                self.feeds.push(feed);
            }
        }
        self
    }

    /// Resolve the caller and fetch everything they belong to in one
    /// bulk query.
    pub async fn load<U: UserRepository, M: MembershipRepository>(
        users: &U,
        memberships: &M,
        org_id: Uuid,
        identity: Option<&Identity>,
    ) -> ThreadlineResult<Self> {
        let principal = resolve_principal(users, org_id, identity).await?;
        let user_feeds = match principal.user() {
            Some(user) => memberships.user_feeds(org_id, user.id).await?,
            None => UserFeeds::default(),
        };
        Ok(Self::with_principal(
            org_id,
            principal,
            user_feeds.memberships,
            user_feeds.feeds,
        ))
    }
}

impl AuthContext for SnapshotAuthContext {
    fn org_id(&self) -> Uuid {
        self.org_id
    }

    fn principal(&self) -> &Principal {
        &self.principal
    }

    async fn load_membership(&self, feed_id: Uuid) -> ThreadlineResult<Option<FeedMembership>> {
        let Some(user) = self.principal.user() else {
            return Ok(None);
        };
        Ok(self
            .memberships
            .iter()
            .find(|m| m.feed_id == feed_id && m.user_id == user.id)
            .cloned())
    }

    async fn load_feed(&self, feed_id: Uuid) -> ThreadlineResult<Option<Feed>> {
        Ok(self.feeds.iter().find(|f| f.id == feed_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use threadline_core::models::feed::{FeedCapability, FeedPrivacy};
    use threadline_core::models::membership::FeedRole;

    use crate::permission::DenialReason;

    fn fixture(owner: bool, perms: Vec<FeedCapability>) -> (SnapshotAuthContext, Uuid) {
        let now = Utc::now();
        let org_id = Uuid::new_v4();
        let user = User {
            id: Uuid::new_v4(),
            org_id,
            identity_key: "idp|snap".into(),
            name: "Snap".into(),
            email: "snap@example.com".into(),
            role: None,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        };
        let feed = Feed {
            id: Uuid::new_v4(),
            org_id,
            name: "Snapshots".into(),
            description: None,
            privacy: FeedPrivacy::Private,
            member_permissions: perms,
            created_at: now,
            updated_at: now,
        };
        let membership = FeedMembership {
            id: Uuid::new_v4(),
            org_id,
            feed_id: feed.id,
            user_id: user.id,
            owner,
            created_at: now,
            updated_at: now,
        };
        let feed_id = feed.id;
        (
            SnapshotAuthContext::new(org_id, Some(user), vec![membership], vec![feed]),
            feed_id,
        )
    }

    #[tokio::test]
    async fn owner_of_private_feed_may_message() {
        let (ctx, feed_id) = fixture(true, vec![]);
        let feed = ctx.feed(feed_id);
        assert!(feed.has_role(FeedRole::Owner).await.unwrap().is_allowed());
        assert!(feed.can_message().await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn member_without_message_permission_is_denied() {
        let (ctx, feed_id) = fixture(false, vec![FeedCapability::Post]);
        let feed = ctx.feed(feed_id);
        assert!(feed.can_post().await.unwrap().is_allowed());
        assert_eq!(
            feed.can_message().await.unwrap().reason(),
            Some(DenialReason::MissingPermission)
        );
    }

    #[tokio::test]
    async fn feed_outside_snapshot_has_no_membership() {
        let (ctx, _) = fixture(true, vec![]);
        let result = ctx.feed(Uuid::new_v4()).has_role(FeedRole::Member).await.unwrap();
        assert_eq!(result.reason(), Some(DenialReason::NotFeedMember));
    }

    #[tokio::test]
    async fn anonymous_snapshot_is_unauthenticated() {
        let ctx = SnapshotAuthContext::anonymous(Uuid::new_v4());
        assert!(ctx.user().is_none());
        assert!(matches!(
            ctx.user_or_err(),
            Err(crate::AuthError::PermissionDenied(DenialReason::Unauthenticated))
        ));
        let result = ctx.feed(Uuid::new_v4()).can_post().await.unwrap();
        assert_eq!(result.reason(), Some(DenialReason::Unauthenticated));
    }
}
