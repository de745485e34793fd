use threadline_core::error::{ThreadlineError, ThreadlineResult};
use threadline_core::models::feed::Feed;
use threadline_core::models::membership::FeedMembership;
use threadline_core::repository::{FeedRepository, MembershipRepository, UserRepository};
use uuid::Uuid;

use super::{AuthContext, resolve_principal};
use crate::decision::Principal;
use crate::identity::Identity;

/// Server-side context: resolves the caller once, then queries the
/// repositories for every feed-scoped check.
pub struct RequestAuthContext<'r, F, M> {
    feeds: &'r F,
    memberships: &'r M,
    org_id: Uuid,
    principal: Principal,
}

impl<'r, F: FeedRepository, M: MembershipRepository> RequestAuthContext<'r, F, M> {
    /// Build a context for one request. An identity without a user row in
    /// `org_id` becomes [`Principal::Unregistered`] rather than an error.
    pub async fn load<U: UserRepository>(
        users: &U,
        feeds: &'r F,
        memberships: &'r M,
        org_id: Uuid,
        identity: Option<&Identity>,
    ) -> ThreadlineResult<Self> {
        let principal = resolve_principal(users, org_id, identity).await?;
        Ok(Self::with_principal(feeds, memberships, org_id, principal))
    }

    pub fn with_principal(
        feeds: &'r F,
        memberships: &'r M,
        org_id: Uuid,
        principal: Principal,
    ) -> Self {
        Self {
            feeds,
            memberships,
            org_id,
            principal,
        }
    }
}

impl<F: FeedRepository, M: MembershipRepository> AuthContext for RequestAuthContext<'_, F, M> {
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
        self.memberships.get(self.org_id, feed_id, user.id).await
    }

    async fn load_feed(&self, feed_id: Uuid) -> ThreadlineResult<Option<Feed>> {
        match self.feeds.get_by_id(self.org_id, feed_id).await {
            Ok(feed) => Ok(Some(feed)),
            Err(ThreadlineError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
