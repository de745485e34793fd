//! Authorization contexts.
//!
//! [`AuthContext`] is implemented by two adapters that differ only in where
//! their data comes from:
//!
//! - [`RequestAuthContext`] queries the repositories on every feed check.
//! - [`SnapshotAuthContext`] answers from rows fetched up front.
//!
//! All decision methods are provided by the trait and by [`FeedAuth`], and
//! both delegate to [`crate::decision`], so the two adapters agree on every
//! result given the same data. A check that needs a feed row the context
//! does not have fails with `NotFound` instead of returning a decision.

mod request;
mod snapshot;

pub use request::RequestAuthContext;
pub use snapshot::SnapshotAuthContext;

use threadline_core::error::{ThreadlineError, ThreadlineResult};
use threadline_core::models::feed::{Feed, FeedCapability, FeedPrivacy};
use threadline_core::models::membership::{FeedMembership, FeedRole};
use threadline_core::models::user::{OrgRole, User};
use threadline_core::repository::UserRepository;
use tracing::debug;
use uuid::Uuid;

use crate::decision::{self, Principal};
use crate::error::AuthError;
use crate::identity::Identity;
use crate::permission::PermissionResult;

pub trait AuthContext: Send + Sync {
    /// The organization this context was resolved for.
    fn org_id(&self) -> Uuid;

    fn principal(&self) -> &Principal;

    /// The caller's membership in `feed_id`. Only called for an active user.
    fn load_membership(
        &self,
        feed_id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<Option<FeedMembership>>> + Send;

    /// The feed row, or `None` if it is not known to this context.
    fn load_feed(&self, feed_id: Uuid)
    -> impl Future<Output = ThreadlineResult<Option<Feed>>> + Send;

    fn user(&self) -> Option<&User> {
        self.principal().user()
    }

    /// The active user, or the reason there isn't one.
    fn user_or_err(&self) -> Result<&User, AuthError> {
        decision::active_user(self.principal()).map_err(AuthError::PermissionDenied)
    }

    /// Organization role check (exact match).
    fn has_role(&self, role: OrgRole) -> PermissionResult {
        decision::check_user_role(self.principal(), role)
    }

    /// Checks scoped to one feed.
    fn feed(&self, feed_id: Uuid) -> FeedAuth<'_, Self> {
        FeedAuth {
            ctx: self,
            feed_id,
            prefetched: None,
        }
    }

    /// Like [`AuthContext::feed`] but with the feed row already in hand,
    /// so no feed lookup is made.
    fn feed_with<'a>(&'a self, feed: &'a Feed) -> FeedAuth<'a, Self> {
        FeedAuth {
            ctx: self,
            feed_id: feed.id,
            prefetched: Some(feed),
        }
    }
}

/// Resolve who is calling from an optional verified identity.
pub async fn resolve_principal<U: UserRepository>(
    users: &U,
    org_id: Uuid,
    identity: Option<&Identity>,
) -> ThreadlineResult<Principal> {
    let Some(identity) = identity else {
        return Ok(Principal::Anonymous);
    };
    match users.get_by_identity(org_id, &identity.key).await {
        Ok(user) => Ok(Principal::User(user)),
        Err(ThreadlineError::NotFound { .. }) => {
            debug!(
                %org_id,
                identity_key = %identity.key,
                "identity has no user in organization"
            );
            Ok(Principal::Unregistered {
                identity_key: identity.key.clone(),
            })
        }
        Err(e) => Err(e),
    }
}

/// Feed-scoped view of an [`AuthContext`].
///
/// Each call loads the membership afresh; the feed row is loaded only when
/// the decision depends on it and was not supplied via
/// [`AuthContext::feed_with`].
pub struct FeedAuth<'a, A: ?Sized> {
    ctx: &'a A,
    feed_id: Uuid,
    prefetched: Option<&'a Feed>,
}

impl<A: AuthContext + ?Sized> FeedAuth<'_, A> {
    pub fn feed_id(&self) -> Uuid {
        self.feed_id
    }

    /// The caller's membership, skipping the lookup for callers that
    /// cannot hold one.
    pub async fn membership(&self) -> ThreadlineResult<Option<FeedMembership>> {
        if decision::active_user(self.ctx.principal()).is_err() {
            return Ok(None);
        }
        self.ctx.load_membership(self.feed_id).await
    }

    async fn load_feed(&self) -> ThreadlineResult<Option<Feed>> {
        match self.prefetched {
            Some(feed) => Ok(Some(feed.clone())),
            None => self.ctx.load_feed(self.feed_id).await,
        }
    }

    pub async fn has_role(&self, role: FeedRole) -> ThreadlineResult<PermissionResult> {
        let membership = self.membership().await?;
        let result = decision::feed_role(self.ctx.principal(), membership.as_ref(), role);
        Ok(self.traced("has_role", result))
    }

    pub async fn can(&self, capability: FeedCapability) -> ThreadlineResult<PermissionResult> {
        let membership = self.membership().await?;
        let feed = match &membership {
            Some(m) if !m.owner => self.load_feed().await?,
            _ => None,
        };
        let result = decision::feed_capability(
            self.ctx.principal(),
            membership.as_ref(),
            feed.as_ref(),
            capability,
        );
        Ok(self.traced(capability.as_str(), result))
    }

    pub async fn can_post(&self) -> ThreadlineResult<PermissionResult> {
        self.can(FeedCapability::Post).await
    }

    pub async fn can_message(&self) -> ThreadlineResult<PermissionResult> {
        self.can(FeedCapability::Message).await
    }

    /// The feed row, which privacy-based checks cannot decide without.
    ///
    /// A feed this context cannot see (deleted, or outside a snapshot) is
    /// `NotFound` rather than being judged as private.
    async fn require_feed(&self) -> ThreadlineResult<Feed> {
        self.load_feed()
            .await?
            .ok_or_else(|| ThreadlineError::NotFound {
                entity: "feed".into(),
                id: self.feed_id.to_string(),
            })
    }

    /// Whether the caller may see the feed. Membership is only looked up
    /// for private feeds.
    pub async fn can_view(&self) -> ThreadlineResult<PermissionResult> {
        let principal = self.ctx.principal();
        if principal.user().is_some_and(User::is_deactivated) {
            let result = decision::feed_visibility(principal, None, None);
            return Ok(self.traced("view", result));
        }

        let feed = self.require_feed().await?;
        let membership = match feed.privacy {
            FeedPrivacy::Public | FeedPrivacy::Open => None,
            FeedPrivacy::Private => self.membership().await?,
        };
        let result = decision::feed_visibility(principal, membership.as_ref(), Some(&feed));
        Ok(self.traced("view", result))
    }

    pub async fn can_join(&self) -> ThreadlineResult<PermissionResult> {
        let principal = self.ctx.principal();
        if decision::active_user(principal).is_err() {
            return Ok(self.traced("join", decision::feed_join(principal, None)));
        }

        let feed = self.require_feed().await?;
        let result = decision::feed_join(principal, Some(&feed));
        Ok(self.traced("join", result))
    }

    fn traced(&self, check: &'static str, result: PermissionResult) -> PermissionResult {
        if let Some(reason) = result.reason() {
            debug!(
                org_id = %self.ctx.org_id(),
                feed_id = %self.feed_id,
                check,
                reason = reason.code(),
                "feed permission denied"
            );
        }
        result
    }
}
