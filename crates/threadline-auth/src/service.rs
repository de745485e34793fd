//! Feed service: feed lifecycle and membership management, gated by the
//! caller's authorization context.

use threadline_core::error::{ThreadlineError, ThreadlineResult};
use threadline_core::models::feed::{CreateFeed, Feed, UpdateFeed};
use threadline_core::models::membership::{CreateMembership, FeedMembership, FeedRole};
use threadline_core::repository::{FeedRepository, MembershipRepository, UserRepository};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::context::{AuthContext, RequestAuthContext};
use crate::identity::Identity;
use crate::ownership::is_last_owner;

/// Feed service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct FeedService<F: FeedRepository, M: MembershipRepository> {
    feed_repo: F,
    membership_repo: M,
}

impl<F: FeedRepository, M: MembershipRepository> FeedService<F, M> {
    pub fn new(feed_repo: F, membership_repo: M) -> Self {
        Self {
            feed_repo,
            membership_repo,
        }
    }

    pub fn feeds(&self) -> &F {
        &self.feed_repo
    }

    pub fn memberships(&self) -> &M {
        &self.membership_repo
    }

    /// Build a request context over this service's repositories.
    pub async fn authorize<U: UserRepository>(
        &self,
        users: &U,
        org_id: Uuid,
        identity: Option<&Identity>,
    ) -> ThreadlineResult<RequestAuthContext<'_, F, M>> {
        RequestAuthContext::load(
            users,
            &self.feed_repo,
            &self.membership_repo,
            org_id,
            identity,
        )
        .await
    }

    /// Create a feed. Any active user may; the creator becomes its first
    /// owner.
    pub async fn create_feed<A: AuthContext>(
        &self,
        auth: &A,
        input: CreateFeed,
    ) -> ThreadlineResult<Feed> {
        let user = auth.user_or_err()?;
        if input.org_id != auth.org_id() {
            return Err(ThreadlineError::TenantContext);
        }
        validate_name(&input.name)?;

        let feed = self.feed_repo.create(input).await?;

        let owner = CreateMembership {
            org_id: feed.org_id,
            feed_id: feed.id,
            user_id: user.id,
            owner: true,
        };
        if let Err(e) = self.membership_repo.add(owner).await {
            // Do not leave an ownerless feed behind.
            if let Err(rollback) = self.feed_repo.delete(feed.org_id, feed.id).await {
                error!(
                    org_id = %feed.org_id,
                    feed_id = %feed.id,
                    error = %rollback,
                    "failed to delete feed after owner membership could not be added"
                );
            }
            return Err(e);
        }

        info!(org_id = %feed.org_id, feed_id = %feed.id, user_id = %user.id, "feed created");
        Ok(feed)
    }

    pub async fn update_feed<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
        input: UpdateFeed,
    ) -> ThreadlineResult<Feed> {
        auth.feed(feed_id)
            .has_role(FeedRole::Owner)
            .await?
            .ensure_permitted()?;
        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        self.feed_repo.update(auth.org_id(), feed_id, input).await
    }

    /// Delete a feed and all of its memberships.
    pub async fn delete_feed<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
    ) -> ThreadlineResult<()> {
        auth.feed(feed_id)
            .has_role(FeedRole::Owner)
            .await?
            .ensure_permitted()?;
        self.feed_repo.delete(auth.org_id(), feed_id).await?;
        info!(org_id = %auth.org_id(), %feed_id, "feed deleted");
        Ok(())
    }

    /// Join a public or open feed. Returns the existing membership if the
    /// caller already belongs to the feed.
    pub async fn join_feed<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
    ) -> ThreadlineResult<FeedMembership> {
        let feed = auth.feed(feed_id);

        // 1. Already a member: nothing to do.
        if let Some(existing) = feed.membership().await? {
            return Ok(existing);
        }

        // 2. Private feeds need an invitation from an owner.
        feed.can_join().await?.ensure_permitted()?;
        let user = auth.user_or_err()?;

        self.membership_repo
            .add(CreateMembership {
                org_id: auth.org_id(),
                feed_id,
                user_id: user.id,
                owner: false,
            })
            .await
    }

    /// Add another user to the feed (owners only).
    pub async fn add_member<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
        user_id: Uuid,
        owner: bool,
    ) -> ThreadlineResult<FeedMembership> {
        auth.feed(feed_id)
            .has_role(FeedRole::Owner)
            .await?
            .ensure_permitted()?;
        self.membership_repo
            .add(CreateMembership {
                org_id: auth.org_id(),
                feed_id,
                user_id,
                owner,
            })
            .await
    }

    /// Promote a member to owner or demote an owner to member.
    pub async fn set_member_role<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
        user_id: Uuid,
        role: FeedRole,
    ) -> ThreadlineResult<FeedMembership> {
        auth.feed(feed_id)
            .has_role(FeedRole::Owner)
            .await?
            .ensure_permitted()?;
        if role == FeedRole::Member {
            self.guard_last_owner(auth.org_id(), feed_id, user_id).await?;
        }
        self.membership_repo
            .set_owner(auth.org_id(), feed_id, user_id, role == FeedRole::Owner)
            .await
    }

    pub async fn remove_member<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
        user_id: Uuid,
    ) -> ThreadlineResult<()> {
        auth.feed(feed_id)
            .has_role(FeedRole::Owner)
            .await?
            .ensure_permitted()?;
        self.guard_last_owner(auth.org_id(), feed_id, user_id).await?;
        self.membership_repo
            .remove(auth.org_id(), feed_id, user_id)
            .await
    }

    /// Leave a feed. The last owner must hand over ownership first.
    pub async fn leave_feed<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
    ) -> ThreadlineResult<()> {
        auth.feed(feed_id)
            .has_role(FeedRole::Member)
            .await?
            .ensure_permitted()?;
        let user = auth.user_or_err()?;
        self.guard_last_owner(auth.org_id(), feed_id, user.id).await?;
        self.membership_repo
            .remove(auth.org_id(), feed_id, user.id)
            .await
    }

    /// Fetch a feed the caller is allowed to see.
    pub async fn visible_feed<A: AuthContext>(
        &self,
        auth: &A,
        feed_id: Uuid,
    ) -> ThreadlineResult<Feed> {
        let feed = self.feed_repo.get_by_id(auth.org_id(), feed_id).await?;
        auth.feed_with(&feed).can_view().await?.ensure_permitted()?;
        Ok(feed)
    }

    async fn guard_last_owner(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
        user_id: Uuid,
    ) -> ThreadlineResult<()> {
        if is_last_owner(&self.membership_repo, org_id, feed_id, user_id).await? {
            debug!(%org_id, %feed_id, %user_id, "rejected: last owner");
            return Err(ThreadlineError::LastOwner { feed_id });
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> ThreadlineResult<()> {
    if name.trim().is_empty() {
        return Err(ThreadlineError::Validation {
            message: "feed name must not be empty".into(),
        });
    }
    Ok(())
}
