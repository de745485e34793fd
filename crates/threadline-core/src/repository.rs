//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Organization-scoped repositories
//! require an `org_id` parameter to enforce tenant isolation.

use uuid::Uuid;

use crate::error::ThreadlineResult;
use crate::models::{
    feed::{CreateFeed, Feed, UpdateFeed},
    membership::{CreateMembership, FeedMembership, UserFeeds},
    organization::{CreateOrganization, Organization, UpdateOrganization},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Organization (global scope)
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = ThreadlineResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = ThreadlineResult<Organization>> + Send;
    /// Resolve the tenant for a request host's subdomain.
    fn get_by_subdomain(
        &self,
        subdomain: &str,
    ) -> impl Future<Output = ThreadlineResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = ThreadlineResult<Organization>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ThreadlineResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = ThreadlineResult<PaginatedResult<Organization>>> + Send;
}

// ---------------------------------------------------------------------------
// Organization-scoped repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = ThreadlineResult<User>> + Send;
    fn get_by_id(
        &self,
        org_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<User>> + Send;
    /// Look up the application user behind an auth-provider identity.
    fn get_by_identity(
        &self,
        org_id: Uuid,
        identity_key: &str,
    ) -> impl Future<Output = ThreadlineResult<User>> + Send;
    fn update(
        &self,
        org_id: Uuid,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = ThreadlineResult<User>> + Send;
    /// Soft-delete: stamps `deactivated_at`.
    fn deactivate(&self, org_id: Uuid, id: Uuid)
    -> impl Future<Output = ThreadlineResult<()>> + Send;
    fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ThreadlineResult<PaginatedResult<User>>> + Send;
}

pub trait FeedRepository: Send + Sync {
    fn create(&self, input: CreateFeed) -> impl Future<Output = ThreadlineResult<Feed>> + Send;
    fn get_by_id(
        &self,
        org_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<Feed>> + Send;
    fn update(
        &self,
        org_id: Uuid,
        id: Uuid,
        input: UpdateFeed,
    ) -> impl Future<Output = ThreadlineResult<Feed>> + Send;
    /// Delete a feed together with all of its memberships.
    fn delete(&self, org_id: Uuid, id: Uuid) -> impl Future<Output = ThreadlineResult<()>> + Send;
    fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = ThreadlineResult<PaginatedResult<Feed>>> + Send;
}

pub trait MembershipRepository: Send + Sync {
    /// Create a membership. Fails with `AlreadyExists` if the user is
    /// already a member of the feed.
    fn add(
        &self,
        input: CreateMembership,
    ) -> impl Future<Output = ThreadlineResult<FeedMembership>> + Send;

    /// The membership of `user_id` in `feed_id`, if any.
    fn get(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<Option<FeedMembership>>> + Send;

    /// Promote to or demote from owner.
    fn set_owner(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
        user_id: Uuid,
        owner: bool,
    ) -> impl Future<Output = ThreadlineResult<FeedMembership>> + Send;

    fn remove(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<()>> + Send;

    fn list_by_feed(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<Vec<FeedMembership>>> + Send;

    fn count_owners(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<u64>> + Send;

    /// All memberships of a user in the organization plus the feeds they
    /// point at.
    fn user_feeds(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = ThreadlineResult<UserFeeds>> + Send;
}
