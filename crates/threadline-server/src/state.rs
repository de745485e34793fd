//! Shared application state and per-request authorization.

use surrealdb::{Connection, Surreal};
use threadline_auth::identity::resolve_identity;
use threadline_auth::{AuthConfig, FeedService, RequestAuthContext};
use threadline_core::error::{ThreadlineError, ThreadlineResult};
use threadline_core::repository::OrganizationRepository;
use threadline_core::tenant::subdomain_from_host;
use threadline_db::repository::{
    SurrealFeedRepository, SurrealMembershipRepository, SurrealOrganizationRepository,
    SurrealUserRepository,
};

pub type RequestContext<'a, C> =
    RequestAuthContext<'a, SurrealFeedRepository<C>, SurrealMembershipRepository<C>>;

pub struct AppState<C: Connection> {
    pub organizations: SurrealOrganizationRepository<C>,
    pub users: SurrealUserRepository<C>,
    pub feeds: FeedService<SurrealFeedRepository<C>, SurrealMembershipRepository<C>>,
    pub auth: AuthConfig,
    pub base_domain: String,
}

impl<C: Connection> AppState<C> {
    pub fn new(db: Surreal<C>, auth: AuthConfig, base_domain: String) -> Self {
        Self {
            organizations: SurrealOrganizationRepository::new(db.clone()),
            users: SurrealUserRepository::new(db.clone()),
            feeds: FeedService::new(
                SurrealFeedRepository::new(db.clone()),
                SurrealMembershipRepository::new(db),
            ),
            auth,
            base_domain,
        }
    }

    /// Resolve the organization from `host` and the caller from the
    /// `Authorization` header, in that order.
    pub async fn authorize(
        &self,
        host: &str,
        authorization: Option<&str>,
    ) -> ThreadlineResult<RequestContext<'_, C>> {
        let subdomain =
            subdomain_from_host(host, &self.base_domain).ok_or(ThreadlineError::TenantContext)?;
        let org = match self.organizations.get_by_subdomain(&subdomain).await {
            Ok(org) => org,
            Err(ThreadlineError::NotFound { .. }) => return Err(ThreadlineError::TenantContext),
            Err(e) => return Err(e),
        };

        let identity = resolve_identity(authorization, &self.auth)?;
        self.feeds
            .authorize(&self.users, org.id, identity.as_ref())
            .await
    }
}
