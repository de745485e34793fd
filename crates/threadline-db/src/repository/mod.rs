//! SurrealDB repository implementations.

mod feed;
mod membership;
mod organization;
mod user;
mod value;

pub use feed::SurrealFeedRepository;
pub use membership::SurrealMembershipRepository;
pub use organization::SurrealOrganizationRepository;
pub use user::SurrealUserRepository;
