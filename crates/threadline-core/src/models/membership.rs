//! Feed membership domain model.
//!
//! A membership row is the only way a user becomes a member of a feed;
//! organization membership alone never implies it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::feed::Feed;

/// Feed-level role. Every owner is also a member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedRole {
    Member,
    Owner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedMembership {
    pub id: Uuid,
    pub org_id: Uuid,
    pub feed_id: Uuid,
    pub user_id: Uuid,
    pub owner: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedMembership {
    pub fn role(&self) -> FeedRole {
        if self.owner {
            FeedRole::Owner
        } else {
            FeedRole::Member
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub org_id: Uuid,
    pub feed_id: Uuid,
    pub user_id: Uuid,
    pub owner: bool,
}

/// Everything a user belongs to inside one organization, fetched in one
/// call to seed a snapshot authorization context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFeeds {
    pub memberships: Vec<FeedMembership>,
    pub feeds: Vec<Feed>,
}
