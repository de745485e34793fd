//! Feed domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who can see a feed without an explicit membership.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedPrivacy {
    /// Visible to anyone, including anonymous visitors.
    Public,
    /// Visible to and joinable by any signed-in user of the organization.
    Open,
    /// Visible to members only; joining requires an invitation.
    Private,
}

impl FeedPrivacy {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedPrivacy::Public => "public",
            FeedPrivacy::Open => "open",
            FeedPrivacy::Private => "private",
        }
    }
}

/// Capabilities a feed may grant to its non-owner members. Owners always
/// hold every capability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedCapability {
    /// Start new threads.
    Post,
    /// Reply with messages inside threads.
    Message,
}

impl FeedCapability {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedCapability::Post => "post",
            FeedCapability::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub privacy: FeedPrivacy,
    pub member_permissions: Vec<FeedCapability>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    /// Whether plain members of this feed hold `capability`.
    pub fn grants(&self, capability: FeedCapability) -> bool {
        self.member_permissions.contains(&capability)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeed {
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub privacy: FeedPrivacy,
    pub member_permissions: Vec<FeedCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateFeed {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub privacy: Option<FeedPrivacy>,
    pub member_permissions: Option<Vec<FeedCapability>>,
}
