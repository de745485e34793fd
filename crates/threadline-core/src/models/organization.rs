//! Organization domain model.
//!
//! Organizations are the tenant boundary in Threadline. Each request is
//! resolved to exactly one organization through its subdomain, and every
//! user, feed and membership is scoped to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A community hosting its own users and feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Unique DNS label the organization is served under (e.g., `acme`
    /// for `acme.threadline.app`).
    pub subdomain: String,
    /// Arbitrary key-value metadata.
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub subdomain: String,
    pub metadata: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing organization.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub subdomain: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
