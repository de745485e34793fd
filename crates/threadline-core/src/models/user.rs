//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organization-wide role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Admin,
    User,
}

impl OrgRole {
    pub fn as_str(self) -> &'static str {
        match self {
            OrgRole::Admin => "admin",
            OrgRole::User => "user",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub org_id: Uuid,
    /// Stable identity key issued by the auth provider (the token `sub`).
    pub identity_key: String,
    pub name: String,
    pub email: String,
    /// `None` is treated as [`OrgRole::User`].
    pub role: Option<OrgRole>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The organization role with the implicit default applied.
    pub fn effective_role(&self) -> OrgRole {
        self.role.unwrap_or(OrgRole::User)
    }

    pub fn is_deactivated(&self) -> bool {
        self.deactivated_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub org_id: Uuid,
    pub identity_key: String,
    pub name: String,
    pub email: String,
    pub role: Option<OrgRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `Some(Some(role))` = set, `Some(None)` = clear, `None` = no change.
    pub role: Option<Option<OrgRole>>,
    /// `Some(Some(ts))` = deactivate, `Some(None)` = reactivate.
    pub deactivated_at: Option<Option<DateTime<Utc>>>,
}
