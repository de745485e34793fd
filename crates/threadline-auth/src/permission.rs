//! Permission decisions and the denial vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Why a permission check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No identity accompanied the request.
    Unauthenticated,
    /// The identity has no user in this organization.
    UserNotFound,
    UserDeactivated,
    NotFeedMember,
    NotFeedOwner,
    /// The feed does not grant this capability to plain members.
    MissingPermission,
    /// The organization role does not match the required one.
    InsufficientRole,
}

impl DenialReason {
    pub const ALL: [DenialReason; 7] = [
        DenialReason::Unauthenticated,
        DenialReason::UserNotFound,
        DenialReason::UserDeactivated,
        DenialReason::NotFeedMember,
        DenialReason::NotFeedOwner,
        DenialReason::MissingPermission,
        DenialReason::InsufficientRole,
    ];

    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            DenialReason::Unauthenticated => "unauthenticated",
            DenialReason::UserNotFound => "user_not_found",
            DenialReason::UserDeactivated => "user_deactivated",
            DenialReason::NotFeedMember => "not_feed_member",
            DenialReason::NotFeedOwner => "not_feed_owner",
            DenialReason::MissingPermission => "missing_permission",
            DenialReason::InsufficientRole => "insufficient_role",
        }
    }

    /// Message shown to the end user.
    pub fn message(self) -> &'static str {
        match self {
            DenialReason::Unauthenticated => "You must be signed in",
            DenialReason::UserNotFound => "User not found",
            DenialReason::UserDeactivated => "Your account has been deactivated",
            DenialReason::NotFeedMember => "You must be a member of this feed",
            DenialReason::NotFeedOwner => "You must be an owner of this feed",
            DenialReason::MissingPermission => {
                "You do not have permission to do that in this feed"
            }
            DenialReason::InsufficientRole => "You do not have the required role",
        }
    }
}

/// An allow/deny decision. A denial always carries its reason.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResult {
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<DenialReason>,
}

impl PermissionResult {
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub const fn deny(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> Option<DenialReason> {
        self.reason
    }

    pub fn message(&self) -> Option<&'static str> {
        self.reason.map(DenialReason::message)
    }

    /// Abort on denial: `Ok(())` when allowed, otherwise
    /// [`AuthError::PermissionDenied`] with the reason.
    pub fn ensure_permitted(self) -> Result<(), AuthError> {
        match self.reason {
            Some(reason) if !self.allowed => Err(AuthError::PermissionDenied(reason)),
            _ => Ok(()),
        }
    }
}

impl From<DenialReason> for PermissionResult {
    fn from(reason: DenialReason) -> Self {
        Self::deny(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn allowed_result_is_a_no_op() {
        let result = PermissionResult::allow();
        assert!(result.is_allowed());
        assert_eq!(result.reason(), None);
        assert!(result.ensure_permitted().is_ok());
    }

    #[test]
    fn denial_raises_with_its_message() {
        let err = PermissionResult::deny(DenialReason::NotFeedMember)
            .ensure_permitted()
            .unwrap_err();
        assert_eq!(err.denial_reason(), Some(DenialReason::NotFeedMember));
        assert_eq!(err.to_string(), "You must be a member of this feed");
    }

    #[test]
    fn every_reason_has_a_distinct_message_and_code() {
        let messages: HashSet<_> = DenialReason::ALL.iter().map(|r| r.message()).collect();
        let codes: HashSet<_> = DenialReason::ALL.iter().map(|r| r.code()).collect();
        assert_eq!(messages.len(), DenialReason::ALL.len());
        assert_eq!(codes.len(), DenialReason::ALL.len());
    }

    #[test]
    fn serializes_with_snake_case_codes() {
        for reason in DenialReason::ALL {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.code()));
        }

        let denied = serde_json::to_value(PermissionResult::deny(DenialReason::MissingPermission))
            .unwrap();
        assert_eq!(
            denied,
            serde_json::json!({ "allowed": false, "reason": "missing_permission" })
        );
        let allowed = serde_json::to_value(PermissionResult::allow()).unwrap();
        assert_eq!(allowed, serde_json::json!({ "allowed": true }));
    }

    #[test]
    fn converts_into_core_authorization_error() {
        let err: threadline_core::error::ThreadlineError =
            AuthError::PermissionDenied(DenialReason::NotFeedOwner).into();
        assert!(matches!(
            err,
            threadline_core::error::ThreadlineError::AuthorizationDenied { ref reason }
                if reason == "You must be an owner of this feed"
        ));
    }
}
