//! Pure permission decisions.
//!
//! Every function here is a stateless mapping from already-loaded facts
//! (who is calling, their membership, the feed) to a [`PermissionResult`].
//! Both authorization contexts delegate to these functions, so a decision
//! cannot differ between them for the same facts.
//!
//! Feed-scoped decisions first pass the caller through the principal gate:
//! an anonymous caller is `Unauthenticated`, an identity without a user is
//! `UserNotFound`, and a deactivated user is `UserDeactivated`, regardless
//! of role or membership.

use threadline_core::models::feed::{Feed, FeedCapability, FeedPrivacy};
use threadline_core::models::membership::{FeedMembership, FeedRole};
use threadline_core::models::user::{OrgRole, User};

use crate::permission::{DenialReason, PermissionResult};

/// Who is making the request, as far as this organization knows.
#[derive(Debug, Clone)]
pub enum Principal {
    /// No identity accompanied the request.
    Anonymous,
    /// A valid identity with no user row in the organization.
    Unregistered { identity_key: String },
    User(User),
}

impl Principal {
    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::User(user) => Some(user),
            _ => None,
        }
    }
}

impl From<Option<User>> for Principal {
    fn from(user: Option<User>) -> Self {
        user.map_or(Principal::Anonymous, Principal::User)
    }
}

pub(crate) fn active_user(principal: &Principal) -> Result<&User, DenialReason> {
    match principal {
        Principal::Anonymous => Err(DenialReason::Unauthenticated),
        Principal::Unregistered { .. } => Err(DenialReason::UserNotFound),
        Principal::User(user) if user.is_deactivated() => Err(DenialReason::UserDeactivated),
        Principal::User(user) => Ok(user),
    }
}

/// Allow any active user of the organization.
pub fn check_active_user(principal: &Principal) -> PermissionResult {
    match active_user(principal) {
        Ok(_) => PermissionResult::allow(),
        Err(reason) => reason.into(),
    }
}

/// Organization role check. Exact match: an admin does not satisfy a
/// `User` requirement.
pub fn check_user_role(principal: &Principal, required: OrgRole) -> PermissionResult {
    let user = match active_user(principal) {
        Ok(user) => user,
        Err(reason) => return reason.into(),
    };
    if user.effective_role() == required {
        PermissionResult::allow()
    } else {
        PermissionResult::deny(DenialReason::InsufficientRole)
    }
}

/// Feed role check over membership facts. Owners satisfy `Member`.
pub fn check_feed_role(is_member: bool, is_owner: bool, required: FeedRole) -> PermissionResult {
    if !is_member {
        return PermissionResult::deny(DenialReason::NotFeedMember);
    }
    if required == FeedRole::Owner && !is_owner {
        return PermissionResult::deny(DenialReason::NotFeedOwner);
    }
    PermissionResult::allow()
}

/// Member capability check against the feed's `member_permissions`. An
/// unknown feed grants nothing.
pub fn check_feed_permission(
    is_member: bool,
    feed: Option<&Feed>,
    permission: FeedCapability,
) -> PermissionResult {
    if !is_member {
        return PermissionResult::deny(DenialReason::NotFeedMember);
    }
    match feed {
        Some(feed) if feed.grants(permission) => PermissionResult::allow(),
        _ => PermissionResult::deny(DenialReason::MissingPermission),
    }
}

/// Principal gate followed by [`check_feed_role`].
pub fn feed_role(
    principal: &Principal,
    membership: Option<&FeedMembership>,
    required: FeedRole,
) -> PermissionResult {
    if let Err(reason) = active_user(principal) {
        return reason.into();
    }
    check_feed_role(
        membership.is_some(),
        membership.is_some_and(|m| m.owner),
        required,
    )
}

/// Whether the caller may use `capability` in the feed.
///
/// Owners are allowed without consulting `member_permissions`; `feed` is
/// only read for plain members and may be `None` for owners.
pub fn feed_capability(
    principal: &Principal,
    membership: Option<&FeedMembership>,
    feed: Option<&Feed>,
    capability: FeedCapability,
) -> PermissionResult {
    let as_member = feed_role(principal, membership, FeedRole::Member);
    if !as_member.is_allowed() {
        return as_member;
    }
    if membership.is_some_and(|m| m.owner) {
        return PermissionResult::allow();
    }
    check_feed_permission(true, feed, capability)
}

/// Whether the caller may see the feed and its threads.
///
/// Public feeds are visible to everyone, anonymous callers included, but a
/// known deactivated user is still refused. Open feeds need any active
/// user of the organization; private feeds need a membership.
pub fn feed_visibility(
    principal: &Principal,
    membership: Option<&FeedMembership>,
    feed: Option<&Feed>,
) -> PermissionResult {
    if principal.user().is_some_and(User::is_deactivated) {
        return PermissionResult::deny(DenialReason::UserDeactivated);
    }
    if feed.is_some_and(|f| f.privacy == FeedPrivacy::Public) {
        return PermissionResult::allow();
    }
    if let Err(reason) = active_user(principal) {
        return reason.into();
    }
    match feed.map(|f| f.privacy) {
        Some(FeedPrivacy::Open) => PermissionResult::allow(),
        _ if membership.is_some() => PermissionResult::allow(),
        _ => PermissionResult::deny(DenialReason::NotFeedMember),
    }
}

/// Whether the caller may add themselves to the feed. Private feeds are
/// invitation-only.
pub fn feed_join(principal: &Principal, feed: Option<&Feed>) -> PermissionResult {
    if let Err(reason) = active_user(principal) {
        return reason.into();
    }
    match feed.map(|f| f.privacy) {
        Some(FeedPrivacy::Public | FeedPrivacy::Open) => PermissionResult::allow(),
        _ => PermissionResult::deny(DenialReason::NotFeedMember),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Option<OrgRole>) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            identity_key: "idp|user".into(),
            name: "User".into(),
            email: "user@example.com".into(),
            role,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn deactivated(role: Option<OrgRole>) -> User {
        User {
            deactivated_at: Some(Utc::now()),
            ..user(role)
        }
    }

    fn feed(privacy: FeedPrivacy, member_permissions: Vec<FeedCapability>) -> Feed {
        let now = Utc::now();
        Feed {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "General".into(),
            description: None,
            privacy,
            member_permissions,
            created_at: now,
            updated_at: now,
        }
    }

    fn membership(feed: &Feed, user: &User, owner: bool) -> FeedMembership {
        let now = Utc::now();
        FeedMembership {
            id: Uuid::new_v4(),
            org_id: feed.org_id,
            feed_id: feed.id,
            user_id: user.id,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    fn denied(reason: DenialReason) -> PermissionResult {
        PermissionResult::deny(reason)
    }

    #[test]
    fn user_role_is_exact_match() {
        let admin = Principal::User(user(Some(OrgRole::Admin)));
        assert!(check_user_role(&admin, OrgRole::Admin).is_allowed());
        assert_eq!(
            check_user_role(&admin, OrgRole::User),
            denied(DenialReason::InsufficientRole)
        );
    }

    #[test]
    fn missing_role_defaults_to_user() {
        let plain = Principal::User(user(None));
        assert!(check_user_role(&plain, OrgRole::User).is_allowed());
        assert_eq!(
            check_user_role(&plain, OrgRole::Admin),
            denied(DenialReason::InsufficientRole)
        );
    }

    #[test]
    fn user_role_gate_reasons() {
        assert_eq!(
            check_user_role(&Principal::Anonymous, OrgRole::User),
            denied(DenialReason::Unauthenticated)
        );
        let unregistered = Principal::Unregistered {
            identity_key: "idp|ghost".into(),
        };
        assert_eq!(
            check_user_role(&unregistered, OrgRole::User),
            denied(DenialReason::UserNotFound)
        );
        let gone = Principal::User(deactivated(Some(OrgRole::Admin)));
        assert_eq!(
            check_user_role(&gone, OrgRole::Admin),
            denied(DenialReason::UserDeactivated)
        );
    }

    #[test]
    fn feed_role_over_membership_flags() {
        assert_eq!(
            check_feed_role(false, false, FeedRole::Member),
            denied(DenialReason::NotFeedMember)
        );
        assert!(check_feed_role(true, false, FeedRole::Member).is_allowed());
        assert_eq!(
            check_feed_role(true, false, FeedRole::Owner),
            denied(DenialReason::NotFeedOwner)
        );
        assert!(check_feed_role(true, true, FeedRole::Owner).is_allowed());
        assert!(check_feed_role(true, true, FeedRole::Member).is_allowed());
    }

    #[test]
    fn feed_permission_reads_member_permissions() {
        let f = feed(FeedPrivacy::Private, vec![FeedCapability::Post]);
        assert!(check_feed_permission(true, Some(&f), FeedCapability::Post).is_allowed());
        assert_eq!(
            check_feed_permission(true, Some(&f), FeedCapability::Message),
            denied(DenialReason::MissingPermission)
        );
        assert_eq!(
            check_feed_permission(false, Some(&f), FeedCapability::Post),
            denied(DenialReason::NotFeedMember)
        );
        assert_eq!(
            check_feed_permission(true, None, FeedCapability::Post),
            denied(DenialReason::MissingPermission)
        );
    }

    #[test]
    fn owner_bypasses_member_permissions() {
        let owner = user(None);
        let f = feed(FeedPrivacy::Private, vec![]);
        let m = membership(&f, &owner, true);
        let principal = Principal::User(owner);

        for cap in [FeedCapability::Post, FeedCapability::Message] {
            assert!(feed_capability(&principal, Some(&m), Some(&f), cap).is_allowed());
            // The feed is not needed to decide for an owner.
            assert!(feed_capability(&principal, Some(&m), None, cap).is_allowed());
        }
    }

    #[test]
    fn plain_member_needs_the_capability() {
        let member = user(None);
        let f = feed(FeedPrivacy::Private, vec![FeedCapability::Post]);
        let m = membership(&f, &member, false);
        let principal = Principal::User(member);

        assert!(feed_capability(&principal, Some(&m), Some(&f), FeedCapability::Post).is_allowed());
        assert_eq!(
            feed_capability(&principal, Some(&m), Some(&f), FeedCapability::Message),
            denied(DenialReason::MissingPermission)
        );
    }

    #[test]
    fn non_member_is_denied_every_feed_check() {
        let principal = Principal::User(user(Some(OrgRole::Admin)));
        let f = feed(FeedPrivacy::Open, vec![FeedCapability::Post, FeedCapability::Message]);

        assert_eq!(
            feed_role(&principal, None, FeedRole::Member),
            denied(DenialReason::NotFeedMember)
        );
        assert_eq!(
            feed_role(&principal, None, FeedRole::Owner),
            denied(DenialReason::NotFeedMember)
        );
        for cap in [FeedCapability::Post, FeedCapability::Message] {
            assert_eq!(
                feed_capability(&principal, None, Some(&f), cap),
                denied(DenialReason::NotFeedMember)
            );
        }
    }

    #[test]
    fn deactivated_owner_is_denied_everything() {
        let gone = deactivated(Some(OrgRole::Admin));
        let f = feed(FeedPrivacy::Public, vec![FeedCapability::Post]);
        let m = membership(&f, &gone, true);
        let principal = Principal::User(gone);
        let expected = denied(DenialReason::UserDeactivated);

        assert_eq!(check_user_role(&principal, OrgRole::Admin), expected);
        assert_eq!(feed_role(&principal, Some(&m), FeedRole::Owner), expected);
        assert_eq!(
            feed_capability(&principal, Some(&m), Some(&f), FeedCapability::Post),
            expected
        );
        assert_eq!(feed_visibility(&principal, Some(&m), Some(&f)), expected);
        assert_eq!(feed_join(&principal, Some(&f)), expected);
    }

    #[test]
    fn anonymous_is_unauthenticated_for_feed_checks() {
        let f = feed(FeedPrivacy::Open, vec![FeedCapability::Post]);
        let expected = denied(DenialReason::Unauthenticated);

        assert_eq!(feed_role(&Principal::Anonymous, None, FeedRole::Member), expected);
        assert_eq!(
            feed_capability(&Principal::Anonymous, None, Some(&f), FeedCapability::Post),
            expected
        );
        assert_eq!(feed_join(&Principal::Anonymous, Some(&f)), expected);
    }

    #[test]
    fn visibility_follows_privacy() {
        let outsider = Principal::User(user(None));
        let public = feed(FeedPrivacy::Public, vec![]);
        let open = feed(FeedPrivacy::Open, vec![]);
        let private = feed(FeedPrivacy::Private, vec![]);

        assert!(feed_visibility(&Principal::Anonymous, None, Some(&public)).is_allowed());
        assert_eq!(
            feed_visibility(&Principal::Anonymous, None, Some(&open)),
            denied(DenialReason::Unauthenticated)
        );
        assert!(feed_visibility(&outsider, None, Some(&open)).is_allowed());
        assert_eq!(
            feed_visibility(&outsider, None, Some(&private)),
            denied(DenialReason::NotFeedMember)
        );

        let member = user(None);
        let m = membership(&private, &member, false);
        assert!(feed_visibility(&Principal::User(member), Some(&m), Some(&private)).is_allowed());
    }

    #[test]
    fn private_feeds_are_invitation_only() {
        let principal = Principal::User(user(None));
        assert!(feed_join(&principal, Some(&feed(FeedPrivacy::Open, vec![]))).is_allowed());
        assert!(feed_join(&principal, Some(&feed(FeedPrivacy::Public, vec![]))).is_allowed());
        assert_eq!(
            feed_join(&principal, Some(&feed(FeedPrivacy::Private, vec![]))),
            denied(DenialReason::NotFeedMember)
        );
        assert_eq!(feed_join(&principal, None), denied(DenialReason::NotFeedMember));
    }
}
