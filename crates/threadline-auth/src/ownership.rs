//! The last-owner guard: a feed never ends up without an owner.

use threadline_core::error::ThreadlineResult;
use threadline_core::repository::MembershipRepository;
use uuid::Uuid;

/// True iff `user_id` owns `feed_id` and is its only owner.
///
/// Demoting, removing or letting such a user leave would orphan the feed.
/// The check and the following write are separate store calls; concurrent
/// demotions of the last two owners are not serialized here.
pub async fn is_last_owner<M: MembershipRepository>(
    memberships: &M,
    org_id: Uuid,
    feed_id: Uuid,
    user_id: Uuid,
) -> ThreadlineResult<bool> {
    let Some(membership) = memberships.get(org_id, feed_id, user_id).await? else {
        return Ok(false);
    };
    if !membership.owner {
        return Ok(false);
    }
    Ok(memberships.count_owners(org_id, feed_id).await? <= 1)
}
