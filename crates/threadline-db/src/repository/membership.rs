//! SurrealDB implementation of [`MembershipRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use threadline_core::error::ThreadlineResult;
use threadline_core::models::membership::{CreateMembership, FeedMembership, UserFeeds};
use threadline_core::repository::MembershipRepository;
use uuid::Uuid;

use super::feed::FeedRowWithId;
use super::value::parse_uuid;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct MembershipRow {
    org_id: String,
    feed_id: String,
    user_id: String,
    owner: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self, id: Uuid) -> Result<FeedMembership, DbError> {
        Ok(FeedMembership {
            id,
            org_id: parse_uuid("org", &self.org_id)?,
            feed_id: parse_uuid("feed", &self.feed_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            owner: self.owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct MembershipRowWithId {
    record_id: String,
    org_id: String,
    feed_id: String,
    user_id: String,
    owner: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRowWithId {
    fn try_into_membership(self) -> Result<FeedMembership, DbError> {
        let id = parse_uuid("membership", &self.record_id)?;
        MembershipRow {
            org_id: self.org_id,
            feed_id: self.feed_id,
            user_id: self.user_id,
            owner: self.owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_membership(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the feed membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn add(&self, input: CreateMembership) -> ThreadlineResult<FeedMembership> {
        let org_id_str = input.org_id.to_string();
        let feed_id_str = input.feed_id.to_string();
        let user_id_str = input.user_id.to_string();

        // Both ends must live in the same organization.
        let mut check = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE id = type::record('user', $user_id) \
                 AND org_id = $org_id GROUP ALL; \
                 SELECT count() AS total FROM feed \
                 WHERE id = type::record('feed', $feed_id) \
                 AND org_id = $org_id GROUP ALL;",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("feed_id", feed_id_str.clone()))
            .bind(("org_id", org_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let user_count: Vec<CountRow> = check.take(0).map_err(DbError::from)?;
        if user_count.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: user_id_str,
            }
            .into());
        }

        let feed_count: Vec<CountRow> = check.take(1).map_err(DbError::from)?;
        if feed_count.first().map(|r| r.total).unwrap_or(0) == 0 {
            return Err(DbError::NotFound {
                entity: "feed".into(),
                id: feed_id_str,
            }
            .into());
        }

        if self
            .get(input.org_id, input.feed_id, input.user_id)
            .await?
            .is_some()
        {
            return Err(DbError::Duplicate {
                entity: format!("feed_membership feed={feed_id_str} user={user_id_str}"),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('feed_membership', $id) SET \
                 org_id = $org_id, feed_id = $feed_id, \
                 user_id = $user_id, owner = $owner",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id_str))
            .bind(("feed_id", feed_id_str))
            .bind(("user_id", user_id_str))
            .bind(("owner", input.owner))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "feed_membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(id)?)
    }

    async fn get(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
        user_id: Uuid,
    ) -> ThreadlineResult<Option<FeedMembership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM feed_membership \
                 WHERE org_id = $org_id AND feed_id = $feed_id \
                 AND user_id = $user_id",
            )
            .bind(("org_id", org_id.to_string()))
            .bind(("feed_id", feed_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        let membership = rows
            .into_iter()
            .next()
            .map(|row| row.try_into_membership())
            .transpose()?;

        Ok(membership)
    }

    async fn set_owner(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
        user_id: Uuid,
        owner: bool,
    ) -> ThreadlineResult<FeedMembership> {
        let existing = self
            .get(org_id, feed_id, user_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "feed_membership".into(),
                id: format!("feed={feed_id} user={user_id}"),
            })?;

        let id_str = existing.id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('feed_membership', $id) SET \
                 owner = $owner, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner", owner))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "feed_membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(existing.id)?)
    }

    async fn remove(&self, org_id: Uuid, feed_id: Uuid, user_id: Uuid) -> ThreadlineResult<()> {
        let existing = self
            .get(org_id, feed_id, user_id)
            .await?
            .ok_or_else(|| DbError::NotFound {
                entity: "feed_membership".into(),
                id: format!("feed={feed_id} user={user_id}"),
            })?;

        self.db
            .query("DELETE type::record('feed_membership', $id)")
            .bind(("id", existing.id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn list_by_feed(
        &self,
        org_id: Uuid,
        feed_id: Uuid,
    ) -> ThreadlineResult<Vec<FeedMembership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM feed_membership \
                 WHERE org_id = $org_id AND feed_id = $feed_id \
                 ORDER BY created_at ASC",
            )
            .bind(("org_id", org_id.to_string()))
            .bind(("feed_id", feed_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn count_owners(&self, org_id: Uuid, feed_id: Uuid) -> ThreadlineResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM feed_membership \
                 WHERE org_id = $org_id AND feed_id = $feed_id \
                 AND owner = true GROUP ALL",
            )
            .bind(("org_id", org_id.to_string()))
            .bind(("feed_id", feed_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn user_feeds(&self, org_id: Uuid, user_id: Uuid) -> ThreadlineResult<UserFeeds> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM feed_membership \
                 WHERE org_id = $org_id AND user_id = $user_id \
                 ORDER BY created_at ASC; \
                 SELECT meta::id(id) AS record_id, * FROM feed \
                 WHERE org_id = $org_id \
                 AND meta::id(id) IN (\
                     SELECT VALUE feed_id FROM feed_membership \
                     WHERE org_id = $org_id AND user_id = $user_id\
                 ) \
                 ORDER BY created_at ASC;",
            )
            .bind(("org_id", org_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let membership_rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        let feed_rows: Vec<FeedRowWithId> = result.take(1).map_err(DbError::from)?;

        let memberships = membership_rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;
        let feeds = feed_rows
            .into_iter()
            .map(|row| row.try_into_feed())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(UserFeeds { memberships, feeds })
    }
}
