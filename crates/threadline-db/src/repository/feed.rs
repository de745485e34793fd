//! SurrealDB implementation of [`FeedRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use threadline_core::error::ThreadlineResult;
use threadline_core::models::feed::{CreateFeed, Feed, UpdateFeed};
use threadline_core::repository::{FeedRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::value::{capabilities_to_strings, parse_capabilities, parse_privacy, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct FeedRow {
    org_id: String,
    name: String,
    description: Option<String>,
    privacy: String,
    member_permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FeedRow {
    fn into_feed(self, id: Uuid) -> Result<Feed, DbError> {
        Ok(Feed {
            id,
            org_id: parse_uuid("org", &self.org_id)?,
            name: self.name,
            description: self.description,
            privacy: parse_privacy(&self.privacy)?,
            member_permissions: parse_capabilities(&self.member_permissions)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct FeedRowWithId {
    record_id: String,
    org_id: String,
    name: String,
    description: Option<String>,
    privacy: String,
    member_permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FeedRowWithId {
    pub(crate) fn try_into_feed(self) -> Result<Feed, DbError> {
        let id = parse_uuid("feed", &self.record_id)?;
        FeedRow {
            org_id: self.org_id,
            name: self.name,
            description: self.description,
            privacy: self.privacy,
            member_permissions: self.member_permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_feed(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Feed repository.
#[derive(Clone)]
pub struct SurrealFeedRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFeedRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> FeedRepository for SurrealFeedRepository<C> {
    async fn create(&self, input: CreateFeed) -> ThreadlineResult<Feed> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('feed', $id) SET \
                 org_id = $org_id, name = $name, \
                 description = $description, privacy = $privacy, \
                 member_permissions = $member_permissions",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", input.org_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("privacy", input.privacy.as_str().to_string()))
            .bind((
                "member_permissions",
                capabilities_to_strings(&input.member_permissions),
            ))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<FeedRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "feed".into(),
            id: id_str,
        })?;

        Ok(row.into_feed(id)?)
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> ThreadlineResult<Feed> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('feed', $id) \
                 WHERE org_id = $org_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "feed".into(),
            id: id_str,
        })?;

        Ok(row.into_feed(id)?)
    }

    async fn update(&self, org_id: Uuid, id: Uuid, input: UpdateFeed) -> ThreadlineResult<Feed> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.privacy.is_some() {
            sets.push("privacy = $privacy");
        }
        if input.member_permissions.is_some() {
            sets.push("member_permissions = $member_permissions");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('feed', $id) SET {} \
             WHERE org_id = $org_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(privacy) = input.privacy {
            builder = builder.bind(("privacy", privacy.as_str().to_string()));
        }
        if let Some(perms) = input.member_permissions {
            builder = builder.bind(("member_permissions", capabilities_to_strings(&perms)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<FeedRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "feed".into(),
            id: id_str,
        })?;

        Ok(row.into_feed(id)?)
    }

    async fn delete(&self, org_id: Uuid, id: Uuid) -> ThreadlineResult<()> {
        // Memberships go first so no row can point at a missing feed.
        self.db
            .query(
                "DELETE feed_membership WHERE org_id = $org_id AND feed_id = $id; \
                 DELETE type::record('feed', $id) WHERE org_id = $org_id;",
            )
            .bind(("id", id.to_string()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> ThreadlineResult<PaginatedResult<Feed>> {
        let org_id_str = org_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM feed \
                 WHERE org_id = $org_id GROUP ALL",
            )
            .bind(("org_id", org_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM feed \
                 WHERE org_id = $org_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("org_id", org_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_feed())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
