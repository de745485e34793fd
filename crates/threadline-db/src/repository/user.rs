//! SurrealDB implementation of [`UserRepository`].
//!
//! Users are provisioned from the auth provider's identity and never hold
//! credentials here. Deletion is a soft deactivation so that historical
//! threads and memberships keep a valid author.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use threadline_core::error::ThreadlineResult;
use threadline_core::models::user::{CreateUser, UpdateUser, User};
use threadline_core::repository::{PaginatedResult, Pagination, UserRepository};
use uuid::Uuid;

use super::value::{parse_role, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    org_id: String,
    identity_key: String,
    name: String,
    email: String,
    role: Option<String>,
    deactivated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            org_id: parse_uuid("org", &self.org_id)?,
            identity_key: self.identity_key,
            name: self.name,
            email: self.email,
            role: self.role.as_deref().map(parse_role).transpose()?,
            deactivated_at: self.deactivated_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    org_id: String,
    identity_key: String,
    name: String,
    email: String,
    role: Option<String>,
    deactivated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid("user", &self.record_id)?;
        UserRow {
            org_id: self.org_id,
            identity_key: self.identity_key,
            name: self.name,
            email: self.email,
            role: self.role,
            deactivated_at: self.deactivated_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> ThreadlineResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut existing = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE org_id = $org_id AND identity_key = $identity_key GROUP ALL",
            )
            .bind(("org_id", input.org_id.to_string()))
            .bind(("identity_key", input.identity_key.clone()))
            .await
            .map_err(DbError::from)?;
        let count: Vec<CountRow> = existing.take(0).map_err(DbError::from)?;
        if count.first().map(|r| r.total).unwrap_or(0) > 0 {
            return Err(DbError::Duplicate {
                entity: format!("user identity={}", input.identity_key),
            }
            .into());
        }

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 org_id = $org_id, identity_key = $identity_key, \
                 name = $name, email = $email, \
                 role = $role, deactivated_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", input.org_id.to_string()))
            .bind(("identity_key", input.identity_key))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("role", input.role.map(|r| r.as_str().to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, org_id: Uuid, id: Uuid) -> ThreadlineResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('user', $id) \
                 WHERE org_id = $org_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_identity(&self, org_id: Uuid, identity_key: &str) -> ThreadlineResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE org_id = $org_id AND identity_key = $identity_key",
            )
            .bind(("org_id", org_id.to_string()))
            .bind(("identity_key", identity_key.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("identity={identity_key}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, org_id: Uuid, id: Uuid, input: UpdateUser) -> ThreadlineResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.deactivated_at.is_some() {
            sets.push("deactivated_at = $deactivated_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {} \
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
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(role) = input.role {
            // Some(None) clears the role back to the implicit default.
            builder = builder.bind(("role", role.map(|r| r.as_str().to_string())));
        }
        if let Some(deactivated_at) = input.deactivated_at {
            builder = builder.bind(("deactivated_at", deactivated_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn deactivate(&self, org_id: Uuid, id: Uuid) -> ThreadlineResult<()> {
        self.db
            .query(
                "UPDATE type::record('user', $id) SET \
                 deactivated_at = time::now(), updated_at = time::now() \
                 WHERE org_id = $org_id",
            )
            .bind(("id", id.to_string()))
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        org_id: Uuid,
        pagination: Pagination,
    ) -> ThreadlineResult<PaginatedResult<User>> {
        let org_id_str = org_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
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
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE org_id = $org_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("org_id", org_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
