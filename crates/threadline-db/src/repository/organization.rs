//! SurrealDB implementation of [`OrganizationRepository`].
//!
//! Every read, including the echo after a write, goes through the same
//! projection so there is a single row type. Subdomains are stored
//! lowercased and kept unique across create and update.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use threadline_core::error::ThreadlineResult;
use threadline_core::models::organization::{
    CreateOrganization, Organization, UpdateOrganization,
};
use threadline_core::repository::{OrganizationRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::value::parse_uuid;
use crate::error::DbError;

const PROJECTION: &str =
    "meta::id(id) AS record_id, name, subdomain, metadata, created_at, updated_at";

#[derive(Debug, SurrealValue)]
struct OrganizationRecord {
    record_id: String,
    name: String,
    subdomain: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrganizationRecord> for Organization {
    type Error = DbError;

    fn try_from(record: OrganizationRecord) -> Result<Self, DbError> {
        Ok(Organization {
            id: parse_uuid("organization", &record.record_id)?,
            name: record.name,
            subdomain: record.subdomain,
            metadata: record.metadata,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// The one organization in `records`, or `NotFound` keyed by `key`.
fn single(records: Vec<OrganizationRecord>, key: String) -> Result<Organization, DbError> {
    records
        .into_iter()
        .next()
        .ok_or(DbError::NotFound {
            entity: "organization".into(),
            id: key,
        })?
        .try_into()
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Reject `subdomain` if an organization other than `except` holds it.
    async fn ensure_subdomain_free(
        &self,
        subdomain: &str,
        except: Option<Uuid>,
    ) -> Result<(), DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM organization \
                 WHERE subdomain = $subdomain AND meta::id(id) != $except GROUP ALL",
            )
            .bind(("subdomain", subdomain.to_string()))
            .bind(("except", except.map(|id| id.to_string()).unwrap_or_default()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        if rows.first().is_some_and(|r| r.total > 0) {
            return Err(DbError::Duplicate {
                entity: format!("organization subdomain={subdomain}"),
            });
        }
        Ok(())
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> ThreadlineResult<Organization> {
        let subdomain = input.subdomain.to_ascii_lowercase();
        self.ensure_subdomain_free(&subdomain, None).await?;

        let id = Uuid::new_v4();
        let metadata = input
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        let mut result = self
            .db
            .query(format!(
                "CREATE type::record('organization', $id) SET \
                 name = $name, subdomain = $subdomain, metadata = $metadata; \
                 SELECT {PROJECTION} FROM type::record('organization', $id);"
            ))
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("subdomain", subdomain))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let records: Vec<OrganizationRecord> = result.take(1).map_err(DbError::from)?;
        Ok(single(records, id.to_string())?)
    }

    async fn get_by_id(&self, id: Uuid) -> ThreadlineResult<Organization> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM type::record('organization', $id)"
            ))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let records: Vec<OrganizationRecord> = result.take(0).map_err(DbError::from)?;
        Ok(single(records, id.to_string())?)
    }

    async fn get_by_subdomain(&self, subdomain: &str) -> ThreadlineResult<Organization> {
        let subdomain = subdomain.to_ascii_lowercase();

        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM organization WHERE subdomain = $subdomain"
            ))
            .bind(("subdomain", subdomain.clone()))
            .await
            .map_err(DbError::from)?;

        let records: Vec<OrganizationRecord> = result.take(0).map_err(DbError::from)?;
        Ok(single(records, format!("subdomain={subdomain}"))?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> ThreadlineResult<Organization> {
        // Fails with NotFound before anything is written.
        self.get_by_id(id).await?;

        let subdomain = input.subdomain.map(|s| s.to_ascii_lowercase());
        if let Some(subdomain) = &subdomain {
            self.ensure_subdomain_free(subdomain, Some(id)).await?;
        }

        let mut sets = vec!["updated_at = time::now()"];
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if subdomain.is_some() {
            sets.push("subdomain = $subdomain");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }

        let query = format!(
            "UPDATE type::record('organization', $id) SET {}; \
             SELECT {PROJECTION} FROM type::record('organization', $id);",
            sets.join(", ")
        );
        let mut builder = self.db.query(query).bind(("id", id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(subdomain) = subdomain {
            builder = builder.bind(("subdomain", subdomain));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let records: Vec<OrganizationRecord> = result.take(1).map_err(DbError::from)?;
        Ok(single(records, id.to_string())?)
    }

    async fn delete(&self, id: Uuid) -> ThreadlineResult<()> {
        self.get_by_id(id).await?;
        self.db
            .query("DELETE type::record('organization', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        Ok(())
    }

    async fn list(
        &self,
        pagination: Pagination,
    ) -> ThreadlineResult<PaginatedResult<Organization>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM organization GROUP ALL; \
                 SELECT {PROJECTION} FROM organization \
                 ORDER BY created_at ASC LIMIT $limit START $offset;"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let counts: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let records: Vec<OrganizationRecord> = result.take(1).map_err(DbError::from)?;
        let items = records
            .into_iter()
            .map(Organization::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResult {
            items,
            total: counts.first().map_or(0, |r| r.total),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
