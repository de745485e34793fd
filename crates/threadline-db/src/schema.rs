//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs (record ids and foreign keys) are stored
//! as strings, enums as their lowercase names.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "feeds_and_memberships",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations (global scope, resolved by subdomain)
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD subdomain ON TABLE organization TYPE string;
DEFINE FIELD metadata ON TABLE organization TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_subdomain ON TABLE organization \
    COLUMNS subdomain UNIQUE;

-- =======================================================================
-- Users (organization scope)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD org_id ON TABLE user TYPE string;
DEFINE FIELD identity_key ON TABLE user TYPE string;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE option<string>;
DEFINE FIELD deactivated_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_org_identity ON TABLE user \
    COLUMNS org_id, identity_key UNIQUE;

-- =======================================================================
-- Feeds (organization scope)
-- =======================================================================
DEFINE TABLE feed SCHEMAFULL;
DEFINE FIELD org_id ON TABLE feed TYPE string;
DEFINE FIELD name ON TABLE feed TYPE string;
DEFINE FIELD description ON TABLE feed TYPE option<string>;
DEFINE FIELD privacy ON TABLE feed TYPE string \
    ASSERT $value IN ['public', 'open', 'private'];
DEFINE FIELD member_permissions ON TABLE feed TYPE array;
DEFINE FIELD member_permissions.* ON TABLE feed TYPE string \
    ASSERT $value IN ['post', 'message'];
DEFINE FIELD created_at ON TABLE feed TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE feed TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_feed_org ON TABLE feed COLUMNS org_id;

-- =======================================================================
-- Feed memberships (organization scope, one row per feed and user)
-- =======================================================================
DEFINE TABLE feed_membership SCHEMAFULL;
DEFINE FIELD org_id ON TABLE feed_membership TYPE string;
DEFINE FIELD feed_id ON TABLE feed_membership TYPE string;
DEFINE FIELD user_id ON TABLE feed_membership TYPE string;
DEFINE FIELD owner ON TABLE feed_membership TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE feed_membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE feed_membership TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_membership_feed_user ON TABLE feed_membership \
    COLUMNS feed_id, user_id UNIQUE;
DEFINE INDEX idx_membership_org_user ON TABLE feed_membership \
    COLUMNS org_id, user_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// The `_migration` table records every applied version; only versions
/// above the highest recorded one are applied, so calling this on every
/// start is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let applied = current_version(db).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > applied);

    for migration in pending {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        apply(db, migration).await?;
        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "could not record v{}: {e}",
                migration.version
            ))
        })?;

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
