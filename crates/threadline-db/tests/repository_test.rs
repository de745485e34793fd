//! Integration tests for Organization and User repository
//! implementations using in-memory SurrealDB.

use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use threadline_core::error::ThreadlineError;
use threadline_core::models::organization::{CreateOrganization, UpdateOrganization};
use threadline_core::models::user::{CreateUser, OrgRole, UpdateUser};
use threadline_core::repository::{OrganizationRepository, Pagination, UserRepository};
use threadline_db::repository::{SurrealOrganizationRepository, SurrealUserRepository};
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    threadline_db::run_migrations(&db).await.unwrap();
    db
}

async fn create_org(db: &Surreal<surrealdb::engine::local::Db>, subdomain: &str) -> Uuid {
    SurrealOrganizationRepository::new(db.clone())
        .create(CreateOrganization {
            name: format!("Org {subdomain}"),
            subdomain: subdomain.into(),
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

fn new_user(org_id: Uuid, identity_key: &str) -> CreateUser {
    CreateUser {
        org_id,
        identity_key: identity_key.into(),
        name: identity_key.into(),
        email: format!("{identity_key}@example.com"),
        role: None,
    }
}

// -----------------------------------------------------------------------
// Organization tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_and_resolve_organization_by_subdomain() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let org = repo
        .create(CreateOrganization {
            name: "ACME Corp".into(),
            subdomain: "Acme".into(),
            metadata: None,
        })
        .await
        .unwrap();

    assert_eq!(org.subdomain, "acme");

    let by_id = repo.get_by_id(org.id).await.unwrap();
    assert_eq!(by_id.name, "ACME Corp");

    let by_subdomain = repo.get_by_subdomain("ACME").await.unwrap();
    assert_eq!(by_subdomain.id, org.id);
}

#[tokio::test]
async fn duplicate_subdomain_is_rejected() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let input = CreateOrganization {
        name: "First".into(),
        subdomain: "dup".into(),
        metadata: None,
    };
    repo.create(input.clone()).await.unwrap();

    let err = repo.create(input).await.unwrap_err();
    assert!(
        matches!(err, ThreadlineError::AlreadyExists { .. }),
        "expected AlreadyExists, got: {err:?}"
    );
}

#[tokio::test]
async fn update_and_delete_organization() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let org = repo
        .create(CreateOrganization {
            name: "Before".into(),
            subdomain: "before".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            org.id,
            UpdateOrganization {
                name: Some("After".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "After");
    assert_eq!(updated.subdomain, "before");

    repo.delete(org.id).await.unwrap();
    assert!(repo.get_by_id(org.id).await.is_err());
}

#[tokio::test]
async fn update_to_taken_subdomain_is_rejected() {
    let db = setup().await;
    create_org(&db, "taken").await;
    let org_id = create_org(&db, "mine").await;
    let repo = SurrealOrganizationRepository::new(db);

    let err = repo
        .update(
            org_id,
            UpdateOrganization {
                subdomain: Some("Taken".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ThreadlineError::AlreadyExists { .. }));

    // Re-saving its own subdomain is not a conflict.
    let same = repo
        .update(
            org_id,
            UpdateOrganization {
                subdomain: Some("MINE".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same.subdomain, "mine");
}

#[tokio::test]
async fn update_or_delete_missing_organization_is_not_found() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let err = repo
        .update(Uuid::new_v4(), UpdateOrganization::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ThreadlineError::NotFound { .. }));

    let err = repo.delete(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ThreadlineError::NotFound { .. }));
}

#[tokio::test]
async fn unknown_subdomain_is_not_found() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    let err = repo.get_by_subdomain("ghost").await.unwrap_err();
    assert!(matches!(err, ThreadlineError::NotFound { .. }));
}

#[tokio::test]
async fn list_organizations_with_pagination() {
    let db = setup().await;
    let repo = SurrealOrganizationRepository::new(db);

    for i in 0..4 {
        repo.create(CreateOrganization {
            name: format!("Org {i}"),
            subdomain: format!("org-{i}"),
            metadata: None,
        })
        .await
        .unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total, 4);
}

// -----------------------------------------------------------------------
// User tests
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_user_defaults_to_no_role() {
    let db = setup().await;
    let org_id = create_org(&db, "users").await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(new_user(org_id, "alice")).await.unwrap();

    assert_eq!(user.org_id, org_id);
    assert_eq!(user.role, None);
    assert_eq!(user.effective_role(), OrgRole::User);
    assert!(!user.is_deactivated());

    let fetched = repo.get_by_identity(org_id, "alice").await.unwrap();
    assert_eq!(fetched.id, user.id);
}

#[tokio::test]
async fn identity_lookup_is_scoped_to_organization() {
    let db = setup().await;
    let org_a = create_org(&db, "org-a").await;
    let org_b = create_org(&db, "org-b").await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(new_user(org_a, "alice")).await.unwrap();

    let err = repo.get_by_identity(org_b, "alice").await.unwrap_err();
    assert!(matches!(err, ThreadlineError::NotFound { .. }));

    let err = repo.get_by_id(org_b, user.id).await.unwrap_err();
    assert!(matches!(err, ThreadlineError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_identity_in_organization_is_rejected() {
    let db = setup().await;
    let org_id = create_org(&db, "dup-users").await;
    let repo = SurrealUserRepository::new(db);

    repo.create(new_user(org_id, "alice")).await.unwrap();
    let err = repo.create(new_user(org_id, "alice")).await.unwrap_err();
    assert!(matches!(err, ThreadlineError::AlreadyExists { .. }));
}

#[tokio::test]
async fn update_role_and_clear_it() {
    let db = setup().await;
    let org_id = create_org(&db, "roles").await;
    let repo = SurrealUserRepository::new(db);
    let user = repo.create(new_user(org_id, "alice")).await.unwrap();

    let admin = repo
        .update(
            org_id,
            user.id,
            UpdateUser {
                role: Some(Some(OrgRole::Admin)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(admin.role, Some(OrgRole::Admin));

    let cleared = repo
        .update(
            org_id,
            user.id,
            UpdateUser {
                role: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.role, None);
}

#[tokio::test]
async fn deactivate_and_reactivate_user() {
    let db = setup().await;
    let org_id = create_org(&db, "deactivation").await;
    let repo = SurrealUserRepository::new(db);
    let user = repo.create(new_user(org_id, "alice")).await.unwrap();

    repo.deactivate(org_id, user.id).await.unwrap();
    let fetched = repo.get_by_id(org_id, user.id).await.unwrap();
    assert!(fetched.is_deactivated());
    assert!(fetched.deactivated_at.unwrap() <= Utc::now());

    let reactivated = repo
        .update(
            org_id,
            user.id,
            UpdateUser {
                deactivated_at: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!reactivated.is_deactivated());
}
