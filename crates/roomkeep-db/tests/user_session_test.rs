//! Integration tests for the User and Session repositories.

use chrono::{Duration, Utc};
use roomkeep_core::access::Role;
use roomkeep_core::error::RoomkeepError;
use roomkeep_core::models::session::CreateSession;
use roomkeep_core::models::user::{CreateUser, UpdateUser, UserStatus};
use roomkeep_core::repository::{Pagination, SessionRepository, UserRepository};
use roomkeep_db::repository::{SurrealSessionRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roomkeep_db::run_migrations(&db).await.unwrap();
    db
}

fn alice() -> CreateUser {
    CreateUser {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: "SuperSecret123!".into(),
        role: Role::User,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_user() {
    let repo = SurrealUserRepository::new(setup().await);

    let user = repo.create(alice()).await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::User);
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert_ne!(user.password_hash, "SuperSecret123!");

    let by_name = repo.get_by_username("alice").await.unwrap();
    assert_eq!(by_name.id, user.id);
    let by_email = repo.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let repo = SurrealUserRepository::new(setup().await);
    repo.create(alice()).await.unwrap();

    let mut again = alice();
    again.email = "other@example.com".into();
    let err = repo.create(again).await.unwrap_err();
    assert!(matches!(err, RoomkeepError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn update_role_and_soft_delete() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(alice()).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                role: Some(Role::Receptionist),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Receptionist);
    assert_eq!(updated.email, "alice@example.com");

    repo.delete(user.id).await.unwrap();
    let deleted = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(deleted.status, UserStatus::Inactive);
}

#[tokio::test]
async fn set_password_rehashes() {
    let repo = SurrealUserRepository::new(setup().await);
    let user = repo.create(alice()).await.unwrap();

    repo.set_password(user.id, "AnotherSecret456!").await.unwrap();
    let after = repo.get_by_id(user.id).await.unwrap();
    assert_ne!(after.password_hash, user.password_hash);
}

#[tokio::test]
async fn list_users() {
    let repo = SurrealUserRepository::new(setup().await);
    repo.create(alice()).await.unwrap();
    repo.create(CreateUser {
        username: "bob".into(),
        email: "bob@example.com".into(),
        password: "pass-word-123".into(),
        role: Role::Cleaner,
    })
    .await
    .unwrap();

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_lifecycle() {
    let db = setup().await;
    let user = SurrealUserRepository::new(db.clone())
        .create(alice())
        .await
        .unwrap();
    let repo = SurrealSessionRepository::new(db);

    let session = repo
        .create(CreateSession {
            user_id: user.id,
            token_hash: "hash-1".into(),
            ip_address: Some("127.0.0.1".into()),
            user_agent: None,
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

    let found = repo.get_by_token_hash("hash-1").await.unwrap();
    assert_eq!(found.id, session.id);
    assert_eq!(found.user_id, user.id);

    assert!(repo.invalidate(session.id).await.unwrap());
    assert!(repo.get_by_token_hash("hash-1").await.is_err());
    // a second delete of the same session reports that nothing was removed
    assert!(!repo.invalidate(session.id).await.unwrap());
}

#[tokio::test]
async fn invalidate_user_sessions_and_cleanup() {
    let db = setup().await;
    let user = SurrealUserRepository::new(db.clone())
        .create(alice())
        .await
        .unwrap();
    let repo = SurrealSessionRepository::new(db);

    for (hash, offset) in [("live-1", 1), ("live-2", 2), ("dead", -1)] {
        repo.create(CreateSession {
            user_id: user.id,
            token_hash: hash.into(),
            ip_address: None,
            user_agent: None,
            expires_at: Utc::now() + Duration::hours(offset),
        })
        .await
        .unwrap();
    }

    assert_eq!(repo.cleanup_expired().await.unwrap(), 1);
    assert!(repo.get_by_token_hash("dead").await.is_err());
    assert!(repo.get_by_token_hash("live-1").await.is_ok());

    repo.invalidate_user_sessions(user.id).await.unwrap();
    assert!(repo.get_by_token_hash("live-1").await.is_err());
    assert!(repo.get_by_token_hash("live-2").await.is_err());
}
