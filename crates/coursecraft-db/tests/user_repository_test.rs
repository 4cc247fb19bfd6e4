//! Integration tests for the user, settings, and balance repositories
//! using in-memory SurrealDB.

use coursecraft_core::error::CoreError;
use coursecraft_core::models::user::{CreateUser, SocialProvider, UserRole};
use coursecraft_core::repository::{
    InstructorBalanceRepository, UserRepository, UserSettingsRepository,
};
use coursecraft_db::{
    SurrealInstructorBalanceRepository, SurrealUserRepository, SurrealUserSettingsRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    coursecraft_db::run_migrations(&db).await.unwrap();
    db
}

fn local_user(email: &str, username: &str) -> CreateUser {
    CreateUser {
        email: email.into(),
        username: username.into(),
        password_hash: Some("$argon2id$fakehash".into()),
        avatar_url: None,
        role: UserRole::Student,
        social: None,
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(local_user("alice@example.com", "alice"))
        .await
        .unwrap();

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, UserRole::Student);
    assert!(user.social.is_none());

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.username, "alice");

    let by_email = repo.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn social_user_roundtrips_provider_and_avatar() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(CreateUser {
            email: "bob@example.com".into(),
            username: "Bob".into(),
            password_hash: None,
            avatar_url: Some("http://img/u.png".into()),
            role: UserRole::Student,
            social: Some(SocialProvider::Facebook),
        })
        .await
        .unwrap();

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.social, Some(SocialProvider::Facebook));
    assert_eq!(fetched.avatar_url.as_deref(), Some("http://img/u.png"));
    assert!(fetched.password_hash.is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(local_user("carol@example.com", "carol"))
        .await
        .unwrap();

    let err = repo
        .create(local_user("carol@example.com", "carol2"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists { .. }), "{err}");
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let err = repo.get_by_email("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn update_password_replaces_hash() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(local_user("dave@example.com", "dave"))
        .await
        .unwrap();

    repo.update_password(user.id, "$argon2id$newhash")
        .await
        .unwrap();

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.password_hash.as_deref(), Some("$argon2id$newhash"));
}

#[tokio::test]
async fn settings_lifecycle() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let settings = SurrealUserSettingsRepository::new(db);

    let user = users
        .create(local_user("erin@example.com", "erin"))
        .await
        .unwrap();

    let created = settings.create(user.id, false).await.unwrap();
    assert_eq!(created.user_id, user.id);
    assert!(!created.is_email_verified);

    settings.mark_email_verified(user.id).await.unwrap();
    let fetched = settings.get_by_user(user.id).await.unwrap();
    assert!(fetched.is_email_verified);

    // Second row for the same user violates the one-to-one invariant.
    let err = settings.create(user.id, true).await.unwrap_err();
    assert!(matches!(err, CoreError::AlreadyExists { .. }), "{err}");
}

#[tokio::test]
async fn ensure_ledger_is_zero_initialized_and_idempotent() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let balances = SurrealInstructorBalanceRepository::new(db);

    let user = users
        .create(local_user("frank@example.com", "frank"))
        .await
        .unwrap();

    assert!(balances.get_by_user(user.id).await.unwrap().is_none());

    let first = balances.ensure_ledger(user.id).await.unwrap();
    assert_eq!(first.current_balance, 0);

    // Re-ensuring leaves the existing row untouched.
    let again = balances.ensure_ledger(user.id).await.unwrap();
    assert_eq!(again.current_balance, 0);
    assert_eq!(again.created_at, first.created_at);

    let fetched = balances.get_by_user(user.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_id, user.id);
}

#[tokio::test]
async fn delete_cascades_to_dependent_rows() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let settings = SurrealUserSettingsRepository::new(db.clone());
    let balances = SurrealInstructorBalanceRepository::new(db);

    let user = users
        .create(local_user("grace@example.com", "grace"))
        .await
        .unwrap();
    settings.create(user.id, true).await.unwrap();
    balances.ensure_ledger(user.id).await.unwrap();

    users.delete(user.id).await.unwrap();

    assert!(matches!(
        users.get_by_id(user.id).await.unwrap_err(),
        CoreError::NotFound { .. }
    ));
    assert!(matches!(
        settings.get_by_user(user.id).await.unwrap_err(),
        CoreError::NotFound { .. }
    ));
    assert!(balances.get_by_user(user.id).await.unwrap().is_none());

    // The email is free for a fresh registration.
    users
        .create(local_user("grace@example.com", "grace2"))
        .await
        .unwrap();
}
