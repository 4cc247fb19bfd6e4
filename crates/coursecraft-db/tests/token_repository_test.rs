//! Integration tests for the token repository using in-memory
//! SurrealDB.

use chrono::{Duration, Utc};
use coursecraft_core::error::CoreError;
use coursecraft_core::models::token::{TokenPurpose, UpsertToken};
use coursecraft_core::repository::TokenRepository;
use coursecraft_db::SurrealTokenRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> SurrealTokenRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    coursecraft_db::run_migrations(&db).await.unwrap();
    SurrealTokenRepository::new(db)
}

fn upsert_input(user_id: Uuid, purpose: TokenPurpose, token: &str) -> UpsertToken {
    UpsertToken {
        user_id,
        purpose,
        token: token.into(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

#[tokio::test]
async fn upsert_and_find_live() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    let stored = repo
        .upsert(upsert_input(user_id, TokenPurpose::VerifyEmail, "tok-1"))
        .await
        .unwrap();
    assert_eq!(stored.user_id, user_id);
    assert_eq!(stored.purpose, TokenPurpose::VerifyEmail);
    assert_eq!(stored.token, "tok-1");

    let live = repo
        .find_live(user_id, TokenPurpose::VerifyEmail)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(live.token, "tok-1");

    assert!(
        repo.find_live(user_id, TokenPurpose::ResetPassword)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn reissue_replaces_earlier_token() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    for n in 1..=3 {
        repo.upsert(upsert_input(
            user_id,
            TokenPurpose::ResetPassword,
            &format!("tok-{n}"),
        ))
        .await
        .unwrap();
    }

    // Only the last-issued token remains.
    let live = repo
        .find_live(user_id, TokenPurpose::ResetPassword)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(live.token, "tok-3");

    // Superseded tokens are gone, not merely expired.
    let err = repo
        .consume(TokenPurpose::ResetPassword, "tok-1")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err}");

    let consumed = repo
        .consume(TokenPurpose::ResetPassword, "tok-3")
        .await
        .unwrap();
    assert_eq!(consumed.user_id, user_id);
}

#[tokio::test]
async fn same_user_different_purposes_coexist() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    repo.upsert(upsert_input(user_id, TokenPurpose::VerifyEmail, "tok-v"))
        .await
        .unwrap();
    repo.upsert(upsert_input(user_id, TokenPurpose::ResetPassword, "tok-r"))
        .await
        .unwrap();

    assert!(
        repo.find_live(user_id, TokenPurpose::VerifyEmail)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        repo.find_live(user_id, TokenPurpose::ResetPassword)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn consume_is_single_use() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    let stored = repo
        .upsert(upsert_input(user_id, TokenPurpose::VerifyEmail, "tok-once"))
        .await
        .unwrap();

    let first = repo
        .consume(TokenPurpose::VerifyEmail, "tok-once")
        .await
        .unwrap();
    assert_eq!(first.user_id, user_id);
    // The returned record carries the expiry from before invalidation.
    assert_eq!(first.expires_at, stored.expires_at);
    assert!(first.expires_at > Utc::now());

    // The row survives but is dead; a replay reads as expired.
    let err = repo
        .consume(TokenPurpose::VerifyEmail, "tok-once")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::TokenExpired), "{err}");

    assert!(
        repo.find_live(user_id, TokenPurpose::VerifyEmail)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn consume_requires_matching_purpose() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    repo.upsert(upsert_input(user_id, TokenPurpose::VerifyEmail, "tok-p"))
        .await
        .unwrap();

    let err = repo
        .consume(TokenPurpose::ResetPassword, "tok-p")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn consume_unknown_token_is_not_found() {
    let repo = setup().await;

    let err = repo
        .consume(TokenPurpose::VerifyEmail, "never-issued")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn already_expired_token_reads_as_expired() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    repo.upsert(UpsertToken {
        user_id,
        purpose: TokenPurpose::ResetPassword,
        token: "tok-old".into(),
        expires_at: Utc::now() - Duration::minutes(5),
    })
    .await
    .unwrap();

    let err = repo
        .consume(TokenPurpose::ResetPassword, "tok-old")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::TokenExpired), "{err}");

    assert!(
        repo.find_live(user_id, TokenPurpose::ResetPassword)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn cleanup_removes_only_dead_rows() {
    let repo = setup().await;
    let expired_user = Uuid::new_v4();
    let live_user = Uuid::new_v4();

    repo.upsert(UpsertToken {
        user_id: expired_user,
        purpose: TokenPurpose::VerifyEmail,
        token: "tok-dead".into(),
        expires_at: Utc::now() - Duration::minutes(1),
    })
    .await
    .unwrap();
    repo.upsert(upsert_input(live_user, TokenPurpose::VerifyEmail, "tok-live"))
        .await
        .unwrap();

    let removed = repo.cleanup_expired().await.unwrap();
    assert_eq!(removed, 1);

    assert!(
        repo.find_live(live_user, TokenPurpose::VerifyEmail)
            .await
            .unwrap()
            .is_some()
    );

    assert_eq!(repo.cleanup_expired().await.unwrap(), 0);
}
