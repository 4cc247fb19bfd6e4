//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    coursecraft_db::run_migrations(&db).await.unwrap();

    // Verify that key tables exist by querying INFO FOR DB.
    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    assert!(info_str.contains("user"), "missing user table");
    assert!(
        info_str.contains("user_settings"),
        "missing user_settings table"
    );
    assert!(
        info_str.contains("instructor_balance"),
        "missing instructor_balance table"
    );
    assert!(info_str.contains("token"), "missing token table");

    // Verify migration was recorded.
    assert!(info_str.contains("_migration"), "missing _migration table");
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    // Run twice — should not fail.
    coursecraft_db::run_migrations(&db).await.unwrap();
    coursecraft_db::run_migrations(&db).await.unwrap();

    // Verify only one migration record exists.
    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_emails() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    coursecraft_db::run_migrations(&db).await.unwrap();

    db.query(
        "CREATE user SET \
         email = 'dup@example.com', \
         username = 'first', \
         role = 'Student'",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    // Attempt duplicate email — should fail.
    let result = db
        .query(
            "CREATE user SET \
             email = 'dup@example.com', \
             username = 'second', \
             role = 'Student'",
        )
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "duplicate email should be rejected");
}

#[tokio::test]
async fn token_user_purpose_index_is_unique() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    coursecraft_db::run_migrations(&db).await.unwrap();

    db.query(
        "CREATE token SET \
         user_id = 'u1', purpose = 'verify_email', \
         token = 't1', expires_at = time::now() + 1h",
    )
    .await
    .unwrap()
    .check()
    .unwrap();

    let result = db
        .query(
            "CREATE token SET \
             user_id = 'u1', purpose = 'verify_email', \
             token = 't2', expires_at = time::now() + 1h",
        )
        .await
        .unwrap()
        .check();

    assert!(
        result.is_err(),
        "second live token for the same user and purpose should be rejected"
    );
}
