//! Tests for database initialization and schema guarantees

use chartvote_common::db::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("chartvote.db");

    let result = init_database(&db_path).await;
    assert!(
        result.is_ok(),
        "Database initialization failed: {:?}",
        result.err()
    );

    // Verify database file was created
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("chartvote.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    // Open database second time (should succeed)
    let pool2 = init_database(&db_path).await;
    assert!(
        pool2.is_ok(),
        "Failed to open existing database: {:?}",
        pool2.err()
    );
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("chartvote.db");

    let pool = init_database(&db_path).await.unwrap();

    let throttle: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'fetch_throttle_seconds'")
            .fetch_optional(&pool)
            .await
            .unwrap();

    assert_eq!(throttle.as_deref(), Some("120"));
}

#[tokio::test]
async fn test_device_uniqueness_constraint_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("chartvote.db");

    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("INSERT INTO songs (id, title, artist) VALUES (1, 'Song A', 'Artist A')")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO songs (id, title, artist) VALUES (2, 'Song B', 'Artist B')")
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("INSERT INTO song_votes (device_id, song_id) VALUES ('device-1', 1)")
        .execute(&pool)
        .await
        .unwrap();

    // Second vote from the same device must be rejected, even for a
    // different song
    let second = sqlx::query("INSERT INTO song_votes (device_id, song_id) VALUES ('device-1', 2)")
        .execute(&pool)
        .await;
    assert!(second.is_err(), "duplicate device vote was accepted");

    let err = second.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert!(db_err.is_unique_violation());
        }
        other => panic!("expected a database error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_engine_config_loaded_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("chartvote.db");

    let pool = init_database(&db_path).await.unwrap();

    let config = chartvote_common::config::load_engine_config(&pool)
        .await
        .unwrap();
    assert_eq!(config.fetch_throttle.as_secs(), 120);

    sqlx::query("UPDATE settings SET value = '30' WHERE key = 'fetch_throttle_seconds'")
        .execute(&pool)
        .await
        .unwrap();

    let config = chartvote_common::config::load_engine_config(&pool)
        .await
        .unwrap();
    assert_eq!(config.fetch_throttle.as_secs(), 30);
}

#[tokio::test]
async fn test_malformed_throttle_setting_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("chartvote.db");

    let pool = init_database(&db_path).await.unwrap();

    sqlx::query("UPDATE settings SET value = 'soon' WHERE key = 'fetch_throttle_seconds'")
        .execute(&pool)
        .await
        .unwrap();

    let result = chartvote_common::config::load_engine_config(&pool).await;
    assert!(result.is_err());
}
