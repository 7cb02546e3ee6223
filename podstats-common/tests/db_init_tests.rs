//! Tests for store initialization
//!
//! - Store file is created on demand and only when asked
//! - Sidecar cleanup removes every SQLite companion file
//! - The generated `podcasts` schema enforces the (url, sheet) key

use podstats_common::db::{
    create_podcasts_table, open_database, remove_database_files, PodcastsTableSchema,
    SchemaIntrospector,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("podcasts.db");

    let pool = open_database(&db_path, true).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_open_without_create_fails_for_missing_store() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("absent.db");

    let result = open_database(&db_path, false).await;
    assert!(result.is_err(), "Opening a missing store without create must fail");
    assert!(!db_path.exists(), "Store must not be created as a side effect");
}

#[tokio::test]
async fn test_podcasts_table_created_with_expected_columns() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("podcasts.db");
    let pool = open_database(&db_path, true).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    create_podcasts_table(&mut *conn).await.unwrap();
    drop(conn);

    assert!(SchemaIntrospector::table_exists(&pool, "podcasts").await.unwrap());
    let missing = SchemaIntrospector::missing_columns::<PodcastsTableSchema>(&pool)
        .await
        .unwrap();
    assert!(missing.is_empty(), "Missing columns: {:?}", missing);
}

#[tokio::test]
async fn test_podcasts_table_rejects_duplicate_key() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("podcasts.db");
    let pool = open_database(&db_path, true).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    create_podcasts_table(&mut *conn).await.unwrap();
    drop(conn);

    let insert = "INSERT INTO podcasts (url, sheet, full) VALUES (?, ?, ?)";
    sqlx::query(insert).bind("/wp-content/uploads/a.mp3").bind("2021").bind(1_i64)
        .execute(&pool).await.unwrap();
    sqlx::query(insert).bind("/wp-content/uploads/a.mp3").bind("2022").bind(2_i64)
        .execute(&pool).await.unwrap();

    let dup = sqlx::query(insert).bind("/wp-content/uploads/a.mp3").bind("2021").bind(3_i64)
        .execute(&pool).await;
    assert!(dup.is_err(), "Second row for (url, sheet) must be rejected");

    let ignored = sqlx::query(
        "INSERT OR IGNORE INTO podcasts (url, sheet, full) \
         VALUES ('/wp-content/uploads/a.mp3', '2021', 9)",
    )
    .execute(&pool)
    .await
    .unwrap();
    assert_eq!(ignored.rows_affected(), 0);

    let full: i64 = sqlx::query_scalar(
        "SELECT full FROM podcasts WHERE url = '/wp-content/uploads/a.mp3' AND sheet = '2021'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(full, 1, "Insert-or-ignore must leave the existing row untouched");
}

#[tokio::test]
async fn test_remove_database_files_clears_sidecars() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("podcasts.db");
    std::fs::write(&db_path, b"").unwrap();
    std::fs::write(temp_dir.path().join("podcasts.db-journal"), b"").unwrap();
    std::fs::write(temp_dir.path().join("podcasts.db-wal"), b"").unwrap();

    assert!(remove_database_files(&db_path).unwrap());
    assert!(!db_path.exists());
    assert!(!temp_dir.path().join("podcasts.db-journal").exists());
    assert!(!temp_dir.path().join("podcasts.db-wal").exists());

    // Second call is a no-op
    assert!(!remove_database_files(&db_path).unwrap());
}
