//! Database initialization
//!
//! Creates the catalog schema on first run and seeds the fixed
//! collection and team lists. Every statement is idempotent so the UI
//! and the ingest tool can both run this at startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open the catalog database, creating it and its schema if needed.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Apply pragmas and create all tables and seed rows on an open pool.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    // WAL lets the UI keep reading while an import writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(pool)
        .await?;

    create_collection_table(pool).await?;
    create_team_table(pool).await?;
    create_base_image_table(pool).await?;
    create_challenge_table(pool).await?;
    create_comparison_table(pool).await?;

    Ok(())
}

/// Create the collection table and seed the MOIST collection list.
pub async fn create_collection_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collection (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // INSERT OR IGNORE keeps reruns idempotent
    for name in ["cumc", "lidc", "moffitt", "rider", "stanford"] {
        sqlx::query("INSERT OR IGNORE INTO collection (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Create the team table and seed the participating teams.
///
/// Seed order matters: run filenames encode the team as `alg<id>` with
/// the two-digit row id, so cumc must stay 1, moffitt 2, stanford 3.
pub async fn create_team_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS team (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    for team in ["cumc", "moffitt", "stanford"] {
        sqlx::query("INSERT OR IGNORE INTO team (team) VALUES (?)")
            .bind(team)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Create the base_image table
///
/// One row per base CT volume; `file` is stored relative to the data
/// root.
pub async fn create_base_image_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS base_image (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection_id INTEGER NOT NULL REFERENCES collection(id),
            label TEXT NOT NULL,
            file TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_base_image_collection ON base_image(collection_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_base_image_label ON base_image(label)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the challenge table
///
/// One row per segmentation run submitted against a base image; `file`
/// is stored relative to the data root.
pub async fn create_challenge_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS challenge (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            base_image_id INTEGER NOT NULL REFERENCES base_image(id) ON DELETE CASCADE,
            team_id INTEGER NOT NULL REFERENCES team(id),
            collection_id INTEGER NOT NULL REFERENCES collection(id),
            label TEXT NOT NULL,
            run_id INTEGER NOT NULL,
            file TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_challenge_base_image ON challenge(base_image_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_challenge_label ON challenge(label)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the comparison table
///
/// History of executed comparisons. `dice` is NULL when c3d reported
/// nan (both masks empty on every slice).
pub async fn create_comparison_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comparison (
            guid TEXT PRIMARY KEY,
            challenge_1 INTEGER NOT NULL REFERENCES challenge(id) ON DELETE CASCADE,
            challenge_2 INTEGER NOT NULL REFERENCES challenge(id) ON DELETE CASCADE,
            dice REAL,
            command TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comparison_created_at ON comparison(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
