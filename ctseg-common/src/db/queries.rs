//! Catalog queries shared by the UI and the ingest tool

use crate::db::models::{BaseImage, ChallengeRun, Collection, Comparison, Team};
use crate::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// All collections, ordered by name
pub async fn list_collections(pool: &SqlitePool) -> Result<Vec<Collection>> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM collection ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| Collection { id, name })
        .collect())
}

/// All teams in id order (id order is the `alg<id>` filename encoding)
pub async fn list_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, team FROM team ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, team)| Team { id, team })
        .collect())
}

/// Id of a seeded collection by name
pub async fn collection_id_by_name(pool: &SqlitePool, name: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM collection WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(id)
}

/// Base images of one collection, ordered by label
pub async fn list_base_images(pool: &SqlitePool, collection_id: i64) -> Result<Vec<BaseImage>> {
    let rows = sqlx::query_as::<_, (i64, i64, String, String)>(
        "SELECT id, collection_id, label, file FROM base_image WHERE collection_id = ? ORDER BY label",
    )
    .bind(collection_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, collection_id, label, file)| BaseImage {
            id,
            collection_id,
            label,
            file,
        })
        .collect())
}

/// Look up a base image by its label
pub async fn find_base_image(pool: &SqlitePool, label: &str) -> Result<Option<BaseImage>> {
    let row = sqlx::query_as::<_, (i64, i64, String, String)>(
        "SELECT id, collection_id, label, file FROM base_image WHERE label = ?",
    )
    .bind(label)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, collection_id, label, file)| BaseImage {
        id,
        collection_id,
        label,
        file,
    }))
}

/// Runs recorded for a base-image label, with `{team}-{run_id}` display
/// names for the selectors
pub async fn list_runs_for_label(pool: &SqlitePool, label: &str) -> Result<Vec<ChallengeRun>> {
    let rows = sqlx::query_as::<_, (i64, String, i64)>(
        r#"
        SELECT c.id, t.team, c.run_id
        FROM challenge c
        JOIN team t ON t.id = c.team_id
        WHERE c.label = ?
        ORDER BY t.team, c.run_id
        "#,
    )
    .bind(label)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, team, run_id)| ChallengeRun {
            id,
            name: format!("{}-{}", team, run_id),
        })
        .collect())
}

/// Relative file path of a challenge
pub async fn challenge_file(pool: &SqlitePool, id: i64) -> Result<Option<String>> {
    let file = sqlx::query_scalar::<_, String>("SELECT file FROM challenge WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(file)
}

/// Insert a base image row, returning its id
pub async fn insert_base_image(
    pool: &SqlitePool,
    collection_id: i64,
    label: &str,
    file: &str,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO base_image (collection_id, label, file) VALUES (?, ?, ?)")
        .bind(collection_id)
        .bind(label)
        .bind(file)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a challenge row, returning its id
pub async fn insert_challenge(
    pool: &SqlitePool,
    base_image_id: i64,
    team_id: i64,
    collection_id: i64,
    label: &str,
    run_id: i64,
    file: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO challenge (base_image_id, team_id, collection_id, label, run_id, file)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(base_image_id)
    .bind(team_id)
    .bind(collection_id)
    .bind(label)
    .bind(run_id)
    .bind(file)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Remove all imported rows ahead of a re-import.
///
/// Comparisons reference challenges, so they go too; the seeded
/// collection and team rows stay.
pub async fn clear_catalog(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM comparison").execute(pool).await?;
    sqlx::query("DELETE FROM challenge").execute(pool).await?;
    sqlx::query("DELETE FROM base_image").execute(pool).await?;

    Ok(())
}

/// Record an executed comparison, returning its guid
pub async fn record_comparison(
    pool: &SqlitePool,
    challenge_1: i64,
    challenge_2: i64,
    dice: Option<f64>,
    command: &str,
) -> Result<String> {
    let guid = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO comparison (guid, challenge_1, challenge_2, dice, command) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(challenge_1)
    .bind(challenge_2)
    .bind(dice)
    .bind(command)
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Most recent comparisons, newest first
pub async fn recent_comparisons(pool: &SqlitePool, limit: i64) -> Result<Vec<Comparison>> {
    let rows = sqlx::query_as::<_, (String, i64, i64, Option<f64>, String, String)>(
        r#"
        SELECT guid, challenge_1, challenge_2, dice, command, created_at
        FROM comparison
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(guid, challenge_1, challenge_2, dice, command, created_at)| Comparison {
                guid,
                challenge_1,
                challenge_2,
                dice,
                command,
                created_at,
            },
        )
        .collect())
}
