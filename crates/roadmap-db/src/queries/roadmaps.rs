//! Database query functions for the `roadmaps` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::RoadmapRow;

/// Fetch a user's roadmap row.
pub async fn get_roadmap(pool: &PgPool, user_id: &str) -> Result<Option<RoadmapRow>> {
    let row = sqlx::query_as::<_, RoadmapRow>("SELECT * FROM roadmaps WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch roadmap for user {user_id}"))?;

    Ok(row)
}

/// Write the raw plan cell, creating the row when the user has none.
///
/// The progress cell of an existing row is left alone.
pub async fn upsert_plan(pool: &PgPool, user_id: &str, plan_raw: &str) -> Result<RoadmapRow> {
    let row = sqlx::query_as::<_, RoadmapRow>(
        "INSERT INTO roadmaps (user_id, plan_raw) \
         VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE \
         SET plan_raw = EXCLUDED.plan_raw, updated_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(plan_raw)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to store plan for user {user_id}"))?;

    Ok(row)
}

/// Overwrite the progress cell wholesale, creating the row when needed.
///
/// There is no version check: concurrent writers for the same user race and
/// the last write wins.
pub async fn upsert_progress(
    pool: &PgPool,
    user_id: &str,
    progress_raw: &str,
) -> Result<RoadmapRow> {
    let row = sqlx::query_as::<_, RoadmapRow>(
        "INSERT INTO roadmaps (user_id, progress_raw) \
         VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE \
         SET progress_raw = EXCLUDED.progress_raw, updated_at = now() \
         RETURNING *",
    )
    .bind(user_id)
    .bind(progress_raw)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to store progress for user {user_id}"))?;

    Ok(row)
}
