//! Database operations for the `project_competitors` table.
//!
//! Edges are directed (`project_id` → `competitor_project_id`) and replaced
//! per source project. The table's CHECK constraints reject self-edges and
//! ranks outside 1–5.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A competitor edge joined with the target project's name and slug.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectCompetitorRow {
    pub project_id: i64,
    pub competitor_project_id: i64,
    pub competitor_name: String,
    pub competitor_slug: String,
    pub rank: i32,
    pub common_count: i32,
    pub common_power: f64,
    pub similarity: f64,
    pub computed_at: DateTime<Utc>,
}

/// Fields required to insert a `project_competitors` row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProjectCompetitor {
    pub competitor_project_id: i64,
    pub rank: i32,
    pub common_count: i32,
    pub common_power: f64,
    pub similarity: f64,
}

/// Replace all outgoing edges of `project_id` with `edges`.
///
/// An empty slice clears the project's edges.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is committed.
pub async fn replace_project_competitors(
    pool: &PgPool,
    project_id: i64,
    edges: &[NewProjectCompetitor],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM project_competitors WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

    for edge in edges {
        sqlx::query(
            "INSERT INTO project_competitors \
               (project_id, competitor_project_id, rank, common_count, common_power, similarity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(project_id)
        .bind(edge.competitor_project_id)
        .bind(edge.rank)
        .bind(edge.common_count)
        .bind(edge.common_power)
        .bind(edge.similarity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(edges.len())
}

/// List the ranked competitors of a project.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_project_competitors(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<ProjectCompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, ProjectCompetitorRow>(
        "SELECT c.project_id, c.competitor_project_id, p.name AS competitor_name, \
                p.slug AS competitor_slug, c.rank, c.common_count, c.common_power, \
                c.similarity, c.computed_at \
         FROM project_competitors c \
         JOIN projects p ON p.id = c.competitor_project_id \
         WHERE c.project_id = $1 \
         ORDER BY c.rank ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
