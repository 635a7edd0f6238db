//! Database operations for the `projects` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const PROJECT_COLUMNS: &str = "id, name, slug, x_handle, is_active, inner_circle_count, \
     inner_circle_power, quality_follower_ratio, stats_updated_at, created_at, updated_at";

/// A row from the `projects` table, including the denormalized circle stats.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Admin-owned. The engine only fills it when it is still `NULL`.
    pub x_handle: Option<String>,
    pub is_active: bool,
    pub inner_circle_count: i32,
    pub inner_circle_power: f64,
    pub quality_follower_ratio: f64,
    pub stats_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns all active projects, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_projects(pool: &PgPool) -> Result<Vec<ProjectRow>, DbError> {
    let rows = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE is_active = true ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single project by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_project_by_slug(pool: &PgPool, slug: &str) -> Result<Option<ProjectRow>, DbError> {
    let row = sqlx::query_as::<_, ProjectRow>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fill `x_handle` for a project whose handle is still unset.
///
/// Returns `true` if the handle was written, `false` if the project already
/// had a non-empty handle (which is never overwritten).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_project_handle_if_missing(
    pool: &PgPool,
    project_id: i64,
    handle: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE projects \
         SET x_handle = $1, updated_at = NOW() \
         WHERE id = $2 AND (x_handle IS NULL OR btrim(x_handle) = '')",
    )
    .bind(handle)
    .bind(project_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
