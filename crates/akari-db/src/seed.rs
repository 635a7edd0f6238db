use akari_core::ProjectConfig;
use sqlx::PgPool;

use crate::DbError;

/// Upsert projects from config into the database.
///
/// Returns the number of projects processed. A project whose config carries
/// no handle keeps whatever handle is already stored. All upserts run inside
/// a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_projects(pool: &PgPool, projects: &[ProjectConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for project in projects {
        sqlx::query(
            "INSERT INTO projects (name, slug, x_handle, is_active) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name       = EXCLUDED.name, \
                 x_handle   = COALESCE(EXCLUDED.x_handle, projects.x_handle), \
                 is_active  = EXCLUDED.is_active, \
                 updated_at = NOW()",
        )
        .bind(&project.name)
        .bind(project.slug())
        .bind(project.normalized_handle())
        .bind(project.is_active)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
