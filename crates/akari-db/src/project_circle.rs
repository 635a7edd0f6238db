//! Database operations for `project_circle_members` and the denormalized
//! circle stats on `projects`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{count_to_i32, DbError};

/// A project circle member joined with the profile's handle.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectCircleMemberRow {
    pub project_id: i64,
    pub profile_id: i64,
    pub handle: String,
    pub is_follower: bool,
    pub is_author: bool,
    pub weight: f64,
    pub last_interaction_at: Option<DateTime<Utc>>,
}

/// Fields required to insert a `project_circle_members` row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProjectCircleMember {
    pub profile_id: i64,
    pub is_follower: bool,
    pub is_author: bool,
    pub weight: f64,
    pub last_interaction_at: Option<DateTime<Utc>>,
}

/// Summary columns written onto the `projects` row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectStats {
    pub circle_count: usize,
    pub circle_power: f64,
    pub quality_follower_ratio: f64,
}

/// Replace a project's circle and its stats in one transaction.
///
/// Returns the number of member rows inserted.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the project does not exist, or
/// [`DbError::Sqlx`] if any statement fails. Either way nothing is committed.
pub async fn replace_project_circle(
    pool: &PgPool,
    project_id: i64,
    members: &[NewProjectCircleMember],
    stats: &ProjectStats,
) -> Result<usize, DbError> {
    let profile_ids: Vec<i64> = members.iter().map(|m| m.profile_id).collect();
    let followers: Vec<bool> = members.iter().map(|m| m.is_follower).collect();
    let authors: Vec<bool> = members.iter().map(|m| m.is_author).collect();
    let weights: Vec<f64> = members.iter().map(|m| m.weight).collect();
    let interactions: Vec<Option<DateTime<Utc>>> =
        members.iter().map(|m| m.last_interaction_at).collect();

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM project_circle_members WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

    if !members.is_empty() {
        sqlx::query(
            "INSERT INTO project_circle_members \
               (project_id, profile_id, is_follower, is_author, weight, last_interaction_at) \
             SELECT $1, u.* FROM UNNEST($2::BIGINT[], $3::BOOLEAN[], $4::BOOLEAN[], \
                                        $5::DOUBLE PRECISION[], $6::TIMESTAMPTZ[]) AS u",
        )
        .bind(project_id)
        .bind(&profile_ids)
        .bind(&followers)
        .bind(&authors)
        .bind(&weights)
        .bind(&interactions)
        .execute(&mut *tx)
        .await?;
    }

    let updated = sqlx::query(
        "UPDATE projects SET \
           inner_circle_count     = $1, \
           inner_circle_power     = $2, \
           quality_follower_ratio = $3, \
           stats_updated_at       = NOW(), \
           updated_at             = NOW() \
         WHERE id = $4",
    )
    .bind(count_to_i32(stats.circle_count))
    .bind(stats.circle_power)
    .bind(stats.quality_follower_ratio)
    .bind(project_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    tx.commit().await?;
    Ok(members.len())
}

/// List a project's circle, heaviest members first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_project_circle(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<ProjectCircleMemberRow>, DbError> {
    let rows = sqlx::query_as::<_, ProjectCircleMemberRow>(
        "SELECT m.project_id, m.profile_id, p.handle, m.is_follower, m.is_author, \
                m.weight, m.last_interaction_at \
         FROM project_circle_members m \
         JOIN profiles p ON p.id = m.profile_id \
         WHERE m.project_id = $1 \
         ORDER BY m.weight DESC, m.profile_id ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
