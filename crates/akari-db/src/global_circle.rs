//! Database operations for `global_circle_members`.
//!
//! The table is a snapshot: [`replace_global_circle`] deletes every row and
//! bulk-inserts the new selection inside one transaction, so readers never
//! observe a half-replaced circle. The same transaction prunes project circle
//! members that fell out of the snapshot, so every stored project circle stays
//! a subset of the global circle even for projects a run did not rebuild.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A global circle member joined with the profile's handle.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GlobalCircleMemberRow {
    pub profile_id: i64,
    pub handle: String,
    pub rank: i32,
    pub akari_score: f64,
    pub influence_score: f64,
    pub segment: String,
    pub added_at: DateTime<Utc>,
}

/// Fields required to insert a `global_circle_members` row.
#[derive(Debug, Clone)]
pub struct NewGlobalCircleMember {
    pub profile_id: i64,
    pub rank: i32,
    pub akari_score: f64,
    pub influence_score: f64,
    pub segment: String,
}

/// Replace the whole global circle with `members`.
///
/// Project circle members whose profile is not in the new circle are deleted.
/// Every project that lost members gets its count and power recomputed from
/// what remains, and its competitor edges in both directions are cleared
/// until its next rebuild.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back and the previous circle stays in place.
pub async fn replace_global_circle(
    pool: &PgPool,
    members: &[NewGlobalCircleMember],
) -> Result<usize, DbError> {
    let profile_ids: Vec<i64> = members.iter().map(|m| m.profile_id).collect();
    let ranks: Vec<i32> = members.iter().map(|m| m.rank).collect();
    let akari_scores: Vec<f64> = members.iter().map(|m| m.akari_score).collect();
    let influence_scores: Vec<f64> = members.iter().map(|m| m.influence_score).collect();
    let segments: Vec<String> = members.iter().map(|m| m.segment.clone()).collect();

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM global_circle_members")
        .execute(&mut *tx)
        .await?;

    if !members.is_empty() {
        sqlx::query(
            "INSERT INTO global_circle_members \
               (profile_id, rank, akari_score, influence_score, segment, added_at) \
             SELECT *, NOW() FROM UNNEST($1::BIGINT[], $2::INTEGER[], \
                                         $3::DOUBLE PRECISION[], $4::DOUBLE PRECISION[], \
                                         $5::TEXT[])",
        )
        .bind(&profile_ids)
        .bind(&ranks)
        .bind(&akari_scores)
        .bind(&influence_scores)
        .bind(&segments)
        .execute(&mut *tx)
        .await?;
    }

    let mut pruned: Vec<i64> = sqlx::query_scalar::<_, i64>(
        "DELETE FROM project_circle_members m \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM global_circle_members g WHERE g.profile_id = m.profile_id \
         ) \
         RETURNING m.project_id",
    )
    .fetch_all(&mut *tx)
    .await?;
    pruned.sort_unstable();
    pruned.dedup();

    if !pruned.is_empty() {
        sqlx::query(
            "DELETE FROM project_competitors \
             WHERE project_id = ANY($1) OR competitor_project_id = ANY($1)",
        )
        .bind(&pruned)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE projects p \
             SET inner_circle_count = s.member_count, \
                 inner_circle_power = s.power, \
                 stats_updated_at   = NOW(), \
                 updated_at         = NOW() \
             FROM ( \
                 SELECT ids.project_id, \
                        COUNT(m.profile_id)::INTEGER AS member_count, \
                        COALESCE(SUM(g.influence_score), 0) AS power \
                 FROM UNNEST($1::BIGINT[]) AS ids (project_id) \
                 LEFT JOIN project_circle_members m ON m.project_id = ids.project_id \
                 LEFT JOIN global_circle_members g ON g.profile_id = m.profile_id \
                 GROUP BY ids.project_id \
             ) s \
             WHERE p.id = s.project_id",
        )
        .bind(&pruned)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(members.len())
}

/// List the current global circle ordered by rank, optionally capped at `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_global_circle(
    pool: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<GlobalCircleMemberRow>, DbError> {
    let rows = sqlx::query_as::<_, GlobalCircleMemberRow>(
        "SELECT g.profile_id, p.handle, g.rank, g.akari_score, g.influence_score, \
                g.segment, g.added_at \
         FROM global_circle_members g \
         JOIN profiles p ON p.id = g.profile_id \
         ORDER BY g.rank ASC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
