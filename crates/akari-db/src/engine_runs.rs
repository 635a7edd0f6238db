//! Database operations for `engine_runs`.
//!
//! Lifecycle: `queued` → `running` → `succeeded` | `failed`. Each transition
//! is guarded on the expected current status.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{count_to_i32, DbError};

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
     profiles_discovered, profiles_scored, global_circle_size, projects_processed, \
     competitor_edges, failures, error_message, created_at";

/// A row from the `engine_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EngineRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub profiles_discovered: i32,
    pub profiles_scored: i32,
    pub global_circle_size: i32,
    pub projects_processed: i32,
    pub competitor_edges: i32,
    pub failures: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters recorded when a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineRunTotals {
    pub profiles_discovered: usize,
    pub profiles_scored: usize,
    pub global_circle_size: usize,
    pub projects_processed: usize,
    pub competitor_edges: usize,
    pub failures: usize,
}

/// Creates a new engine run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_engine_run(
    pool: &PgPool,
    trigger_source: &str,
) -> Result<EngineRunRow, DbError> {
    let row = sqlx::query_as::<_, EngineRunRow>(&format!(
        "INSERT INTO engine_runs (public_id, trigger_source, status) \
         VALUES ($1, $2, 'queued') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidEngineRunTransition`] if the run is not
/// `queued`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_engine_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE engine_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidEngineRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records its counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidEngineRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_engine_run(
    pool: &PgPool,
    id: i64,
    totals: &EngineRunTotals,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE engine_runs SET \
           status              = 'succeeded', \
           completed_at        = NOW(), \
           profiles_discovered = $1, \
           profiles_scored     = $2, \
           global_circle_size  = $3, \
           projects_processed  = $4, \
           competitor_edges    = $5, \
           failures            = $6 \
         WHERE id = $7 AND status = 'running'",
    )
    .bind(count_to_i32(totals.profiles_discovered))
    .bind(count_to_i32(totals.profiles_scored))
    .bind(count_to_i32(totals.global_circle_size))
    .bind(count_to_i32(totals.projects_processed))
    .bind(count_to_i32(totals.competitor_edges))
    .bind(count_to_i32(totals.failures))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidEngineRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidEngineRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_engine_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE engine_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidEngineRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_engine_run(pool: &PgPool, id: i64) -> Result<EngineRunRow, DbError> {
    sqlx::query_as::<_, EngineRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM engine_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_engine_runs(pool: &PgPool, limit: i64) -> Result<Vec<EngineRunRow>, DbError> {
    let rows = sqlx::query_as::<_, EngineRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM engine_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Marks every `running` run started before `started_before` as `failed`.
///
/// A process killed mid-run never reaches complete or fail; this closes such
/// rows so they stop counting as live. Returns the number of rows closed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_abandoned_engine_runs(
    pool: &PgPool,
    started_before: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE engine_runs \
         SET status = 'failed', completed_at = NOW(), \
             error_message = 'abandoned: still running past the run timeout' \
         WHERE status = 'running' AND started_at < $1",
    )
    .bind(started_before)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// `true` when some run is currently in `running` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_running_engine_run(pool: &PgPool) -> Result<bool, DbError> {
    let running = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM engine_runs WHERE status = 'running')",
    )
    .fetch_one(pool)
    .await?;

    Ok(running)
}
