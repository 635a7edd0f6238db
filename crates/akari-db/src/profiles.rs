//! Database operations for the `profiles` table.
//!
//! Handles are stored normalized (lower-case, no `@`); the unique index on
//! `handle` is the natural key every write goes through.

use akari_core::{normalize_handle, ProfileMetadata, ScoreBundle};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const PROFILE_COLUMNS: &str = "id, external_id, handle, display_name, bio, avatar_url, \
     followers_count, following_count, tweet_count, is_verified, account_created_at, \
     akari_score, authenticity_score, influence_score, signal_score, farm_risk_score, \
     last_scored_at, created_at, updated_at";

/// A row from the `profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub external_id: Option<String>,
    pub handle: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub tweet_count: i64,
    pub is_verified: bool,
    pub account_created_at: Option<DateTime<Utc>>,
    pub akari_score: Option<f64>,
    pub authenticity_score: Option<f64>,
    pub influence_score: Option<f64>,
    pub signal_score: Option<f64>,
    pub farm_risk_score: Option<f64>,
    pub last_scored_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of [`upsert_profile_metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertedProfile {
    pub id: i64,
    /// `true` when the row did not exist before this call.
    pub inserted: bool,
}

/// Insert or refresh a profile's metadata, keyed by normalized handle.
///
/// Scores and `last_scored_at` are never touched. Nullable metadata fields
/// keep their stored value when the incoming value is absent.
///
/// # Errors
///
/// Returns [`DbError::InvalidHandle`] if the handle normalizes to an empty string,
/// or [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_profile_metadata(
    pool: &PgPool,
    meta: &ProfileMetadata,
) -> Result<UpsertedProfile, DbError> {
    let handle = normalize_handle(&meta.handle);
    if handle.is_empty() {
        return Err(DbError::InvalidHandle(meta.handle.clone()));
    }

    // `xmax = 0` only holds for freshly inserted tuples.
    let (id, inserted) = sqlx::query_as::<_, (i64, bool)>(
        "INSERT INTO profiles \
           (handle, external_id, display_name, bio, avatar_url, followers_count, \
            following_count, tweet_count, is_verified, account_created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (handle) DO UPDATE SET \
           external_id        = COALESCE(EXCLUDED.external_id, profiles.external_id), \
           display_name       = COALESCE(EXCLUDED.display_name, profiles.display_name), \
           bio                = COALESCE(EXCLUDED.bio, profiles.bio), \
           avatar_url         = COALESCE(EXCLUDED.avatar_url, profiles.avatar_url), \
           followers_count    = EXCLUDED.followers_count, \
           following_count    = EXCLUDED.following_count, \
           tweet_count        = EXCLUDED.tweet_count, \
           is_verified        = EXCLUDED.is_verified, \
           account_created_at = COALESCE(EXCLUDED.account_created_at, profiles.account_created_at), \
           updated_at         = NOW() \
         RETURNING id, (xmax = 0) AS inserted",
    )
    .bind(&handle)
    .bind(meta.external_id.as_deref())
    .bind(meta.display_name.as_deref())
    .bind(meta.bio.as_deref())
    .bind(meta.avatar_url.as_deref())
    .bind(meta.followers_count)
    .bind(meta.following_count)
    .bind(meta.tweet_count)
    .bind(meta.is_verified)
    .bind(meta.account_created_at)
    .fetch_one(pool)
    .await?;

    Ok(UpsertedProfile { id, inserted })
}

/// Store a fresh score bundle and stamp `last_scored_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no profile has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_profile_scores(
    pool: &PgPool,
    profile_id: i64,
    scores: &ScoreBundle,
    scored_at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE profiles SET \
           akari_score        = $1, \
           authenticity_score = $2, \
           influence_score    = $3, \
           signal_score       = $4, \
           farm_risk_score    = $5, \
           last_scored_at     = $6, \
           updated_at         = NOW() \
         WHERE id = $7",
    )
    .bind(scores.akari_score)
    .bind(scores.authenticity)
    .bind(scores.influence)
    .bind(scores.signal_density)
    .bind(scores.farm_risk)
    .bind(scored_at)
    .bind(profile_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Profiles never scored or last scored before `stale_before`, biggest
/// accounts first, capped at `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_profiles_due_for_rescore(
    pool: &PgPool,
    stale_before: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ProfileRow>, DbError> {
    let rows = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} \
         FROM profiles \
         WHERE last_scored_at IS NULL OR last_scored_at < $1 \
         ORDER BY followers_count DESC, handle ASC \
         LIMIT $2"
    ))
    .bind(stale_before)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every profile that has been scored at least once, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scored_profiles(pool: &PgPool) -> Result<Vec<ProfileRow>, DbError> {
    let rows = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} \
         FROM profiles \
         WHERE last_scored_at IS NOT NULL \
         ORDER BY id ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Look up a profile by handle (any casing, with or without `@`).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_profile_by_handle(
    pool: &PgPool,
    handle: &str,
) -> Result<Option<ProfileRow>, DbError> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE handle = $1"
    ))
    .bind(normalize_handle(handle))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
