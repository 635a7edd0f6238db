//! Persistence seam for the engine.
//!
//! [`CircleStore`] covers exactly the reads and writes one run needs.
//! [`PgCircleStore`] forwards to `akari-db`; tests plug in an in-memory store.

use akari_core::{ProfileMetadata, ScoreBundle};
use akari_db::{
    NewGlobalCircleMember, NewProjectCircleMember, NewProjectCompetitor, ProfileRow, ProjectRow,
    ProjectStats, UpsertedProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::EngineError;

#[async_trait]
pub trait CircleStore: Send + Sync {
    async fn list_active_projects(&self) -> Result<Vec<ProjectRow>, EngineError>;

    /// Fill a project's handle only if it is still unset.
    async fn set_project_handle_if_missing(
        &self,
        project_id: i64,
        handle: &str,
    ) -> Result<bool, EngineError>;

    /// Insert or refresh profile metadata by normalized handle; scores untouched.
    async fn upsert_profile(&self, meta: &ProfileMetadata) -> Result<UpsertedProfile, EngineError>;

    async fn profiles_due_for_rescore(
        &self,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProfileRow>, EngineError>;

    async fn update_profile_scores(
        &self,
        profile_id: i64,
        scores: &ScoreBundle,
        scored_at: DateTime<Utc>,
    ) -> Result<(), EngineError>;

    async fn scored_profiles(&self) -> Result<Vec<ProfileRow>, EngineError>;

    /// Atomically replace the whole global circle.
    ///
    /// In the same step, project circle members outside the new circle are
    /// dropped, the affected projects' count and power are recomputed, and
    /// their competitor edges in both directions are cleared.
    async fn replace_global_circle(
        &self,
        members: &[NewGlobalCircleMember],
    ) -> Result<usize, EngineError>;

    /// Atomically replace one project's circle and stats.
    async fn replace_project_circle(
        &self,
        project_id: i64,
        members: &[NewProjectCircleMember],
        stats: &ProjectStats,
    ) -> Result<usize, EngineError>;

    /// Atomically replace one project's outgoing competitor edges.
    async fn replace_project_competitors(
        &self,
        project_id: i64,
        edges: &[NewProjectCompetitor],
    ) -> Result<usize, EngineError>;
}

/// [`CircleStore`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgCircleStore {
    pool: PgPool,
}

impl PgCircleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CircleStore for PgCircleStore {
    async fn list_active_projects(&self) -> Result<Vec<ProjectRow>, EngineError> {
        Ok(akari_db::list_active_projects(&self.pool).await?)
    }

    async fn set_project_handle_if_missing(
        &self,
        project_id: i64,
        handle: &str,
    ) -> Result<bool, EngineError> {
        Ok(akari_db::set_project_handle_if_missing(&self.pool, project_id, handle).await?)
    }

    async fn upsert_profile(&self, meta: &ProfileMetadata) -> Result<UpsertedProfile, EngineError> {
        Ok(akari_db::upsert_profile_metadata(&self.pool, meta).await?)
    }

    async fn profiles_due_for_rescore(
        &self,
        stale_before: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProfileRow>, EngineError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(akari_db::list_profiles_due_for_rescore(&self.pool, stale_before, limit).await?)
    }

    async fn update_profile_scores(
        &self,
        profile_id: i64,
        scores: &ScoreBundle,
        scored_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        Ok(akari_db::update_profile_scores(&self.pool, profile_id, scores, scored_at).await?)
    }

    async fn scored_profiles(&self) -> Result<Vec<ProfileRow>, EngineError> {
        Ok(akari_db::list_scored_profiles(&self.pool).await?)
    }

    async fn replace_global_circle(
        &self,
        members: &[NewGlobalCircleMember],
    ) -> Result<usize, EngineError> {
        Ok(akari_db::replace_global_circle(&self.pool, members).await?)
    }

    async fn replace_project_circle(
        &self,
        project_id: i64,
        members: &[NewProjectCircleMember],
        stats: &ProjectStats,
    ) -> Result<usize, EngineError> {
        Ok(akari_db::replace_project_circle(&self.pool, project_id, members, stats).await?)
    }

    async fn replace_project_competitors(
        &self,
        project_id: i64,
        edges: &[NewProjectCompetitor],
    ) -> Result<usize, EngineError> {
        Ok(akari_db::replace_project_competitors(&self.pool, project_id, edges).await?)
    }
}
