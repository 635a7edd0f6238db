//! Cron-driven engine runs.
//!
//! Registers a single engine job on [`JobScheduler`] and keeps the process
//! alive until ctrl-c or SIGTERM.

use std::sync::Arc;

use akari_circles::RunOptions;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::engine::run_engine_once;

/// Start the scheduler and block until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be built, the cron expression is
/// rejected, or shutdown fails.
pub(crate) async fn run_schedule(pool: PgPool, config: akari_core::AppConfig) -> anyhow::Result<()> {
    let mut scheduler = build_scheduler(pool, Arc::new(config)).await?;
    shutdown_signal().await;
    scheduler.shutdown().await?;
    Ok(())
}

/// Builds and starts the job scheduler with the engine job registered.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
async fn build_scheduler(
    pool: PgPool,
    config: Arc<akari_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_engine_job(&scheduler, pool, config).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the engine job on `AKARI_ENGINE_CRON` (daily 03:00 UTC by default).
async fn register_engine_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<akari_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let cron = config.engine_cron.clone();
    let pool = Arc::new(pool);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting engine run");
            run_scheduled_engine(&pool, &config).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered engine job");
    Ok(())
}

/// Runs started before this instant count as abandoned.
fn abandoned_before(now: DateTime<Utc>, timeout_mins: i64) -> DateTime<Utc> {
    now - Duration::minutes(timeout_mins.max(1))
}

/// One scheduled tick. Closes abandoned runs, then skips when another run is
/// still `running`.
async fn run_scheduled_engine(pool: &PgPool, config: &akari_core::AppConfig) {
    let cutoff = abandoned_before(Utc::now(), config.engine_run_timeout_mins);
    match akari_db::fail_abandoned_engine_runs(pool, cutoff).await {
        Ok(0) => {}
        Ok(closed) => tracing::warn!(
            closed,
            timeout_mins = config.engine_run_timeout_mins,
            "scheduler: marked abandoned engine runs as failed"
        ),
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to close abandoned engine runs");
            return;
        }
    }

    match akari_db::has_running_engine_run(pool).await {
        Ok(true) => {
            tracing::warn!("scheduler: an engine run is already running; skipping tick");
            return;
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to check for running engine runs");
            return;
        }
    }

    match run_engine_once(pool, config, "scheduler", &RunOptions::default()).await {
        Ok(summary) => tracing::info!(
            global_circle_size = summary.global_circle_size,
            projects_processed = summary.projects_processed,
            competitor_edges = summary.competitor_edges,
            item_failures = summary.item_failures,
            "scheduler: engine run complete"
        ),
        Err(e) => tracing::error!(error = %e, "scheduler: engine run failed"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandoned_cutoff_is_timeout_before_now() {
        let now = Utc::now();
        assert_eq!(abandoned_before(now, 360), now - Duration::hours(6));
    }

    #[test]
    fn abandoned_cutoff_never_reaches_now() {
        let now = Utc::now();
        assert!(abandoned_before(now, 0) < now);
    }
}
