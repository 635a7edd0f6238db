//! Engine run handlers shared by `run` and the scheduler.
//!
//! Wraps one orchestrator pass in `engine_runs` bookkeeping:
//! create → start → run → complete, or fail on a whole-run error.

use akari_circles::{plan_run, run_engine, EngineConfig, EngineRunSummary, PgCircleStore, RunOptions};
use akari_social::{HttpScoringOracle, TwitterApiClient};

use crate::fail_run_best_effort;

/// Execute one engine run and record it in `engine_runs`.
///
/// Per-item failures are folded into the summary and do not fail the run.
///
/// # Errors
///
/// Returns an error if a client cannot be built, the run row cannot be
/// created or started, or the orchestrator reports a whole-run failure. In
/// the last two cases the row is marked `failed` on a best-effort basis.
pub(crate) async fn run_engine_once(
    pool: &sqlx::PgPool,
    config: &akari_core::AppConfig,
    trigger: &'static str,
    options: &RunOptions,
) -> anyhow::Result<EngineRunSummary> {
    let social = TwitterApiClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build social client: {e}"))?;
    let oracle = HttpScoringOracle::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build scoring client: {e}"))?;
    let store = PgCircleStore::new(pool.clone());
    let engine_config = EngineConfig::from_app_config(config);

    let run = akari_db::create_engine_run(pool, trigger).await?;
    if let Err(e) = akari_db::start_engine_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }
    tracing::info!(run_id = run.id, public_id = %run.public_id, trigger, "engine run started");

    let summary = match run_engine(&store, &social, &oracle, &engine_config, options).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(run_id = run.id, error = %e, "engine run failed");
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    if let Err(e) = akari_db::complete_engine_run(pool, run.id, &summary.totals()).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    Ok(summary)
}

/// Print the projects a run would touch. Reads only; no run row is created.
///
/// # Errors
///
/// Returns an error if the project list cannot be loaded.
pub(crate) async fn run_dry(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let store = PgCircleStore::new(pool.clone());
    let plan = plan_run(&store).await?;

    if plan.is_empty() {
        println!("dry-run: no active projects; run `akari-cli db seed` first");
        return Ok(());
    }

    println!("dry-run: would process {} project(s)", plan.len());
    for project in &plan {
        match &project.handle {
            Some(handle) => println!("  {:<24} @{handle}", project.slug),
            None => println!("  {:<24} (handle to be discovered)", project.slug),
        }
    }
    Ok(())
}

pub(crate) fn print_summary(summary: &EngineRunSummary) {
    println!("engine run complete");
    println!("  profiles discovered : {}", summary.profiles_discovered);
    println!("  profiles refreshed  : {}", summary.profiles_refreshed);
    println!("  profiles scored     : {}", summary.profiles_scored);
    println!("  score failures      : {}", summary.score_failures);
    println!("  global circle size  : {}", summary.global_circle_size);
    println!("  projects processed  : {}", summary.projects_processed);
    println!("  projects skipped    : {}", summary.projects_skipped);
    println!("  competitor edges    : {}", summary.competitor_edges);
    println!("  item failures       : {}", summary.item_failures);
}
