//! Batch orchestrator: one sequential pass over every phase.
//!
//! `Discover → Score → BuildGlobalCircle → BuildProjectCircles →
//! ComputeCompetitors → Done`. Per-item failures are logged, counted, and
//! treated as zero contribution. Only the whole-run steps (loading projects,
//! loading scored profiles, replacing the global circle) abort the run.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use akari_core::{normalize_handle, ProfileMetadata, ScoringOracle, SocialDataSource};
use akari_db::{EngineRunTotals, NewGlobalCircleMember, NewProjectCompetitor, ProjectRow};
use chrono::Utc;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::global_circle::select_global_circle;
use crate::project_circle::{
    build_project_circle, fetch_project_signals, GlobalCircleIndex, ProjectSignals,
};
use crate::rescoring::stale_cutoff;
use crate::similarity::compute_competitors;
use crate::store::CircleStore;
use crate::throttle::Throttle;

/// Upper bound on handle-search candidates inspected per project.
const HANDLE_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discover,
    Score,
    BuildGlobalCircle,
    BuildProjectCircles,
    ComputeCompetitors,
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Discover => "discover",
            Phase::Score => "score",
            Phase::BuildGlobalCircle => "build_global_circle",
            Phase::BuildProjectCircles => "build_project_circles",
            Phase::ComputeCompetitors => "compute_competitors",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Per-invocation overrides.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides [`EngineConfig::rescore_batch_size`] for this run.
    pub batch_size: Option<usize>,
}

/// Counters reported at the end of every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineRunSummary {
    /// Profiles created for the first time during discovery.
    pub profiles_discovered: usize,
    /// Due profiles whose metadata was re-fetched before scoring.
    pub profiles_refreshed: usize,
    pub profiles_scored: usize,
    /// Oracle calls that returned no score.
    pub score_failures: usize,
    pub global_circle_size: usize,
    pub projects_processed: usize,
    /// Projects without a resolvable handle.
    pub projects_skipped: usize,
    pub competitor_edges: usize,
    /// Store writes or reads that failed for a single item.
    pub item_failures: usize,
}

impl EngineRunSummary {
    /// Counters in the shape recorded on the `engine_runs` row.
    #[must_use]
    pub fn totals(&self) -> EngineRunTotals {
        EngineRunTotals {
            profiles_discovered: self.profiles_discovered,
            profiles_scored: self.profiles_scored,
            global_circle_size: self.global_circle_size,
            projects_processed: self.projects_processed,
            competitor_edges: self.competitor_edges,
            failures: self.item_failures + self.score_failures,
        }
    }
}

/// A project that a run would touch, as reported by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedProject {
    pub id: i64,
    pub slug: String,
    pub name: String,
    /// `None` means the run would try handle discovery first.
    pub handle: Option<String>,
}

/// Lists the active projects a run would process. Reads only.
///
/// # Errors
///
/// Returns [`EngineError`] if the project list cannot be loaded.
pub async fn plan_run(store: &dyn CircleStore) -> Result<Vec<PlannedProject>, EngineError> {
    let projects = store.list_active_projects().await?;
    Ok(projects
        .into_iter()
        .map(|p| PlannedProject {
            handle: stored_handle(&p),
            id: p.id,
            slug: p.slug,
            name: p.name,
        })
        .collect())
}

/// A project whose handle resolved during discovery, with its signals.
struct DiscoveredProject {
    id: i64,
    slug: String,
    handle: String,
    signals: ProjectSignals,
}

/// Execute one full engine run.
///
/// # Errors
///
/// Returns [`EngineError`] when a whole-run step fails: loading the active
/// projects, loading the scored profiles, or replacing the global circle.
pub async fn run_engine(
    store: &dyn CircleStore,
    social: &dyn SocialDataSource,
    oracle: &dyn ScoringOracle,
    config: &EngineConfig,
    options: &RunOptions,
) -> Result<EngineRunSummary, EngineError> {
    let mut summary = EngineRunSummary::default();
    let mut throttle = Throttle::from_millis(config.inter_call_delay_ms);

    tracing::info!(phase = %Phase::Discover, "engine phase started");
    let projects = store.list_active_projects().await?;
    let mut seen: HashSet<String> = HashSet::new();
    let discovered = discover(
        store,
        social,
        &mut throttle,
        config,
        &projects,
        &mut seen,
        &mut summary,
    )
    .await;

    tracing::info!(phase = %Phase::Score, "engine phase started");
    let quota = options.batch_size.unwrap_or(config.rescore_batch_size);
    let clients = Collaborators { social, oracle };
    score_due_profiles(store, &clients, &mut throttle, config, quota, &seen, &mut summary).await;

    tracing::info!(phase = %Phase::BuildGlobalCircle, "engine phase started");
    let scored = store.scored_profiles().await?;
    let entries = select_global_circle(&scored, &config.thresholds, config.global_circle_max);
    let rows: Vec<NewGlobalCircleMember> = entries.iter().map(|e| e.to_new_member()).collect();
    store.replace_global_circle(&rows).await?;
    summary.global_circle_size = entries.len();
    tracing::info!(
        candidates = scored.len(),
        admitted = entries.len(),
        capacity = config.global_circle_max,
        "global circle replaced"
    );

    tracing::info!(phase = %Phase::BuildProjectCircles, "engine phase started");
    let index = GlobalCircleIndex::from_entries(&entries);
    let now = Utc::now();
    let mut circles: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for project in &discovered {
        let circle = build_project_circle(
            &project.handle,
            &project.signals,
            &index,
            now,
            config.quality_follower_min,
        );
        match store
            .replace_project_circle(project.id, &circle.members, &circle.stats)
            .await
        {
            Ok(count) => {
                tracing::info!(
                    project = %project.slug,
                    members = count,
                    power = circle.stats.circle_power,
                    quality_ratio = circle.stats.quality_follower_ratio,
                    "project circle replaced"
                );
                circles.insert(project.id, circle.member_ids().into_iter().collect());
                summary.projects_processed += 1;
            }
            Err(e) => {
                tracing::error!(project = %project.slug, error = %e, "failed to persist project circle");
                summary.item_failures += 1;
            }
        }
    }

    tracing::info!(phase = %Phase::ComputeCompetitors, "engine phase started");
    let influence = index.influence_by_id();
    let edges = compute_competitors(&circles, &influence);
    for (project_id, list) in &edges {
        let rows: Vec<NewProjectCompetitor> = list.iter().map(|e| e.to_new_competitor()).collect();
        match store.replace_project_competitors(*project_id, &rows).await {
            Ok(count) => summary.competitor_edges += count,
            Err(e) => {
                tracing::error!(project_id, error = %e, "failed to persist competitor edges");
                summary.item_failures += 1;
            }
        }
    }

    tracing::info!(
        phase = %Phase::Done,
        profiles_discovered = summary.profiles_discovered,
        profiles_refreshed = summary.profiles_refreshed,
        profiles_scored = summary.profiles_scored,
        score_failures = summary.score_failures,
        global_circle_size = summary.global_circle_size,
        projects_processed = summary.projects_processed,
        projects_skipped = summary.projects_skipped,
        competitor_edges = summary.competitor_edges,
        item_failures = summary.item_failures,
        "engine run finished"
    );

    Ok(summary)
}

/// Resolve handles, fetch signals, and upsert every sampled account.
///
/// `seen` collects the normalized handles upserted with fresh metadata.
async fn discover(
    store: &dyn CircleStore,
    social: &dyn SocialDataSource,
    throttle: &mut Throttle,
    config: &EngineConfig,
    projects: &[ProjectRow],
    seen: &mut HashSet<String>,
    summary: &mut EngineRunSummary,
) -> Vec<DiscoveredProject> {
    let mut discovered = Vec::with_capacity(projects.len());

    for project in projects {
        let Some(handle) = resolve_handle(store, social, throttle, project).await else {
            tracing::warn!(project = %project.slug, "no resolvable handle, skipping project");
            summary.projects_skipped += 1;
            continue;
        };

        let signals = fetch_project_signals(
            social,
            throttle,
            &handle,
            &project.name,
            config.follower_sample_size,
            config.mention_sample_size,
        )
        .await;

        let accounts = signals
            .followers
            .iter()
            .chain(signals.mentions.iter().map(|m| &m.author));
        for account in accounts {
            upsert_once(store, account, seen, summary).await;
        }

        discovered.push(DiscoveredProject {
            id: project.id,
            slug: project.slug.clone(),
            handle,
            signals,
        });
    }

    discovered
}

async fn upsert_once(
    store: &dyn CircleStore,
    account: &ProfileMetadata,
    seen: &mut HashSet<String>,
    summary: &mut EngineRunSummary,
) {
    let key = account.normalized_handle();
    if key.is_empty() || !seen.insert(key) {
        return;
    }
    match store.upsert_profile(account).await {
        Ok(upserted) if upserted.inserted => summary.profiles_discovered += 1,
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(handle = %account.handle, error = %e, "failed to upsert profile");
            summary.item_failures += 1;
        }
    }
}

/// The stored handle, or a one-time discovery through user search.
///
/// A discovered handle is persisted only while the stored one is still
/// unset, and is used for this run either way.
async fn resolve_handle(
    store: &dyn CircleStore,
    social: &dyn SocialDataSource,
    throttle: &mut Throttle,
    project: &ProjectRow,
) -> Option<String> {
    if let Some(handle) = stored_handle(project) {
        return Some(handle);
    }

    throttle.wait().await;
    let candidates = social.search_users(&project.name, HANDLE_SEARCH_LIMIT).await;
    let found = match_project_account(&project.name, &candidates)?;

    match store.set_project_handle_if_missing(project.id, &found).await {
        Ok(true) => tracing::info!(project = %project.slug, handle = %found, "discovered project handle"),
        Ok(false) => tracing::debug!(project = %project.slug, "project handle was set concurrently"),
        Err(e) => {
            tracing::warn!(project = %project.slug, error = %e, "failed to persist discovered handle");
        }
    }
    Some(found)
}

fn stored_handle(project: &ProjectRow) -> Option<String> {
    project
        .x_handle
        .as_deref()
        .map(normalize_handle)
        .filter(|h| !h.is_empty())
}

/// First candidate whose handle or display name matches the project name,
/// compared case-insensitively on alphanumerics only.
fn match_project_account(project_name: &str, candidates: &[ProfileMetadata]) -> Option<String> {
    let key = compact(project_name);
    if key.is_empty() {
        return None;
    }
    candidates
        .iter()
        .find(|c| {
            compact(&c.handle) == key || c.display_name.as_deref().is_some_and(|d| compact(d) == key)
        })
        .map(ProfileMetadata::normalized_handle)
        .filter(|h| !h.is_empty())
}

fn compact(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The two outbound collaborators used while scoring.
struct Collaborators<'a> {
    social: &'a dyn SocialDataSource,
    oracle: &'a dyn ScoringOracle,
}

/// Refresh metadata for, then score, every profile due for rescoring.
///
/// Profiles already refreshed during discovery (`fresh`) skip the metadata
/// call. A missing refresh or score leaves the stored row as it was.
async fn score_due_profiles(
    store: &dyn CircleStore,
    clients: &Collaborators<'_>,
    throttle: &mut Throttle,
    config: &EngineConfig,
    quota: usize,
    fresh: &HashSet<String>,
    summary: &mut EngineRunSummary,
) {
    let cutoff = stale_cutoff(Utc::now(), config.rescore_stale_days);
    let due = match store.profiles_due_for_rescore(cutoff, quota).await {
        Ok(due) => due,
        Err(e) => {
            tracing::error!(error = %e, "failed to load profiles due for rescoring");
            summary.item_failures += 1;
            return;
        }
    };
    tracing::info!(due = due.len(), quota, "rescoring profiles");

    for profile in &due {
        if !fresh.contains(&profile.handle) {
            refresh_metadata(store, clients.social, throttle, &profile.handle, summary).await;
        }

        throttle.wait().await;
        let Some(bundle) = clients.oracle.score(&profile.handle).await else {
            tracing::debug!(handle = %profile.handle, "no score returned");
            summary.score_failures += 1;
            continue;
        };
        match store
            .update_profile_scores(profile.id, &bundle, Utc::now())
            .await
        {
            Ok(()) => summary.profiles_scored += 1,
            Err(e) => {
                tracing::warn!(handle = %profile.handle, error = %e, "failed to store scores");
                summary.item_failures += 1;
            }
        }
    }
}

async fn refresh_metadata(
    store: &dyn CircleStore,
    social: &dyn SocialDataSource,
    throttle: &mut Throttle,
    handle: &str,
    summary: &mut EngineRunSummary,
) {
    throttle.wait().await;
    let Some(meta) = social.get_user_info(handle).await else {
        tracing::debug!(handle, "no metadata returned, keeping stored profile");
        return;
    };
    if meta.normalized_handle() != handle {
        tracing::debug!(handle, returned = %meta.handle, "metadata is for another account, ignoring");
        return;
    }
    match store.upsert_profile(&meta).await {
        Ok(_) => summary.profiles_refreshed += 1,
        Err(e) => {
            tracing::warn!(handle, error = %e, "failed to refresh profile metadata");
            summary.item_failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(handle: &str, name: Option<&str>) -> ProfileMetadata {
        ProfileMetadata {
            handle: handle.to_string(),
            display_name: name.map(str::to_string),
            ..ProfileMetadata::default()
        }
    }

    #[test]
    fn matches_on_handle_or_display_name() {
        let candidates = vec![
            candidate("lido_fan_club", Some("Lido Fans")),
            candidate("LidoFinance", Some("Lido")),
        ];
        assert_eq!(
            match_project_account("Lido", &candidates),
            Some("lidofinance".to_string())
        );
        assert_eq!(
            match_project_account("Jupiter Exchange", &[candidate("@JupiterExchange", None)]),
            Some("jupiterexchange".to_string())
        );
    }

    #[test]
    fn no_match_returns_none() {
        let candidates = vec![candidate("someone", Some("Someone Else"))];
        assert_eq!(match_project_account("Lido", &candidates), None);
        assert_eq!(match_project_account("", &candidates), None);
    }

    #[test]
    fn phase_labels() {
        assert_eq!(Phase::BuildProjectCircles.to_string(), "build_project_circles");
        assert_eq!(Phase::Done.to_string(), "done");
    }

    #[test]
    fn totals_fold_score_failures_into_failures() {
        let summary = EngineRunSummary {
            profiles_discovered: 4,
            score_failures: 2,
            item_failures: 1,
            ..EngineRunSummary::default()
        };
        let totals = summary.totals();
        assert_eq!(totals.profiles_discovered, 4);
        assert_eq!(totals.failures, 3);
    }
}
