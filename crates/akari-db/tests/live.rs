//! Live integration tests for akari-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. `"../../migrations"` is relative to `crates/akari-db/`.

use akari_core::{ProfileMetadata, ProjectConfig, ScoreBundle};
use akari_db::{
    complete_engine_run, create_engine_run, fail_abandoned_engine_runs, fail_engine_run,
    get_engine_run, get_profile_by_handle, get_project_by_slug, has_running_engine_run,
    list_active_projects, list_engine_runs, list_global_circle, list_profiles_due_for_rescore,
    list_project_circle, list_project_competitors, list_scored_profiles, replace_global_circle,
    replace_project_circle, replace_project_competitors, seed_projects,
    set_project_handle_if_missing, start_engine_run, update_profile_scores,
    upsert_profile_metadata, DbError, EngineRunTotals, NewGlobalCircleMember,
    NewProjectCircleMember, NewProjectCompetitor, ProjectStats,
};
use chrono::{Duration, Utc};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn meta(handle: &str, followers: i64) -> ProfileMetadata {
    ProfileMetadata {
        handle: handle.to_string(),
        display_name: Some(format!("Display {handle}")),
        followers_count: followers,
        ..ProfileMetadata::default()
    }
}

fn scores(influence: f64) -> ScoreBundle {
    ScoreBundle {
        akari_score: 70.0,
        authenticity: 80.0,
        influence,
        signal_density: 60.0,
        farm_risk: 10.0,
    }
}

async fn insert_profile(pool: &sqlx::PgPool, handle: &str, followers: i64) -> i64 {
    upsert_profile_metadata(pool, &meta(handle, followers))
        .await
        .unwrap_or_else(|e| panic!("upsert failed for '{handle}': {e}"))
        .id
}

async fn seed(pool: &sqlx::PgPool, names: &[(&str, Option<&str>)]) {
    let configs: Vec<ProjectConfig> = names
        .iter()
        .map(|(name, handle)| ProjectConfig {
            name: (*name).to_string(),
            x_handle: handle.map(str::to_string),
            is_active: true,
        })
        .collect();
    seed_projects(pool, &configs).await.expect("seed failed");
}

async fn project_id(pool: &sqlx::PgPool, slug: &str) -> i64 {
    get_project_by_slug(pool, slug)
        .await
        .expect("query failed")
        .unwrap_or_else(|| panic!("project '{slug}' missing"))
        .id
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn profile_upsert_is_keyed_by_normalized_handle(pool: sqlx::PgPool) {
    let first = upsert_profile_metadata(&pool, &meta("@Alice", 10))
        .await
        .unwrap();
    let second = upsert_profile_metadata(&pool, &meta("alice", 25))
        .await
        .unwrap();

    assert!(first.inserted);
    assert!(!second.inserted);
    assert_eq!(first.id, second.id);

    let row = get_profile_by_handle(&pool, "ALICE").await.unwrap().unwrap();
    assert_eq!(row.handle, "alice");
    assert_eq!(row.followers_count, 25);
}

#[sqlx::test(migrations = "../../migrations")]
async fn profile_upsert_rejects_empty_handle(pool: sqlx::PgPool) {
    let err = upsert_profile_metadata(&pool, &meta("@", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidHandle(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn metadata_refresh_keeps_scores(pool: sqlx::PgPool) {
    let id = insert_profile(&pool, "bob", 100).await;
    update_profile_scores(&pool, id, &scores(55.0), Utc::now())
        .await
        .unwrap();

    insert_profile(&pool, "bob", 120).await;

    let row = get_profile_by_handle(&pool, "bob").await.unwrap().unwrap();
    assert_eq!(row.influence_score, Some(55.0));
    assert!(row.last_scored_at.is_some());
    assert_eq!(row.followers_count, 120);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_scores_for_missing_profile_is_not_found(pool: sqlx::PgPool) {
    let err = update_profile_scores(&pool, 999_999, &scores(1.0), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rescore_selection_orders_by_followers_and_skips_fresh(pool: sqlx::PgPool) {
    let small = insert_profile(&pool, "small", 10).await;
    let big = insert_profile(&pool, "big", 10_000).await;
    let fresh = insert_profile(&pool, "fresh", 50_000).await;
    let stale = insert_profile(&pool, "stale", 500).await;

    let now = Utc::now();
    update_profile_scores(&pool, fresh, &scores(1.0), now)
        .await
        .unwrap();
    update_profile_scores(&pool, stale, &scores(1.0), now - Duration::days(8))
        .await
        .unwrap();

    let due = list_profiles_due_for_rescore(&pool, now - Duration::days(7), 10)
        .await
        .unwrap();
    let ids: Vec<i64> = due.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![big, stale, small]);

    let capped = list_profiles_due_for_rescore(&pool, now - Duration::days(7), 1)
        .await
        .unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id, big);

    let scored = list_scored_profiles(&pool).await.unwrap();
    let scored_ids: Vec<i64> = scored.iter().map(|p| p.id).collect();
    assert_eq!(scored_ids, vec![fresh, stale]);
}

// ---------------------------------------------------------------------------
// Global circle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn global_circle_replace_drops_stale_rows(pool: sqlx::PgPool) {
    let a = insert_profile(&pool, "a", 1).await;
    let b = insert_profile(&pool, "b", 1).await;

    let member = |profile_id: i64, rank: i32| NewGlobalCircleMember {
        profile_id,
        rank,
        akari_score: 60.0,
        influence_score: 50.0,
        segment: "general".to_string(),
    };

    let inserted = replace_global_circle(&pool, &[member(a, 1), member(b, 2)])
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    replace_global_circle(&pool, &[member(b, 1)]).await.unwrap();
    let rows = list_global_circle(&pool, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].profile_id, b);
    assert_eq!(rows[0].handle, "b");

    replace_global_circle(&pool, &[]).await.unwrap();
    assert!(list_global_circle(&pool, None).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn global_circle_shrink_prunes_project_circles_and_their_edges(pool: sqlx::PgPool) {
    seed(&pool, &[("Aave", None), ("Compound", None), ("Maker", None)]).await;
    let aave = project_id(&pool, "aave").await;
    let compound = project_id(&pool, "compound").await;
    let maker = project_id(&pool, "maker").await;
    let kept = insert_profile(&pool, "kept", 1).await;
    let dropped = insert_profile(&pool, "dropped", 1).await;

    let global = |profile_id: i64, rank: i32, influence: f64| NewGlobalCircleMember {
        profile_id,
        rank,
        akari_score: 60.0,
        influence_score: influence,
        segment: "general".to_string(),
    };
    let follower = |profile_id: i64| NewProjectCircleMember {
        profile_id,
        is_follower: true,
        is_author: false,
        weight: 1.0,
        last_interaction_at: None,
    };
    let edge = |target: i64| NewProjectCompetitor {
        competitor_project_id: target,
        rank: 1,
        common_count: 1,
        common_power: 10.0,
        similarity: 0.5,
    };
    let stats = |count: usize, power: f64| ProjectStats {
        circle_count: count,
        circle_power: power,
        quality_follower_ratio: 0.5,
    };

    replace_global_circle(&pool, &[global(kept, 1, 70.0), global(dropped, 2, 30.0)])
        .await
        .unwrap();
    replace_project_circle(&pool, aave, &[follower(kept), follower(dropped)], &stats(2, 100.0))
        .await
        .unwrap();
    replace_project_circle(&pool, compound, &[follower(kept)], &stats(1, 70.0))
        .await
        .unwrap();
    replace_project_competitors(&pool, aave, &[edge(compound)]).await.unwrap();
    replace_project_competitors(&pool, compound, &[edge(aave)]).await.unwrap();
    replace_project_competitors(&pool, maker, &[edge(compound)]).await.unwrap();

    replace_global_circle(&pool, &[global(kept, 1, 70.0)]).await.unwrap();

    let aave_members: Vec<i64> = list_project_circle(&pool, aave)
        .await
        .unwrap()
        .iter()
        .map(|m| m.profile_id)
        .collect();
    assert_eq!(aave_members, vec![kept]);
    assert_eq!(list_project_circle(&pool, compound).await.unwrap().len(), 1);

    let project = get_project_by_slug(&pool, "aave").await.unwrap().unwrap();
    assert_eq!(project.inner_circle_count, 1);
    assert!((project.inner_circle_power - 70.0).abs() < 1e-9);
    assert!((project.quality_follower_ratio - 0.5).abs() < 1e-9);

    // Edges touching the pruned project go; unrelated edges stay.
    assert!(list_project_competitors(&pool, aave).await.unwrap().is_empty());
    assert!(list_project_competitors(&pool, compound).await.unwrap().is_empty());
    assert_eq!(list_project_competitors(&pool, maker).await.unwrap().len(), 1);

    replace_global_circle(&pool, &[]).await.unwrap();
    assert!(list_project_circle(&pool, compound).await.unwrap().is_empty());
    let project = get_project_by_slug(&pool, "compound").await.unwrap().unwrap();
    assert_eq!(project.inner_circle_count, 0);
    assert!(project.inner_circle_power.abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Projects, project circles, competitors
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_never_clears_an_existing_handle(pool: sqlx::PgPool) {
    seed(&pool, &[("Jupiter", Some("@JupiterExchange"))]).await;
    seed(&pool, &[("Jupiter", None)]).await;

    let project = get_project_by_slug(&pool, "jupiter").await.unwrap().unwrap();
    assert_eq!(project.x_handle.as_deref(), Some("jupiterexchange"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn discovered_handle_only_fills_empty_slot(pool: sqlx::PgPool) {
    seed(&pool, &[("Lido", None), ("Aave", Some("aave"))]).await;
    let lido = project_id(&pool, "lido").await;
    let aave = project_id(&pool, "aave").await;

    assert!(set_project_handle_if_missing(&pool, lido, "lidofinance")
        .await
        .unwrap());
    assert!(!set_project_handle_if_missing(&pool, lido, "other")
        .await
        .unwrap());
    assert!(!set_project_handle_if_missing(&pool, aave, "impostor")
        .await
        .unwrap());

    let projects = list_active_projects(&pool).await.unwrap();
    let handles: Vec<Option<&str>> = projects.iter().map(|p| p.x_handle.as_deref()).collect();
    assert_eq!(handles, vec![Some("lidofinance"), Some("aave")]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn project_circle_replace_writes_members_and_stats(pool: sqlx::PgPool) {
    seed(&pool, &[("Aave", Some("aave"))]).await;
    let aave = project_id(&pool, "aave").await;
    let p1 = insert_profile(&pool, "p1", 1).await;
    let p2 = insert_profile(&pool, "p2", 1).await;

    let members = vec![
        NewProjectCircleMember {
            profile_id: p1,
            is_follower: true,
            is_author: true,
            weight: 1.5,
            last_interaction_at: Some(Utc::now()),
        },
        NewProjectCircleMember {
            profile_id: p2,
            is_follower: true,
            is_author: false,
            weight: 0.4,
            last_interaction_at: None,
        },
    ];
    let stats = ProjectStats {
        circle_count: 2,
        circle_power: 130.0,
        quality_follower_ratio: 0.25,
    };
    replace_project_circle(&pool, aave, &members, &stats)
        .await
        .unwrap();

    let rows = list_project_circle(&pool, aave).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].profile_id, p1);
    assert!(rows[0].is_follower && rows[0].is_author);

    let project = get_project_by_slug(&pool, "aave").await.unwrap().unwrap();
    assert_eq!(project.inner_circle_count, 2);
    assert!((project.inner_circle_power - 130.0).abs() < 1e-9);
    assert!(project.stats_updated_at.is_some());

    let empty = ProjectStats {
        circle_count: 0,
        circle_power: 0.0,
        quality_follower_ratio: 0.0,
    };
    replace_project_circle(&pool, aave, &[], &empty).await.unwrap();
    assert!(list_project_circle(&pool, aave).await.unwrap().is_empty());
    let project = get_project_by_slug(&pool, "aave").await.unwrap().unwrap();
    assert_eq!(project.inner_circle_count, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn project_circle_replace_for_unknown_project_rolls_back(pool: sqlx::PgPool) {
    let stats = ProjectStats {
        circle_count: 0,
        circle_power: 0.0,
        quality_follower_ratio: 0.0,
    };
    let err = replace_project_circle(&pool, 424_242, &[], &stats)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn competitor_replace_orders_by_rank_and_rejects_self_edges(pool: sqlx::PgPool) {
    seed(&pool, &[("Aave", None), ("Compound", None), ("Maker", None)]).await;
    let aave = project_id(&pool, "aave").await;
    let compound = project_id(&pool, "compound").await;
    let maker = project_id(&pool, "maker").await;

    let edges = vec![
        NewProjectCompetitor {
            competitor_project_id: maker,
            rank: 2,
            common_count: 1,
            common_power: 40.0,
            similarity: 0.25,
        },
        NewProjectCompetitor {
            competitor_project_id: compound,
            rank: 1,
            common_count: 3,
            common_power: 210.0,
            similarity: 0.6,
        },
    ];
    replace_project_competitors(&pool, aave, &edges).await.unwrap();

    let rows = list_project_competitors(&pool, aave).await.unwrap();
    let slugs: Vec<&str> = rows.iter().map(|r| r.competitor_slug.as_str()).collect();
    assert_eq!(slugs, vec!["compound", "maker"]);

    let self_edge = NewProjectCompetitor {
        competitor_project_id: aave,
        rank: 1,
        common_count: 1,
        common_power: 1.0,
        similarity: 1.0,
    };
    assert!(replace_project_competitors(&pool, aave, &[self_edge])
        .await
        .is_err());
    // The failed replace must not have cleared the previous edges.
    assert_eq!(list_project_competitors(&pool, aave).await.unwrap().len(), 2);

    replace_project_competitors(&pool, aave, &[]).await.unwrap();
    assert!(list_project_competitors(&pool, aave).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Engine runs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn engine_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let run = create_engine_run(&pool, "cli").await.unwrap();
    assert_eq!(run.status, "queued");
    assert!(!has_running_engine_run(&pool).await.unwrap());

    start_engine_run(&pool, run.id).await.unwrap();
    assert!(has_running_engine_run(&pool).await.unwrap());

    let totals = EngineRunTotals {
        profiles_discovered: 12,
        profiles_scored: 5,
        global_circle_size: 3,
        projects_processed: 2,
        competitor_edges: 2,
        failures: 1,
    };
    complete_engine_run(&pool, run.id, &totals).await.unwrap();

    let row = get_engine_run(&pool, run.id).await.unwrap();
    assert_eq!(row.status, "succeeded");
    assert_eq!(row.profiles_discovered, 12);
    assert_eq!(row.failures, 1);
    assert!(row.completed_at.is_some());
    assert!(!has_running_engine_run(&pool).await.unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn engine_run_transitions_are_guarded(pool: sqlx::PgPool) {
    let run = create_engine_run(&pool, "scheduler").await.unwrap();

    let err = complete_engine_run(&pool, run.id, &EngineRunTotals::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::InvalidEngineRunTransition {
            expected_status: "running",
            ..
        }
    ));

    start_engine_run(&pool, run.id).await.unwrap();
    fail_engine_run(&pool, run.id, "boom").await.unwrap();

    let row = get_engine_run(&pool, run.id).await.unwrap();
    assert_eq!(row.status, "failed");
    assert_eq!(row.error_message.as_deref(), Some("boom"));

    assert!(start_engine_run(&pool, run.id).await.is_err());
}

#[sqlx::test(migrations = "../../migrations")]
async fn abandoned_running_run_is_failed_and_stops_blocking(pool: sqlx::PgPool) {
    let orphan = create_engine_run(&pool, "scheduler").await.unwrap();
    start_engine_run(&pool, orphan.id).await.unwrap();
    sqlx::query("UPDATE engine_runs SET started_at = NOW() - INTERVAL '30 days' WHERE id = $1")
        .bind(orphan.id)
        .execute(&pool)
        .await
        .unwrap();

    let live = create_engine_run(&pool, "cli").await.unwrap();
    start_engine_run(&pool, live.id).await.unwrap();

    let closed = fail_abandoned_engine_runs(&pool, Utc::now() - Duration::hours(6))
        .await
        .unwrap();
    assert_eq!(closed, 1);

    let row = get_engine_run(&pool, orphan.id).await.unwrap();
    assert_eq!(row.status, "failed");
    assert!(row.completed_at.is_some());
    assert!(row.error_message.unwrap().starts_with("abandoned"));

    // The recent run is untouched and still blocks.
    assert_eq!(get_engine_run(&pool, live.id).await.unwrap().status, "running");
    assert!(has_running_engine_run(&pool).await.unwrap());

    complete_engine_run(&pool, live.id, &EngineRunTotals::default())
        .await
        .unwrap();
    assert!(!has_running_engine_run(&pool).await.unwrap());

    let runs = list_engine_runs(&pool, 10).await.unwrap();
    let ids: Vec<i64> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![live.id, orphan.id]);
}
