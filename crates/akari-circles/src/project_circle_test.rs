use super::*;
use akari_core::Segment;
use chrono::Duration;

fn entry(profile_id: i64, handle: &str, akari: f64, influence: f64) -> GlobalCircleEntry {
    GlobalCircleEntry {
        profile_id,
        handle: handle.to_string(),
        rank: 1,
        akari_score: akari,
        influence_score: influence,
        segment: Segment::General,
    }
}

fn account(handle: &str, followers: i64, verified: bool) -> ProfileMetadata {
    ProfileMetadata {
        handle: handle.to_string(),
        followers_count: followers,
        is_verified: verified,
        ..ProfileMetadata::default()
    }
}

fn mention(author: &str, at: Option<DateTime<Utc>>) -> MentionResult {
    MentionResult {
        tweet_id: format!("t-{author}"),
        text: "gm".to_string(),
        author: account(author, 0, false),
        created_at: at,
        like_count: 0,
        reply_count: 0,
        retweet_count: 0,
        quote_count: 0,
    }
}

fn index() -> GlobalCircleIndex {
    GlobalCircleIndex::from_entries(&[
        entry(1, "alice", 80.0, 90.0),
        entry(2, "Bob", 60.0, 70.0),
        entry(3, "carol", 50.0, 50.0),
        entry(4, "aave", 99.0, 99.0),
    ])
}

#[test]
fn mention_query_quotes_display_name() {
    assert_eq!(mention_query("@Aave", "Aave"), "@aave OR \"Aave\"");
    assert_eq!(mention_query("lido", "  "), "@lido");
    assert_eq!(mention_query("x", "say \"hi\""), "@x OR \"say hi\"");
}

#[test]
fn followers_outside_global_circle_are_ignored() {
    let signals = ProjectSignals {
        followers: vec![account("alice", 10, false), account("stranger", 10, false)],
        mentions: vec![],
    };
    let circle = build_project_circle("aave", &signals, &index(), Utc::now(), 1000);

    assert_eq!(circle.member_ids(), vec![1]);
    assert!(circle.members[0].is_follower);
    assert!(!circle.members[0].is_author);
    assert_eq!(circle.members[0].last_interaction_at, None);
}

#[test]
fn follower_who_mentions_is_upgraded_with_latest_interaction() {
    let now = Utc::now();
    let older = now - Duration::days(3);
    let newer = now - Duration::days(1);
    let signals = ProjectSignals {
        followers: vec![account("alice", 10, false)],
        mentions: vec![mention("ALICE", Some(older)), mention("@alice", Some(newer))],
    };
    let circle = build_project_circle("aave", &signals, &index(), now, 1000);

    assert_eq!(circle.members.len(), 1);
    let m = &circle.members[0];
    assert!(m.is_follower && m.is_author);
    assert_eq!(m.last_interaction_at, Some(newer));
}

#[test]
fn author_only_member_is_created_from_mentions() {
    let signals = ProjectSignals {
        followers: vec![],
        mentions: vec![mention("bob", None)],
    };
    let circle = build_project_circle("aave", &signals, &index(), Utc::now(), 1000);

    assert_eq!(circle.member_ids(), vec![2]);
    assert!(!circle.members[0].is_follower);
    assert!(circle.members[0].is_author);
    // author-only, no interaction time: 1.5 × (0.1 + 0.9 × 0.6)
    assert!((circle.members[0].weight - 0.96).abs() < 1e-9);
}

#[test]
fn project_never_joins_its_own_circle() {
    let signals = ProjectSignals {
        followers: vec![account("@Aave", 10, false)],
        mentions: vec![mention("aave", Some(Utc::now()))],
    };
    let circle = build_project_circle("@AAVE", &signals, &index(), Utc::now(), 1000);
    assert!(circle.members.is_empty());
}

#[test]
fn members_are_subset_of_global_circle() {
    let idx = index();
    let signals = ProjectSignals {
        followers: vec![
            account("alice", 1, false),
            account("zed", 1, false),
            account("carol", 1, false),
        ],
        mentions: vec![mention("bob", None), mention("yolo", None)],
    };
    let circle = build_project_circle("aave", &signals, &idx, Utc::now(), 1000);
    let global: Vec<i64> = idx.influence_by_id().into_keys().collect();
    assert!(circle.member_ids().iter().all(|id| global.contains(id)));
    assert_eq!(circle.members.len(), 3);
}

#[test]
fn stats_count_power_and_quality_ratio() {
    let signals = ProjectSignals {
        followers: vec![
            account("alice", 5_000, false),
            account("bob", 10, true),
            account("nobody", 999, false),
            account("someone", 1_000, false),
        ],
        mentions: vec![],
    };
    let circle = build_project_circle("aave", &signals, &index(), Utc::now(), 1000);

    assert_eq!(circle.stats.circle_count, 2);
    assert!((circle.stats.circle_power - 160.0).abs() < 1e-9);
    assert!((circle.stats.quality_follower_ratio - 0.75).abs() < 1e-9);
}

#[test]
fn empty_signals_give_empty_circle_without_error() {
    let circle = build_project_circle(
        "aave",
        &ProjectSignals::default(),
        &index(),
        Utc::now(),
        1000,
    );
    assert!(circle.members.is_empty());
    assert_eq!(circle.stats.circle_count, 0);
    assert!(circle.stats.circle_power.abs() < f64::EPSILON);
    assert!(circle.stats.quality_follower_ratio.abs() < f64::EPSILON);
}

#[test]
fn members_sorted_by_weight_then_id() {
    let signals = ProjectSignals {
        followers: vec![account("carol", 1, false), account("alice", 1, false)],
        mentions: vec![mention("bob", None)],
    };
    let circle = build_project_circle("aave", &signals, &index(), Utc::now(), 1000);
    let weights: Vec<f64> = circle.members.iter().map(|m| m.weight).collect();
    assert!(weights.windows(2).all(|w| w[0] >= w[1]));
    // bob author-only 0.96, alice 0.82, carol 0.55
    assert_eq!(circle.member_ids(), vec![2, 1, 3]);
}

#[test]
fn quality_ratio_of_empty_sample_is_zero() {
    assert!(quality_follower_ratio(&[], 1000).abs() < f64::EPSILON);
}
