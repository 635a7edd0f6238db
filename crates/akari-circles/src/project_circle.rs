//! Per-project weighted circles built from follower and mention signals.

use std::collections::{BTreeMap, HashMap};

use akari_core::{normalize_handle, MentionResult, MentionSort, ProfileMetadata, SocialDataSource};
use akari_db::{NewProjectCircleMember, ProjectStats};
use chrono::{DateTime, Utc};

use crate::global_circle::GlobalCircleEntry;
use crate::throttle::Throttle;
use crate::weight::{days_since, member_weight, MemberRole};

/// Global circle snapshot fields a project member inherits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedMember {
    pub profile_id: i64,
    pub akari_score: f64,
    pub influence_score: f64,
}

/// Global circle members keyed by normalized handle.
#[derive(Debug, Clone, Default)]
pub struct GlobalCircleIndex {
    by_handle: HashMap<String, IndexedMember>,
}

impl GlobalCircleIndex {
    #[must_use]
    pub fn from_entries(entries: &[GlobalCircleEntry]) -> Self {
        let by_handle = entries
            .iter()
            .map(|e| {
                (
                    normalize_handle(&e.handle),
                    IndexedMember {
                        profile_id: e.profile_id,
                        akari_score: e.akari_score,
                        influence_score: e.influence_score,
                    },
                )
            })
            .collect();
        Self { by_handle }
    }

    #[must_use]
    pub fn get(&self, handle: &str) -> Option<&IndexedMember> {
        self.by_handle.get(&normalize_handle(handle))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Profile id → snapshot influence, for power sums.
    #[must_use]
    pub fn influence_by_id(&self) -> HashMap<i64, f64> {
        self.by_handle
            .values()
            .map(|m| (m.profile_id, m.influence_score))
            .collect()
    }
}

/// Raw signals fetched for one project during discovery.
#[derive(Debug, Clone, Default)]
pub struct ProjectSignals {
    pub followers: Vec<ProfileMetadata>,
    pub mentions: Vec<MentionResult>,
}

/// Members plus the denormalized stats for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCircle {
    pub members: Vec<NewProjectCircleMember>,
    pub stats: ProjectStats,
}

impl ProjectCircle {
    /// Profile ids of all members.
    #[must_use]
    pub fn member_ids(&self) -> Vec<i64> {
        self.members.iter().map(|m| m.profile_id).collect()
    }
}

/// Mention search query: the handle or the quoted display name.
#[must_use]
pub fn mention_query(handle: &str, display_name: &str) -> String {
    let handle = normalize_handle(handle);
    let name = display_name.replace('"', "");
    let name = name.trim();
    if name.is_empty() {
        format!("@{handle}")
    } else {
        format!("@{handle} OR \"{name}\"")
    }
}

/// Fetch the follower sample and mention set for one project.
///
/// Each call waits on `throttle` first. A failed fetch yields an empty
/// contribution; the social client logs the failure.
pub async fn fetch_project_signals(
    social: &dyn SocialDataSource,
    throttle: &mut Throttle,
    handle: &str,
    display_name: &str,
    follower_sample_size: usize,
    mention_sample_size: usize,
) -> ProjectSignals {
    throttle.wait().await;
    let followers = social.get_followers(handle, follower_sample_size).await;

    throttle.wait().await;
    let query = mention_query(handle, display_name);
    let mentions = social
        .search_mentions(&query, MentionSort::Latest, mention_sample_size)
        .await;

    tracing::debug!(
        handle,
        followers = followers.len(),
        mentions = mentions.len(),
        "fetched project signals"
    );

    ProjectSignals {
        followers,
        mentions,
    }
}

/// Fraction of the raw follower sample with at least `min_followers`
/// followers or a verification badge. `0.0` for an empty sample.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn quality_follower_ratio(followers: &[ProfileMetadata], min_followers: i64) -> f64 {
    if followers.is_empty() {
        return 0.0;
    }
    let quality = followers
        .iter()
        .filter(|f| f.followers_count >= min_followers || f.is_verified)
        .count();
    quality as f64 / followers.len() as f64
}

#[derive(Debug, Clone, Copy)]
struct Draft {
    member: IndexedMember,
    is_follower: bool,
    is_author: bool,
    last_interaction_at: Option<DateTime<Utc>>,
}

/// Build a project's circle from its signals.
///
/// Only global circle members are admitted, and never the project's own
/// account. Followers are applied first; a mention by an existing follower
/// upgrades that record, otherwise it creates an author-only record. The
/// latest mention time becomes the member's last interaction.
///
/// Members come back sorted by weight descending, then profile id ascending.
#[must_use]
pub fn build_project_circle(
    project_handle: &str,
    signals: &ProjectSignals,
    index: &GlobalCircleIndex,
    now: DateTime<Utc>,
    quality_follower_min: i64,
) -> ProjectCircle {
    let own_handle = normalize_handle(project_handle);
    let mut drafts: BTreeMap<i64, Draft> = BTreeMap::new();

    for follower in &signals.followers {
        let handle = follower.normalized_handle();
        if handle == own_handle {
            continue;
        }
        if let Some(member) = index.get(&handle) {
            drafts
                .entry(member.profile_id)
                .or_insert(Draft {
                    member: *member,
                    is_follower: false,
                    is_author: false,
                    last_interaction_at: None,
                })
                .is_follower = true;
        }
    }

    for mention in &signals.mentions {
        let handle = mention.author.normalized_handle();
        if handle == own_handle {
            continue;
        }
        let Some(member) = index.get(&handle) else {
            continue;
        };
        let draft = drafts.entry(member.profile_id).or_insert(Draft {
            member: *member,
            is_follower: false,
            is_author: false,
            last_interaction_at: None,
        });
        draft.is_author = true;
        if let Some(at) = mention.created_at {
            if draft.last_interaction_at.is_none_or(|prev| at > prev) {
                draft.last_interaction_at = Some(at);
            }
        }
    }

    let circle_power: f64 = drafts.values().map(|d| d.member.influence_score).sum();

    let mut members: Vec<NewProjectCircleMember> = drafts
        .into_values()
        .filter_map(|d| {
            let role = MemberRole::from_flags(d.is_follower, d.is_author)?;
            let days = d.last_interaction_at.map(|at| days_since(at, now));
            Some(NewProjectCircleMember {
                profile_id: d.member.profile_id,
                is_follower: d.is_follower,
                is_author: d.is_author,
                weight: member_weight(d.member.akari_score, role, days),
                last_interaction_at: d.last_interaction_at,
            })
        })
        .collect();

    members.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.profile_id.cmp(&b.profile_id))
    });

    let stats = ProjectStats {
        circle_count: members.len(),
        circle_power,
        quality_follower_ratio: quality_follower_ratio(&signals.followers, quality_follower_min),
    };

    ProjectCircle { members, stats }
}

#[cfg(test)]
#[path = "project_circle_test.rs"]
mod tests;
