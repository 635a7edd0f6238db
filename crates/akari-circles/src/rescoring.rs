//! Rescoring selector: which stored profiles are due for a fresh score.

use akari_db::ProfileRow;
use chrono::{DateTime, Duration, Utc};

/// Oldest `last_scored_at` that still counts as fresh.
#[must_use]
pub fn stale_cutoff(now: DateTime<Utc>, stale_days: i64) -> DateTime<Utc> {
    now - Duration::days(stale_days)
}

/// `true` when the profile was never scored or its score predates `cutoff`.
#[must_use]
pub fn is_due(profile: &ProfileRow, cutoff: DateTime<Utc>) -> bool {
    profile.last_scored_at.is_none_or(|at| at < cutoff)
}

/// Up to `quota` due profiles, largest follower count first, ties by handle.
///
/// Returns fewer than `quota` when fewer are due. Mirrors the ordering of
/// [`akari_db::list_profiles_due_for_rescore`] for [`crate::CircleStore`]
/// implementations that hold profiles in memory rather than in Postgres.
/// Keep the two in step when either changes.
#[must_use]
pub fn select_for_rescoring(
    profiles: &[ProfileRow],
    cutoff: DateTime<Utc>,
    quota: usize,
) -> Vec<ProfileRow> {
    let mut due: Vec<&ProfileRow> = profiles.iter().filter(|p| is_due(p, cutoff)).collect();
    due.sort_by(|a, b| {
        b.followers_count
            .cmp(&a.followers_count)
            .then_with(|| a.handle.cmp(&b.handle))
    });
    due.into_iter().take(quota).cloned().collect()
}
