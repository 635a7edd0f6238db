//! Global inner circle selection.

use akari_core::Segment;
use akari_db::{NewGlobalCircleMember, ProfileRow};

use crate::qualification::{ProfileScores, QualificationThresholds};
use crate::segment::classify_bio;

/// One admitted profile with its snapshot scores and rank.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalCircleEntry {
    pub profile_id: i64,
    pub handle: String,
    /// 1-based position in the influence ranking.
    pub rank: usize,
    pub akari_score: f64,
    pub influence_score: f64,
    pub segment: Segment,
}

impl GlobalCircleEntry {
    #[must_use]
    pub fn to_new_member(&self) -> NewGlobalCircleMember {
        NewGlobalCircleMember {
            profile_id: self.profile_id,
            rank: i32::try_from(self.rank).unwrap_or(i32::MAX),
            akari_score: self.akari_score,
            influence_score: self.influence_score,
            segment: self.segment.as_str().to_string(),
        }
    }
}

/// Filter `profiles` through the qualification predicate, rank by influence
/// descending (stable on input order), and keep at most `capacity`.
///
/// A profile with no influence score ranks as influence 0.
#[must_use]
pub fn select_global_circle(
    profiles: &[ProfileRow],
    thresholds: &QualificationThresholds,
    capacity: usize,
) -> Vec<GlobalCircleEntry> {
    let mut qualified: Vec<(&ProfileRow, f64, f64)> = profiles
        .iter()
        .filter_map(|p| {
            let scores = ProfileScores::from_row(p);
            if !thresholds.qualifies(&scores) {
                return None;
            }
            Some((
                p,
                scores.akari_score.unwrap_or(0.0),
                scores.influence.unwrap_or(0.0),
            ))
        })
        .collect();

    // `sort_by` is stable: equal influence keeps input order.
    qualified.sort_by(|a, b| b.2.total_cmp(&a.2));
    qualified.truncate(capacity);

    qualified
        .into_iter()
        .enumerate()
        .map(|(idx, (p, akari, influence))| GlobalCircleEntry {
            profile_id: p.id,
            handle: p.handle.clone(),
            rank: idx + 1,
            akari_score: akari,
            influence_score: influence,
            segment: classify_bio(p.bio.as_deref()),
        })
        .collect()
}
