//! Project-to-project similarity over circle membership.
//!
//! Similarity is the Dice coefficient `2·|A∩B| / (|A|+|B|)`, so it is
//! symmetric and bounded by `[0, 1]`. Edges are directed only because each
//! source keeps its own top-K list.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use akari_db::NewProjectCompetitor;

/// Maximum number of competitor edges kept per source project.
pub const TOP_K: usize = 5;

/// A ranked competitor edge from one source project.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitorEdge {
    pub target_project_id: i64,
    /// 1-based.
    pub rank: usize,
    pub common_count: usize,
    pub common_power: f64,
    pub similarity: f64,
}

impl CompetitorEdge {
    #[must_use]
    pub fn to_new_competitor(&self) -> NewProjectCompetitor {
        NewProjectCompetitor {
            competitor_project_id: self.target_project_id,
            rank: i32::try_from(self.rank).unwrap_or(i32::MAX),
            common_count: i32::try_from(self.common_count).unwrap_or(i32::MAX),
            common_power: self.common_power,
            similarity: self.similarity,
        }
    }
}

/// Dice similarity of two member sets. `0.0` when both are empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn dice_similarity(common: usize, len_a: usize, len_b: usize) -> f64 {
    let total = len_a + len_b;
    if total == 0 {
        return 0.0;
    }
    (2 * common) as f64 / total as f64
}

/// Ranked competitor lists for every project in `circles`.
///
/// Every key of `circles` appears in the result, with an empty list when it
/// overlaps no other project, so stale edges get cleared on persist.
/// Members missing from `influence` contribute 0 power.
#[must_use]
pub fn compute_competitors(
    circles: &BTreeMap<i64, BTreeSet<i64>>,
    influence: &HashMap<i64, f64>,
) -> BTreeMap<i64, Vec<CompetitorEdge>> {
    let mut result = BTreeMap::new();

    for (&source, members_a) in circles {
        let mut candidates: Vec<CompetitorEdge> = Vec::new();

        if !members_a.is_empty() {
            for (&target, members_b) in circles {
                if target == source || members_b.is_empty() {
                    continue;
                }
                let common: Vec<i64> = members_a.intersection(members_b).copied().collect();
                if common.is_empty() {
                    continue;
                }
                let common_power = common
                    .iter()
                    .map(|id| influence.get(id).copied().unwrap_or(0.0))
                    .sum();
                candidates.push(CompetitorEdge {
                    target_project_id: target,
                    rank: 0,
                    common_count: common.len(),
                    common_power,
                    similarity: dice_similarity(common.len(), members_a.len(), members_b.len()),
                });
            }
        }

        candidates.sort_by(compare_edges);
        candidates.truncate(TOP_K);
        for (idx, edge) in candidates.iter_mut().enumerate() {
            edge.rank = idx + 1;
        }

        result.insert(source, candidates);
    }

    result
}

fn compare_edges(a: &CompetitorEdge, b: &CompetitorEdge) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| b.common_power.total_cmp(&a.common_power))
        .then_with(|| b.common_count.cmp(&a.common_count))
        .then_with(|| a.target_project_id.cmp(&b.target_project_id))
}
