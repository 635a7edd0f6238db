//! Per-member weight policy for project circles.
//!
//! ```text
//! base   = 0.1 + 0.9 × clamp(akari_score, 0, 100) / 100
//! role   = 1.0 follower-only | 1.5 author-only | 2.0 both
//! bonus  = 0.5 × 2^(−days / 7)   (only with an interaction timestamp)
//! weight = round4(base × role × (1 + bonus))
//! ```

use chrono::{DateTime, Utc};

const BASE_FLOOR: f64 = 0.1;
const RECENCY_MAX_BONUS: f64 = 0.5;
const RECENCY_HALF_LIFE_DAYS: f64 = 7.0;

/// How a member is connected to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Follower,
    Author,
    FollowerAndAuthor,
}

impl MemberRole {
    /// `None` when neither flag is set; such a record is not a member.
    #[must_use]
    pub fn from_flags(is_follower: bool, is_author: bool) -> Option<Self> {
        match (is_follower, is_author) {
            (true, true) => Some(Self::FollowerAndAuthor),
            (true, false) => Some(Self::Follower),
            (false, true) => Some(Self::Author),
            (false, false) => None,
        }
    }

    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Follower => 1.0,
            Self::Author => 1.5,
            Self::FollowerAndAuthor => 2.0,
        }
    }
}

/// Whole and fractional days from `at` to `now`; future timestamps are 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn days_since(at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let secs = (now - at).num_seconds().max(0);
    secs as f64 / 86_400.0
}

/// Weight of one circle member. Always positive.
#[must_use]
pub fn member_weight(akari_score: f64, role: MemberRole, days_since_interaction: Option<f64>) -> f64 {
    let score = if akari_score.is_finite() {
        akari_score.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let base = BASE_FLOOR + (1.0 - BASE_FLOOR) * score / 100.0;

    let bonus = days_since_interaction.map_or(0.0, |days| {
        RECENCY_MAX_BONUS * (-days.max(0.0) / RECENCY_HALF_LIFE_DAYS).exp2()
    });

    round4(base * role.multiplier() * (1.0 + bonus))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
