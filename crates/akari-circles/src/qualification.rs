//! Admission predicate for the global inner circle.

use akari_db::ProfileRow;

/// Fixed admission thresholds. A profile must meet all four.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualificationThresholds {
    pub min_authenticity: f64,
    pub min_signal_density: f64,
    pub max_farm_risk: f64,
    pub min_akari_score: f64,
}

impl Default for QualificationThresholds {
    fn default() -> Self {
        Self {
            min_authenticity: 60.0,
            min_signal_density: 40.0,
            max_farm_risk: 30.0,
            min_akari_score: 50.0,
        }
    }
}

/// The stored composite scores of one profile; `None` until first scored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfileScores {
    pub akari_score: Option<f64>,
    pub authenticity: Option<f64>,
    pub influence: Option<f64>,
    pub signal_density: Option<f64>,
    pub farm_risk: Option<f64>,
}

impl ProfileScores {
    #[must_use]
    pub fn from_row(row: &ProfileRow) -> Self {
        Self {
            akari_score: row.akari_score,
            authenticity: row.authenticity_score,
            influence: row.influence_score,
            signal_density: row.signal_score,
            farm_risk: row.farm_risk_score,
        }
    }
}

impl QualificationThresholds {
    /// `true` when every gating score is present and within bounds.
    ///
    /// Influence does not gate admission; it only ranks admitted profiles.
    #[must_use]
    pub fn qualifies(&self, scores: &ProfileScores) -> bool {
        let (Some(authenticity), Some(signal), Some(farm_risk), Some(akari)) = (
            scores.authenticity,
            scores.signal_density,
            scores.farm_risk,
            scores.akari_score,
        ) else {
            return false;
        };

        authenticity >= self.min_authenticity
            && signal >= self.min_signal_density
            && farm_risk <= self.max_farm_risk
            && akari >= self.min_akari_score
    }
}
