//! Composite profile scores and the scoring oracle contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Composite scores for one profile, each on a 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBundle {
    /// Overall ("akari") score.
    pub akari_score: f64,
    pub authenticity: f64,
    pub influence: f64,
    pub signal_density: f64,
    pub farm_risk: f64,
}

/// Converts a handle into a [`ScoreBundle`].
///
/// `None` means "not scorable right now" (rate limit, unknown account,
/// transient error); callers leave the stored profile untouched.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(&self, handle: &str) -> Option<ScoreBundle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_payload() {
        let json = r#"{
            "akariScore": 71.5,
            "authenticity": 80,
            "influence": 64.2,
            "signalDensity": 55,
            "farmRisk": 12
        }"#;
        let bundle: ScoreBundle = serde_json::from_str(json).unwrap();
        assert!((bundle.akari_score - 71.5).abs() < f64::EPSILON);
        assert!((bundle.signal_density - 55.0).abs() < f64::EPSILON);
        assert!((bundle.farm_risk - 12.0).abs() < f64::EPSILON);
    }
}
