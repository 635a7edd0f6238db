use akari_core::AppConfig;

use crate::qualification::QualificationThresholds;

/// Tunables for one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Default rescoring quota per run.
    pub rescore_batch_size: usize,
    /// Scores older than this many days are refreshed.
    pub rescore_stale_days: i64,
    pub global_circle_max: usize,
    pub follower_sample_size: usize,
    pub mention_sample_size: usize,
    /// Follower count at which a sampled follower counts as "quality".
    pub quality_follower_min: i64,
    pub thresholds: QualificationThresholds,
    /// Minimum spacing between outbound social/scoring calls.
    pub inter_call_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rescore_batch_size: 50,
            rescore_stale_days: 7,
            global_circle_max: 500,
            follower_sample_size: 100,
            mention_sample_size: 50,
            quality_follower_min: 1_000,
            thresholds: QualificationThresholds::default(),
            inter_call_delay_ms: 1_000,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            rescore_batch_size: config.rescore_batch_size,
            rescore_stale_days: config.rescore_stale_days,
            global_circle_max: config.global_circle_max,
            follower_sample_size: config.follower_sample_size,
            mention_sample_size: config.mention_sample_size,
            quality_follower_min: config.quality_follower_min,
            thresholds: QualificationThresholds {
                min_authenticity: config.min_authenticity,
                min_signal_density: config.min_signal_density,
                max_farm_risk: config.max_farm_risk,
                min_akari_score: config.min_akari_score,
            },
            inter_call_delay_ms: config.inter_call_delay_ms,
        }
    }
}
