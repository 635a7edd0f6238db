//! The Akari circle engine: rescoring, global circle selection, project
//! circles, competitor similarity, and the run orchestrator.

pub mod config;
pub mod engine;
pub mod error;
pub mod global_circle;
pub mod project_circle;
pub mod qualification;
pub mod rescoring;
pub mod segment;
pub mod similarity;
pub mod store;
pub mod throttle;
pub mod weight;

pub use config::EngineConfig;
pub use engine::{plan_run, run_engine, EngineRunSummary, Phase, PlannedProject, RunOptions};
pub use error::EngineError;
pub use global_circle::{select_global_circle, GlobalCircleEntry};
pub use project_circle::{
    build_project_circle, fetch_project_signals, mention_query, quality_follower_ratio,
    GlobalCircleIndex, ProjectCircle, ProjectSignals,
};
pub use qualification::{ProfileScores, QualificationThresholds};
pub use rescoring::{select_for_rescoring, stale_cutoff};
pub use segment::classify_bio;
pub use similarity::{compute_competitors, dice_similarity, CompetitorEdge, TOP_K};
pub use store::{CircleStore, PgCircleStore};
pub use throttle::Throttle;
pub use weight::{member_weight, MemberRole};
