//! Shared domain types, collaborator contracts, and configuration for the
//! Akari circle engine.

pub mod app_config;
pub mod config;
pub mod projects;
pub mod scoring;
pub mod segment;
pub mod social;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use projects::{load_projects, ProjectConfig, ProjectsFile};
pub use scoring::{ScoreBundle, ScoringOracle};
pub use segment::Segment;
pub use social::{normalize_handle, MentionResult, MentionSort, ProfileMetadata, SocialDataSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read projects file {path}: {source}")]
    ProjectsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse projects file: {0}")]
    ProjectsFileParse(#[from] serde_yaml::Error),

    #[error("invalid projects config: {0}")]
    Validation(String),
}
