use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub projects_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub social_base_url: String,
    pub social_api_key: String,
    pub scoring_url: String,
    pub scoring_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_call_delay_ms: u64,
    pub rescore_batch_size: usize,
    pub rescore_stale_days: i64,
    pub global_circle_max: usize,
    pub follower_sample_size: usize,
    pub mention_sample_size: usize,
    pub quality_follower_min: i64,
    pub min_authenticity: f64,
    pub min_signal_density: f64,
    pub max_farm_risk: f64,
    pub min_akari_score: f64,
    pub engine_cron: String,
    /// A `running` engine run older than this is treated as abandoned.
    pub engine_run_timeout_mins: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("projects_path", &self.projects_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("social_base_url", &self.social_base_url)
            .field("social_api_key", &"[redacted]")
            .field("scoring_url", &self.scoring_url)
            .field(
                "scoring_api_key",
                &self.scoring_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("inter_call_delay_ms", &self.inter_call_delay_ms)
            .field("rescore_batch_size", &self.rescore_batch_size)
            .field("rescore_stale_days", &self.rescore_stale_days)
            .field("global_circle_max", &self.global_circle_max)
            .field("follower_sample_size", &self.follower_sample_size)
            .field("mention_sample_size", &self.mention_sample_size)
            .field("quality_follower_min", &self.quality_follower_min)
            .field("min_authenticity", &self.min_authenticity)
            .field("min_signal_density", &self.min_signal_density)
            .field("max_farm_risk", &self.max_farm_risk)
            .field("min_akari_score", &self.min_akari_score)
            .field("engine_cron", &self.engine_cron)
            .field("engine_run_timeout_mins", &self.engine_run_timeout_mins)
            .finish()
    }
}
