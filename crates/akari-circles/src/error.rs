use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("database error: {0}")]
    Db(#[from] akari_db::DbError),

    /// Failure reported by a non-Postgres [`crate::CircleStore`].
    #[error("store error: {0}")]
    Store(String),
}
