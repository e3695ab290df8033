pub mod checkins;
pub mod families;
pub mod progress;
pub mod quiz_log;
pub mod words;

use thiserror::Error;

/// Record-store failures, distinguishable from domain errors at the
/// route layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
}
