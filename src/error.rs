//! Error types for the tracking engine

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("goal not found")]
  GoalNotFound,

  #[error("gateway error: {0}")]
  Gateway(String),

  #[error("invalid arguments: {0}")]
  InvalidArgs(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
