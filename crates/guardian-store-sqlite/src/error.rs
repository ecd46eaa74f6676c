//! Error type for `guardian-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown severity: {0:?}")]
  UnknownSeverity(String),

  #[error("unknown status: {0:?}")]
  UnknownStatus(String),

  /// Attempted to provision a second station for an identity.
  #[error("a station already exists for user {0}")]
  StationExists(Uuid),

  #[error("password hash error: {0}")]
  PasswordHash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
