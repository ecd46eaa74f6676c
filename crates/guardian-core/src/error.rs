//! Error types for `guardian-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{identity::AuthError, validate::ValidationError};

#[derive(Debug, Error)]
pub enum Error {
  /// The conditional acknowledge matched zero rows: another station claimed
  /// the accident first, or the id is unknown.
  #[error("accident {0} could not be claimed; it may already be acknowledged")]
  ClaimConflict(Uuid),

  /// The conditional resolve matched zero rows: the claim was reassigned,
  /// the accident is already resolved, or this station never held it.
  #[error("accident {0} is not held by this station")]
  OwnershipConflict(Uuid),

  #[error("not signed in")]
  NotSignedIn,

  /// Signed in, but no station is provisioned for this identity.
  #[error("no station is registered for this account")]
  NoStation,

  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("auth error: {0}")]
  Auth(#[from] AuthError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend-specific store failure.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// Both conflict variants: the conditional update matched zero rows and
  /// the caller should refresh rather than retry.
  pub fn is_conflict(&self) -> bool {
    matches!(self, Self::ClaimConflict(_) | Self::OwnershipConflict(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
