//! The `IdentityService` trait — sign-in, sign-up, and session events.
//!
//! Models the hosted identity provider the dashboard authenticates against.
//! The core never sees credentials storage; it consumes only [`Session`]
//! values and the sign-in/sign-out event stream.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─── Session ─────────────────────────────────────────────────────────────────

/// An authenticated session as issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub user_id:      Uuid,
  pub email:        String,
  /// Opaque bearer token; the client never inspects it.
  pub access_token: String,
  pub issued_at:    DateTime<Utc>,
}

/// A change to the authentication state, delivered on the session event
/// stream after every sign-in and sign-out.
#[derive(Debug, Clone)]
pub enum SessionEvent {
  SignedIn(Session),
  SignedOut,
}

/// A live subscription to session changes. `next` resolves to `None` once
/// the provider has shut down.
pub trait SessionStream: Send {
  fn next(&mut self) -> impl Future<Output = Option<SessionEvent>> + Send + '_;
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failures reported by the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("an account already exists for this email")]
  AlreadyRegistered,

  #[error("identity provider error: {0}")]
  Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
  /// Wrap a provider-specific failure.
  pub fn provider<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Provider(Box::new(err))
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the identity provider.
///
/// `current_session` is a synchronous read of provider-local state; the
/// credentialed operations suspend like every other backend call.
pub trait IdentityService: Send + Sync {
  type Events: SessionStream;

  /// Register a new identity and sign it in.
  fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Session, AuthError>> + Send + 'a;

  /// Authenticate an existing identity.
  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Session, AuthError>> + Send + 'a;

  /// End the current session. Signing out with no session is a no-op.
  fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send + '_;

  /// The session currently held by the provider, if any.
  fn current_session(&self) -> Option<Session>;

  /// Open a subscription to sign-in/sign-out events.
  fn session_events(&self) -> Self::Events;
}
