//! [`SqliteIdentity`] — the SQLite-backed identity provider.
//!
//! Stands in for the hosted identity service: credentials live in the
//! `users` table as argon2 PHC strings, and sessions are held in provider
//! memory with an opaque random token. The accident store never reads the
//! `users` table; the two sides meet only through [`Session`] values.

use std::sync::{PoisonError, RwLock};

use argon2::{
  Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _,
  password_hash::SaltString,
};
use chrono::Utc;
use guardian_core::identity::{
  AuthError, IdentityService, Session, SessionEvent, SessionStream,
};
use rand_core::{OsRng, RngCore as _};
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error,
  encode::{decode_uuid, encode_dt, encode_uuid},
};

/// Buffered session events per subscriber. Sign-ins are rare; a consumer
/// this far behind just catches up on the next event.
const EVENT_BUFFER: usize = 16;

/// Mint an opaque bearer token: 32 random bytes, hex-encoded.
fn new_access_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// An identity provider persisting into a Guardian SQLite database.
///
/// Each handle keeps its own current session (one handle per client
/// instance); the identity records themselves are shared through the
/// connection.
pub struct SqliteIdentity {
  conn:    tokio_rusqlite::Connection,
  session: RwLock<Option<Session>>,
  events:  broadcast::Sender<SessionEvent>,
}

impl SqliteIdentity {
  pub(crate) fn with_connection(conn: tokio_rusqlite::Connection) -> Self {
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    Self { conn, session: RwLock::new(None), events }
  }

  fn set_session(&self, next: Option<Session>) {
    let event = match &next {
      Some(session) => SessionEvent::SignedIn(session.clone()),
      None => SessionEvent::SignedOut,
    };
    *self.session.write().unwrap_or_else(PoisonError::into_inner) = next;
    // No receivers just means nobody is watching the session.
    let _ = self.events.send(event);
  }

  fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| AuthError::provider(Error::PasswordHash(e.to_string())))
  }
}

impl IdentityService for SqliteIdentity {
  type Events = SqliteSessionEvents;

  async fn sign_up(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Session, AuthError> {
    let user_id = Uuid::new_v4();
    let hash = Self::hash_password(password)?;

    let email_owned = email.to_owned();
    let id_str = encode_uuid(user_id);
    let now_str = encode_dt(Utc::now());

    // Check-then-insert runs in one closure, serialised on the connection
    // thread; UNIQUE(email) backstops it.
    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: Option<i64> = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email_owned],
            |row| row.get(0),
          )
          .optional()?;

        if taken.is_some() {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO users (id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_owned, hash, now_str],
        )?;
        Ok(true)
      })
      .await
      .map_err(|e| AuthError::provider(Error::Database(e)))?;

    if !inserted {
      return Err(AuthError::AlreadyRegistered);
    }

    tracing::info!(%user_id, "registered new identity");

    let session = Session {
      user_id,
      email: email.to_owned(),
      access_token: new_access_token(),
      issued_at: Utc::now(),
    };
    self.set_session(Some(session.clone()));
    Ok(session)
  }

  async fn sign_in(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Session, AuthError> {
    let email_owned = email.to_owned();

    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, password_hash FROM users WHERE email = ?1",
              rusqlite::params![email_owned],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await
      .map_err(|e| AuthError::provider(Error::Database(e)))?;

    // Unknown email and wrong password are deliberately the same error.
    let Some((id_str, hash)) = row else {
      return Err(AuthError::InvalidCredentials);
    };

    let parsed = PasswordHash::new(&hash)
      .map_err(|e| AuthError::provider(Error::PasswordHash(e.to_string())))?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| AuthError::InvalidCredentials)?;

    let user_id = decode_uuid(&id_str).map_err(AuthError::provider)?;

    tracing::info!(%user_id, "signed in");

    let session = Session {
      user_id,
      email: email.to_owned(),
      access_token: new_access_token(),
      issued_at: Utc::now(),
    };
    self.set_session(Some(session.clone()));
    Ok(session)
  }

  async fn sign_out(&self) -> Result<(), AuthError> {
    let had_session = self
      .session
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some();
    if had_session {
      self.set_session(None);
      tracing::info!("signed out");
    }
    Ok(())
  }

  fn current_session(&self) -> Option<Session> {
    self
      .session
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  fn session_events(&self) -> SqliteSessionEvents {
    SqliteSessionEvents { rx: self.events.subscribe() }
  }
}

/// A live subscription to sign-in/sign-out events. Dropping the handle
/// unregisters the subscriber.
pub struct SqliteSessionEvents {
  rx: broadcast::Receiver<SessionEvent>,
}

impl SessionStream for SqliteSessionEvents {
  async fn next(&mut self) -> Option<SessionEvent> {
    loop {
      match self.rx.recv().await {
        Ok(event) => return Some(event),
        // Session events are not cumulative; skip what was missed.
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}
