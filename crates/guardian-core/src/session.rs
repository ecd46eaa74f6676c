//! The session adapter — identity plus station, held together.
//!
//! Wraps an [`IdentityService`] and an [`AccidentStore`] into the one
//! context object the dashboard consumes: register provisions a station for
//! the new identity, sign-in resolves the station owned by the session's
//! user, and `require_station` is the gate every mutating action passes
//! through. No global state; callers hold the adapter explicitly.

use std::sync::{Arc, PoisonError, RwLock};

use crate::{
  Error, Result,
  identity::{IdentityService, Session},
  station::{NewStation, Station},
  store::AccidentStore,
  validate,
};

#[derive(Debug, Clone)]
struct SignedIn {
  session: Session,
  /// `None` when the identity exists but no station was ever provisioned
  /// (a failed registration leaves the account in this state). Reads work;
  /// mutating actions fail with [`Error::NoStation`].
  station: Option<Station>,
}

/// Authentication state shared by the dashboard and the binary.
pub struct SessionAdapter<I, S> {
  identity: Arc<I>,
  store:    Arc<S>,
  state:    RwLock<Option<SignedIn>>,
}

impl<I, S> SessionAdapter<I, S>
where
  I: IdentityService,
  S: AccidentStore,
{
  pub fn new(identity: Arc<I>, store: Arc<S>) -> Self {
    Self { identity, store, state: RwLock::new(None) }
  }

  // ── Flows ───────────────────────────────────────────────────────────────

  /// Register a new station account: validate locally, create the identity,
  /// then provision its station.
  ///
  /// Validation failures never reach the provider. A station-write failure
  /// after the identity was created is surfaced as an error — the session
  /// stays live, but the account has no station until one is provisioned.
  pub async fn register(
    &self,
    email: &str,
    password: &str,
    station_name: &str,
    location: (f64, f64),
  ) -> Result<Station> {
    validate::credentials(email, password)?;
    validate::station_name(station_name)?;

    let session = self.identity.sign_up(email, password).await?;

    let created = self
      .store
      .create_station(NewStation {
        user_id:      session.user_id,
        name:         station_name.to_owned(),
        location_lat: location.0,
        location_lng: location.1,
      })
      .await;

    match created {
      Ok(station) => {
        self.set_state(Some(SignedIn {
          session,
          station: Some(station.clone()),
        }));
        Ok(station)
      }
      Err(e) => {
        self.set_state(Some(SignedIn { session, station: None }));
        Err(Error::store(e))
      }
    }
  }

  /// Sign in and resolve the station owned by this identity.
  ///
  /// An account without a station still signs in; mutating actions will
  /// fail with [`Error::NoStation`] until one exists.
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
    validate::credentials(email, password)?;

    let session = self.identity.sign_in(email, password).await?;
    let station = self
      .store
      .station_for_user(session.user_id)
      .await
      .map_err(Error::store)?;

    self.set_state(Some(SignedIn { session: session.clone(), station }));
    Ok(session)
  }

  /// Sign out. Local state is torn down even when the provider call fails.
  pub async fn sign_out(&self) -> Result<()> {
    let result = self.identity.sign_out().await;
    self.set_state(None);
    result.map_err(Error::from)
  }

  // ── Accessors ───────────────────────────────────────────────────────────

  pub fn session(&self) -> Option<Session> {
    self.read_state(|s| s.session.clone())
  }

  pub fn station(&self) -> Option<Station> {
    self.read_state(|s| s.station.clone()).flatten()
  }

  pub fn is_signed_in(&self) -> bool {
    self.read_state(|_| ()).is_some()
  }

  /// The station every mutating action acts as.
  pub fn require_station(&self) -> Result<Station> {
    let guard = self
      .state
      .read()
      .unwrap_or_else(PoisonError::into_inner);
    match guard.as_ref() {
      None => Err(Error::NotSignedIn),
      Some(signed_in) => signed_in.station.clone().ok_or(Error::NoStation),
    }
  }

  // ── State plumbing ──────────────────────────────────────────────────────

  fn read_state<T>(&self, f: impl FnOnce(&SignedIn) -> T) -> Option<T> {
    self
      .state
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .as_ref()
      .map(f)
  }

  fn set_state(&self, next: Option<SignedIn>) {
    *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
  }
}
