//! The dashboard — session, lifecycle engine, live feed and notices,
//! composed into the one object a frontend drives.
//!
//! Every mutating action here ends in exactly one notice. Conflicts get
//! their own messages and trigger a refresh so the user sees the state
//! that beat them; nothing is ever retried automatically.

use std::sync::Arc;

use guardian_core::{
  Error, Result,
  accident::{Accident, NewAccident},
  identity::{IdentityService, Session},
  lifecycle::LifecycleEngine,
  session::SessionAdapter,
  station::Station,
  store::AccidentStore,
  view::{self, StatusCounts, StatusFilter},
};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::{
  feed::LiveFeed,
  notice::{Notice, Notices},
  simulate,
};

pub struct Dashboard<I, S> {
  session: SessionAdapter<I, S>,
  engine:  LifecycleEngine<S>,
  feed:    LiveFeed<S>,
  notices: Notices,
}

impl<I, S> Dashboard<I, S>
where
  I: IdentityService,
  S: AccidentStore + 'static,
  S::Changes: 'static,
{
  /// Compose a dashboard over an identity provider and a store, and start
  /// the live feed.
  pub async fn open(identity: Arc<I>, store: Arc<S>) -> Result<Self> {
    let notices = Notices::new();
    let feed = LiveFeed::open(Arc::clone(&store), notices.clone()).await?;

    Ok(Self {
      session: SessionAdapter::new(identity, Arc::clone(&store)),
      engine: LifecycleEngine::new(store),
      feed,
      notices,
    })
  }

  // ── Session ─────────────────────────────────────────────────────────────

  pub async fn register(
    &self,
    email: &str,
    password: &str,
    station_name: &str,
    location: (f64, f64),
  ) -> Result<Station> {
    let result = self
      .session
      .register(email, password, station_name, location)
      .await;

    match &result {
      Ok(station) => self.notices.push(Notice::success(
        "Success",
        format!("Station {:?} registered", station.name),
      )),
      Err(e) => self
        .notices
        .push(Notice::error("Error", format!("Registration failed: {e}"))),
    }
    result
  }

  pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
    let result = self.session.sign_in(email, password).await;

    match &result {
      Ok(session) => self.notices.push(Notice::success(
        "Success",
        format!("Signed in as {}", session.email),
      )),
      Err(e) => self
        .notices
        .push(Notice::error("Error", format!("Sign-in failed: {e}"))),
    }
    result
  }

  pub async fn sign_out(&self) -> Result<()> {
    self.session.sign_out().await
  }

  pub fn station(&self) -> Option<Station> {
    self.session.station()
  }

  // ── Lifecycle actions ───────────────────────────────────────────────────

  /// Report an accident on behalf of the signed-in station.
  pub async fn report(&self, draft: NewAccident) -> Result<Accident> {
    let result = self.report_inner(draft).await;

    match &result {
      Ok(_) => self
        .notices
        .push(Notice::success("Success", "Accident reported")),
      Err(e) => self
        .notices
        .push(Notice::error("Error", format!("Failed to report accident: {e}"))),
    }
    result
  }

  /// Report a randomly generated accident near the default base point.
  pub async fn simulate(&self) -> Result<Accident> {
    let result = self
      .report_inner(simulate::random_draft(simulate::DEFAULT_BASE))
      .await;

    match &result {
      Ok(_) => self.notices.push(Notice::success(
        "Alert Sent!",
        "New accident has been reported to all stations",
      )),
      Err(e) => self.notices.push(Notice::error(
        "Error",
        format!("Failed to simulate accident: {e}"),
      )),
    }
    result
  }

  async fn report_inner(&self, draft: NewAccident) -> Result<Accident> {
    self.session.require_station()?;
    self.engine.report(draft).await
  }

  /// Claim a pending accident for the signed-in station.
  pub async fn acknowledge(&self, accident_id: Uuid) -> Result<Accident> {
    let result = async {
      let station = self.session.require_station()?;
      self.engine.acknowledge(accident_id, &station).await
    }
    .await;

    match &result {
      Ok(_) => self.notices.push(Notice::success(
        "Success",
        "Accident acknowledged successfully",
      )),
      Err(Error::ClaimConflict(_)) => {
        self.notices.push(Notice::error(
          "Error",
          "Failed to acknowledge accident. It may have already been claimed.",
        ));
        self.refresh_after_conflict().await;
      }
      Err(e) => self.notices.push(Notice::error(
        "Error",
        format!("Failed to acknowledge accident: {e}"),
      )),
    }
    result
  }

  /// Resolve an accident held by the signed-in station.
  pub async fn resolve(&self, accident_id: Uuid) -> Result<Accident> {
    let result = async {
      let station = self.session.require_station()?;
      self.engine.resolve(accident_id, &station).await
    }
    .await;

    match &result {
      Ok(_) => self
        .notices
        .push(Notice::success("Success", "Accident resolved successfully")),
      Err(Error::OwnershipConflict(_)) => {
        self.notices.push(Notice::error(
          "Error",
          "Failed to resolve accident. It is not held by this station.",
        ));
        self.refresh_after_conflict().await;
      }
      Err(e) => self.notices.push(Notice::error(
        "Error",
        format!("Failed to resolve accident: {e}"),
      )),
    }
    result
  }

  /// A conflict means the store moved on; show the state that won. The
  /// action already produced its one notice, so a failing refresh only
  /// logs.
  async fn refresh_after_conflict(&self) {
    if let Err(e) = self.feed.refresh().await {
      tracing::warn!(error = %e, "refresh after conflict failed");
    }
  }

  // ── Views ───────────────────────────────────────────────────────────────

  /// The current snapshot, newest first.
  pub fn snapshot(&self) -> Vec<Accident> {
    self.feed.snapshot()
  }

  /// A receiver observing every published snapshot.
  pub fn watch(&self) -> watch::Receiver<Vec<Accident>> {
    self.feed.watch()
  }

  /// Accidents admitted by `filter`, in feed order.
  pub fn view(&self, filter: StatusFilter) -> Vec<Accident> {
    view::filtered(&self.feed.snapshot(), filter)
      .into_iter()
      .cloned()
      .collect()
  }

  pub fn counts(&self) -> StatusCounts {
    StatusCounts::of(&self.feed.snapshot())
  }

  pub fn critical_unresolved(&self) -> usize {
    view::critical_unresolved(&self.feed.snapshot())
  }

  // ── Notices ─────────────────────────────────────────────────────────────

  pub fn notices(&self) -> broadcast::Receiver<Notice> {
    self.notices.subscribe()
  }
}
