//! Integration tests for the dashboard composition.
//!
//! Most tests drive a real in-memory SQLite backend; the mock store exists
//! to force read failures the real backend won't produce on demand.

use std::{
  io,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use guardian_core::{
  Error,
  accident::{Accident, NewAccident, Severity, Status},
  identity::AuthError,
  station::{NewStation, Station},
  store::{AccidentStore, ChangeEvent, ChangeStream},
  validate::ValidationError,
};
use guardian_store_sqlite::{SqliteBackend, SqliteIdentity};
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;
use uuid::Uuid;

use crate::{
  Dashboard, LiveFeed,
  notice::{Notice, NoticeKind, Notices},
};

const BASE: (f64, f64) = (40.7128, -74.006);
const PASSWORD: &str = "hunter22";

async fn backend() -> (SqliteBackend, Arc<SqliteBackend>) {
  let backend = SqliteBackend::open_in_memory()
    .await
    .expect("in-memory backend");
  let store = Arc::new(backend.clone());
  (backend, store)
}

async fn dashboard(
  backend: &SqliteBackend,
  store: &Arc<SqliteBackend>,
) -> Dashboard<SqliteIdentity, SqliteBackend> {
  Dashboard::open(Arc::new(backend.identity()), Arc::clone(store))
    .await
    .expect("dashboard")
}

async fn registered_dashboard(
  backend: &SqliteBackend,
  store: &Arc<SqliteBackend>,
  email: &str,
  name: &str,
) -> Dashboard<SqliteIdentity, SqliteBackend> {
  let d = dashboard(backend, store).await;
  d.register(email, PASSWORD, name, BASE).await.expect("register");
  d
}

/// Wait until the feed snapshot satisfies `pred`, or panic after 2s.
async fn wait_until(
  rx: &mut watch::Receiver<Vec<Accident>>,
  mut pred: impl FnMut(&[Accident]) -> bool,
) {
  timeout(Duration::from_secs(2), async {
    loop {
      if pred(&rx.borrow_and_update()) {
        return;
      }
      rx.changed().await.expect("feed alive");
    }
  })
  .await
  .expect("snapshot condition within 2s");
}

async fn next_notice(rx: &mut broadcast::Receiver<Notice>) -> Notice {
  timeout(Duration::from_secs(2), rx.recv())
    .await
    .expect("notice within 2s")
    .expect("notice channel open")
}

// ─── Lifecycle scenario ──────────────────────────────────────────────────────

#[tokio::test]
async fn claim_and_resolve_scenario() {
  let (backend, store) = backend().await;
  let d1 =
    registered_dashboard(&backend, &store, "north@example.com", "Station North")
      .await;
  let d2 =
    registered_dashboard(&backend, &store, "south@example.com", "Station South")
      .await;

  let accident = d1
    .report(NewAccident::new("Vehicle Collision", Severity::Critical, BASE))
    .await
    .unwrap();
  assert_eq!(accident.status, Status::Pending);

  // S1 claims; S2 loses the race.
  let claimed = d1.acknowledge(accident.id).await.unwrap();
  assert_eq!(claimed.status, Status::Acknowledged);
  assert_eq!(claimed.acknowledged_by, Some(d1.station().unwrap().id));

  let lost = d2.acknowledge(accident.id).await.unwrap_err();
  assert!(matches!(lost, Error::ClaimConflict(id) if id == accident.id));

  // Only the claim holder resolves, and only once.
  let not_holder = d2.resolve(accident.id).await.unwrap_err();
  assert!(matches!(not_holder, Error::OwnershipConflict(_)));

  let resolved = d1.resolve(accident.id).await.unwrap();
  assert_eq!(resolved.status, Status::Resolved);
  assert!(resolved.resolved_at.is_some());

  let again = d1.resolve(accident.id).await.unwrap_err();
  assert!(matches!(again, Error::OwnershipConflict(_)));
}

#[tokio::test]
async fn conflict_produces_exactly_one_error_notice() {
  let (backend, store) = backend().await;
  let d1 =
    registered_dashboard(&backend, &store, "north@example.com", "Station North")
      .await;
  let d2 =
    registered_dashboard(&backend, &store, "south@example.com", "Station South")
      .await;

  let accident = store
    .create_accident(NewAccident::new("Fire Reported", Severity::High, BASE))
    .await
    .unwrap();
  d1.acknowledge(accident.id).await.unwrap();

  // Let d2's feed absorb the insert and the claim before subscribing, so
  // the only notice observed is the one from the losing acknowledge.
  let mut snapshots = d2.watch();
  wait_until(&mut snapshots, |a| {
    a.first().is_some_and(|a| a.status == Status::Acknowledged)
  })
  .await;

  let mut notices = d2.notices();
  d2.acknowledge(accident.id).await.unwrap_err();

  let notice = next_notice(&mut notices).await;
  assert_eq!(notice.kind, NoticeKind::Error);
  assert!(notice.body.contains("may have already been claimed"));
  assert!(matches!(
    notices.try_recv(),
    Err(broadcast::error::TryRecvError::Empty)
  ));
}

// ─── Feed behaviour ──────────────────────────────────────────────────────────

#[tokio::test]
async fn feed_follows_inserts_and_announces_them() {
  let (backend, store) = backend().await;
  let d = registered_dashboard(&backend, &store, "north@example.com", "Station North")
    .await;

  let mut notices = d.notices();
  let mut snapshots = d.watch();

  let accident = store
    .create_accident(NewAccident::new(
      "Building Collapse",
      Severity::Critical,
      BASE,
    ))
    .await
    .unwrap();

  wait_until(&mut snapshots, |a| a.iter().any(|a| a.id == accident.id)).await;

  let notice = next_notice(&mut notices).await;
  assert_eq!(notice.kind, NoticeKind::Alert);
  assert!(notice.urgent, "critical accidents are urgent");
  assert_eq!(notice.body, "Building Collapse - CRITICAL");
}

#[tokio::test]
async fn simulate_reports_a_pending_accident() {
  let (backend, store) = backend().await;
  let d = registered_dashboard(&backend, &store, "north@example.com", "Station North")
    .await;

  let accident = d.simulate().await.unwrap();
  assert_eq!(accident.status, Status::Pending);
  assert_eq!(
    accident.description.as_deref(),
    Some("Simulated accident for testing purposes")
  );

  let mut snapshots = d.watch();
  wait_until(&mut snapshots, |a| a.iter().any(|a| a.id == accident.id)).await;
}

#[tokio::test]
async fn dropped_feed_stops_publishing() {
  let (_backend, store) = backend().await;
  let feed = LiveFeed::open(Arc::clone(&store), Notices::new())
    .await
    .unwrap();
  let mut snapshots = feed.watch();

  drop(feed);

  store
    .create_accident(NewAccident::new("Fire Reported", Severity::High, BASE))
    .await
    .unwrap();

  // The pump was aborted with the feed: the insert must not reach the
  // snapshot channel, which either stays silent or reports closure.
  match timeout(Duration::from_millis(500), snapshots.changed()).await {
    Err(_elapsed) => {}
    Ok(Err(_closed)) => {}
    Ok(Ok(())) => panic!("snapshot published after the feed was dropped"),
  }
}

// ─── Validation and session gating ───────────────────────────────────────────

#[tokio::test]
async fn short_station_name_never_reaches_the_provider() {
  let (backend, store) = backend().await;
  let d = dashboard(&backend, &store).await;

  let err = d
    .register("north@example.com", PASSWORD, "A", BASE)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Validation(ValidationError::StationNameTooShort)
  ));

  // The identity was never created: signing in with those credentials
  // fails as unknown.
  let err = d.sign_in("north@example.com", PASSWORD).await.unwrap_err();
  assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn actions_require_a_signed_in_station() {
  let (backend, store) = backend().await;
  let d = dashboard(&backend, &store).await;

  let mut notices = d.notices();
  let err = d.acknowledge(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NotSignedIn));

  // Still exactly one visible outcome.
  let notice = next_notice(&mut notices).await;
  assert_eq!(notice.kind, NoticeKind::Error);
}

#[tokio::test]
async fn failed_station_write_surfaces_and_leaves_no_station() {
  let backend = SqliteBackend::open_in_memory().await.unwrap();
  let mock = Arc::new(MockStore::new(vec![]));
  mock.fail_station_writes.store(true, Ordering::SeqCst);

  let d = Dashboard::open(Arc::new(backend.identity()), Arc::clone(&mock))
    .await
    .unwrap();

  let err = d
    .register("north@example.com", PASSWORD, "Station North", BASE)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Store(_)));

  // The session is live, but every mutating action is gated on a station.
  let err = d.acknowledge(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NoStation));
}

// ─── Read-failure resilience (mock store) ────────────────────────────────────

#[tokio::test]
async fn feed_keeps_last_good_snapshot_on_read_failure() {
  let mock = Arc::new(MockStore::new(vec![sample_accident("Fire Reported")]));
  let notices = Notices::new();
  let mut notice_rx = notices.subscribe();

  let feed = LiveFeed::open(Arc::clone(&mock), notices).await.unwrap();
  assert_eq!(feed.snapshot().len(), 1);

  // A failing reload warns and leaves the snapshot alone.
  mock.fail_reads.store(true, Ordering::SeqCst);
  mock.notify(ChangeEvent::Updated);

  let notice = next_notice(&mut notice_rx).await;
  assert_eq!(notice.kind, NoticeKind::Warning);
  assert_eq!(feed.snapshot().len(), 1);

  // Recovery: the next notification repairs the view.
  mock.fail_reads.store(false, Ordering::SeqCst);
  mock.insert(sample_accident("Power Line Down"));
  mock.notify(ChangeEvent::Inserted);

  let mut snapshots = feed.watch();
  wait_until(&mut snapshots, |a| a.len() == 2).await;
}

#[tokio::test]
async fn feed_starts_empty_when_the_initial_load_fails() {
  let mock = Arc::new(MockStore::new(vec![sample_accident("Fire Reported")]));
  mock.fail_reads.store(true, Ordering::SeqCst);

  let notices = Notices::new();
  let mut notice_rx = notices.subscribe();
  let feed = LiveFeed::open(Arc::clone(&mock), notices).await.unwrap();

  assert_eq!(next_notice(&mut notice_rx).await.kind, NoticeKind::Warning);
  assert!(feed.snapshot().is_empty());
}

// ─── Mock store ──────────────────────────────────────────────────────────────

fn sample_accident(title: &str) -> Accident {
  let now = Utc::now();
  Accident {
    id:               Uuid::new_v4(),
    title:            title.into(),
    description:      None,
    severity:         Severity::High,
    status:           Status::Pending,
    location_lat:     BASE.0,
    location_lng:     BASE.1,
    location_address: None,
    reported_at:      now,
    acknowledged_by:  None,
    acknowledged_at:  None,
    resolved_at:      None,
    created_at:       now,
    updated_at:       now,
    station:          None,
  }
}

/// An in-memory store whose reads and station writes can be made to fail.
struct MockStore {
  accidents:           Mutex<Vec<Accident>>,
  fail_reads:          AtomicBool,
  fail_station_writes: AtomicBool,
  changes:             broadcast::Sender<ChangeEvent>,
}

impl MockStore {
  fn new(accidents: Vec<Accident>) -> Self {
    let (changes, _) = broadcast::channel(16);
    Self {
      accidents: Mutex::new(accidents),
      fail_reads: AtomicBool::new(false),
      fail_station_writes: AtomicBool::new(false),
      changes,
    }
  }

  fn insert(&self, accident: Accident) {
    self.accidents.lock().unwrap().insert(0, accident);
  }

  fn notify(&self, event: ChangeEvent) {
    self.changes.send(event).expect("feed subscribed");
  }
}

struct MockChanges {
  rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeStream for MockChanges {
  async fn next(&mut self) -> Option<ChangeEvent> {
    self.rx.recv().await.ok()
  }
}

impl AccidentStore for MockStore {
  type Error = io::Error;
  type Changes = MockChanges;

  async fn list_accidents(&self) -> Result<Vec<Accident>, io::Error> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(io::Error::other("transport down"));
    }
    Ok(self.accidents.lock().unwrap().clone())
  }

  async fn create_accident(&self, _: NewAccident) -> Result<Accident, io::Error> {
    unimplemented!("not exercised by these tests")
  }

  async fn claim(
    &self,
    _: Uuid,
    _: Uuid,
  ) -> Result<Option<Accident>, io::Error> {
    unimplemented!("not exercised by these tests")
  }

  async fn complete(
    &self,
    _: Uuid,
    _: Uuid,
  ) -> Result<Option<Accident>, io::Error> {
    unimplemented!("not exercised by these tests")
  }

  async fn create_station(&self, input: NewStation) -> Result<Station, io::Error> {
    if self.fail_station_writes.load(Ordering::SeqCst) {
      return Err(io::Error::other("station write rejected"));
    }
    let now = Utc::now();
    Ok(Station {
      id:           Uuid::new_v4(),
      user_id:      input.user_id,
      name:         input.name,
      location_lat: input.location_lat,
      location_lng: input.location_lng,
      created_at:   now,
      updated_at:   now,
    })
  }

  async fn station_for_user(&self, _: Uuid) -> Result<Option<Station>, io::Error> {
    Ok(None)
  }

  async fn subscribe(&self) -> Result<MockChanges, io::Error> {
    Ok(MockChanges { rx: self.changes.subscribe() })
  }
}
