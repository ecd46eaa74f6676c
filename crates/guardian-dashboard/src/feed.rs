//! The live accident feed.
//!
//! Subscribes to change notifications first, then loads the full set, and
//! re-lists the whole collection on every notification. Events carry no
//! payload and no ordering guarantee, so a full reload is the only correct
//! response; at expected incident volumes the simplicity is worth far more
//! than incremental diffing.
//!
//! Read failures never tear the feed down: the last good snapshot stays
//! published and a warning notice is pushed instead.

use std::sync::Arc;

use guardian_core::{
  Error,
  accident::{Accident, Severity},
  store::{AccidentStore, ChangeEvent, ChangeStream as _},
};
use tokio::sync::watch;

use crate::notice::{Notice, Notices};

/// A live, self-updating snapshot of the accident collection.
///
/// Dropping the feed aborts the pump task and releases the store
/// subscription.
pub struct LiveFeed<S> {
  store:     Arc<S>,
  snapshots: Arc<watch::Sender<Vec<Accident>>>,
  rx:        watch::Receiver<Vec<Accident>>,
  pump:      tokio::task::JoinHandle<()>,
}

impl<S> LiveFeed<S>
where
  S: AccidentStore + 'static,
  S::Changes: 'static,
{
  /// Subscribe and load the initial snapshot.
  ///
  /// The subscription is opened before the first list so no mutation can
  /// fall between them unobserved. A failing initial load starts the feed
  /// empty with a warning; the next notification repairs it.
  pub async fn open(store: Arc<S>, notices: Notices) -> Result<Self, Error> {
    let mut changes = store.subscribe().await.map_err(Error::store)?;

    let initial = match store.list_accidents().await {
      Ok(accidents) => accidents,
      Err(e) => {
        tracing::warn!(error = %e, "initial accident load failed");
        notices.push(Notice::warning("Error", "Failed to fetch accidents"));
        Vec::new()
      }
    };

    let (tx, rx) = watch::channel(initial);
    let snapshots = Arc::new(tx);

    let pump = tokio::spawn({
      let store = Arc::clone(&store);
      let snapshots = Arc::clone(&snapshots);
      async move {
        while let Some(event) = changes.next().await {
          match store.list_accidents().await {
            Ok(accidents) => {
              if event == ChangeEvent::Inserted {
                announce_newest(&notices, accidents.first());
              }
              snapshots.send_replace(accidents);
            }
            Err(e) => {
              // Keep the last good snapshot.
              tracing::warn!(error = %e, "accident reload failed");
              notices.push(Notice::warning("Error", "Failed to fetch accidents"));
            }
          }
        }
        tracing::debug!("change stream closed; live feed stopping");
      }
    });

    Ok(Self { store, snapshots, rx, pump })
  }

  /// The current snapshot, in feed order (newest `reported_at` first).
  pub fn snapshot(&self) -> Vec<Accident> {
    self.rx.borrow().clone()
  }

  /// A receiver that observes every published snapshot.
  pub fn watch(&self) -> watch::Receiver<Vec<Accident>> {
    self.rx.clone()
  }

  /// Re-list immediately, outside the notification path. Used after a
  /// conflict so the user sees the state that beat them.
  pub async fn refresh(&self) -> Result<(), Error> {
    let accidents = self.store.list_accidents().await.map_err(Error::store)?;
    self.snapshots.send_replace(accidents);
    Ok(())
  }
}

impl<S> Drop for LiveFeed<S> {
  fn drop(&mut self) {
    self.pump.abort();
  }
}

/// The new-accident alert, urgent when critical.
fn announce_newest(notices: &Notices, newest: Option<&Accident>) {
  let Some(accident) = newest else { return };
  notices.push(Notice::alert(
    "New Accident Alert!",
    format!(
      "{} - {}",
      accident.title,
      accident.severity.as_ref().to_uppercase()
    ),
    accident.severity == Severity::Critical,
  ));
}
