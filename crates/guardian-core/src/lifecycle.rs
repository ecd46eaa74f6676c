//! The lifecycle engine — report, acknowledge, resolve.
//!
//! Every transition is delegated to the store as a conditional update; the
//! engine's job is to validate drafts locally and to turn a zero-row result
//! into the precise conflict error. It holds no locks, keeps no cache of
//! accident state, and never retries: on conflict the caller refreshes and
//! the user decides.
//!
//! There is deliberately no path backwards. A station that acknowledges and
//! then goes dark leaves the accident `Acknowledged`; no component is
//! entitled to revert a transition.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  accident::{Accident, NewAccident},
  station::Station,
  store::AccidentStore,
  validate,
};

/// Drives accident state transitions against any [`AccidentStore`].
///
/// Cheap to clone; the store handle is reference-counted.
#[derive(Debug)]
pub struct LifecycleEngine<S> {
  store: Arc<S>,
}

impl<S> Clone for LifecycleEngine<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: AccidentStore> LifecycleEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Report a new accident. The draft is validated locally first; the store
  /// forces `status` to `Pending` and stamps the timestamps.
  pub async fn report(&self, draft: NewAccident) -> Result<Accident> {
    validate::accident_title(&draft.title)?;
    self.store.create_accident(draft).await.map_err(Error::store)
  }

  /// Claim a pending accident for `station`.
  ///
  /// Exactly one of any set of concurrent claims succeeds; the rest get
  /// [`Error::ClaimConflict`] and should refresh their view.
  pub async fn acknowledge(
    &self,
    accident_id: Uuid,
    station: &Station,
  ) -> Result<Accident> {
    self
      .store
      .claim(accident_id, station.id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ClaimConflict(accident_id))
  }

  /// Resolve an accident this station has acknowledged.
  ///
  /// Fails with [`Error::OwnershipConflict`] when the accident is not
  /// currently acknowledged by `station` — including when it has already
  /// been resolved.
  pub async fn resolve(
    &self,
    accident_id: Uuid,
    station: &Station,
  ) -> Result<Accident> {
    self
      .store
      .complete(accident_id, station.id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::OwnershipConflict(accident_id))
  }
}
