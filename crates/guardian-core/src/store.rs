//! The `AccidentStore` trait and the change-notification contract.
//!
//! The trait is implemented by storage backends (e.g.
//! `guardian-store-sqlite`). Higher layers (`guardian-dashboard`) depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  accident::{Accident, NewAccident},
  station::{NewStation, Station},
};

// ─── Change notifications ────────────────────────────────────────────────────

/// A change to the accidents collection. Carries only the kind of mutation:
/// no payload, no ordering guarantee. Consumers re-list on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
  Inserted,
  Updated,
  Deleted,
}

/// A live subscription to accident changes.
///
/// `next` resolves to `None` once the backend has shut down. Dropping the
/// stream unregisters the subscription; nothing else is required of the
/// consumer.
pub trait ChangeStream: Send {
  fn next(&mut self) -> impl Future<Output = Option<ChangeEvent>> + Send + '_;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the shared accident store.
///
/// The lifecycle transitions (`claim`, `complete`) are single-row
/// conditional updates: the store applies the write only where the filter
/// still matches, and reports zero matched rows as `Ok(None)`. That
/// row-count check is the only concurrency primitive in the system — there
/// are no client-side locks and no automatic retries.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait AccidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
  type Changes: ChangeStream;

  // ── Accidents ─────────────────────────────────────────────────────────

  /// List every accident, newest `reported_at` first, each with its
  /// claiming station joined when present.
  fn list_accidents(
    &self,
  ) -> impl Future<Output = Result<Vec<Accident>, Self::Error>> + Send + '_;

  /// Insert a new accident. The store forces `status` to `Pending` and
  /// stamps `id`, `reported_at`, `created_at` and `updated_at`.
  fn create_accident(
    &self,
    input: NewAccident,
  ) -> impl Future<Output = Result<Accident, Self::Error>> + Send + '_;

  /// Conditionally acknowledge: set `status = acknowledged` and record the
  /// claiming station, but only where the accident is still `Pending`.
  ///
  /// Returns `Ok(Some(updated))` when the filter matched, `Ok(None)` when
  /// zero rows matched (someone else claimed first, or the id is unknown).
  fn claim(
    &self,
    accident_id: Uuid,
    station_id: Uuid,
  ) -> impl Future<Output = Result<Option<Accident>, Self::Error>> + Send + '_;

  /// Conditionally resolve: set `status = resolved`, but only where the
  /// accident is `Acknowledged` and held by `station_id`.
  ///
  /// Same `Option` contract as [`AccidentStore::claim`]: `Ok(None)` means
  /// the claim was reassigned, the accident is already resolved, or this
  /// station never held it.
  fn complete(
    &self,
    accident_id: Uuid,
    station_id: Uuid,
  ) -> impl Future<Output = Result<Option<Accident>, Self::Error>> + Send + '_;

  // ── Stations ──────────────────────────────────────────────────────────

  /// Provision a station for a newly registered identity. Errors if the
  /// identity already owns one.
  fn create_station(
    &self,
    input: NewStation,
  ) -> impl Future<Output = Result<Station, Self::Error>> + Send + '_;

  /// Look up the station owned by `user_id`, if any.
  fn station_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Station>, Self::Error>> + Send + '_;

  // ── Change feed ───────────────────────────────────────────────────────

  /// Open a subscription to accident changes. Events for other collections
  /// (stations, identities) are not delivered.
  fn subscribe(
    &self,
  ) -> impl Future<Output = Result<Self::Changes, Self::Error>> + Send + '_;
}
