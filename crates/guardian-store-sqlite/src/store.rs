//! [`SqliteBackend`] — the SQLite implementation of [`AccidentStore`].

use std::path::Path;

use chrono::Utc;
use guardian_core::{
  accident::{Accident, NewAccident, Status},
  station::{NewStation, Station},
  store::{AccidentStore, ChangeEvent, ChangeStream},
};
use rusqlite::{OptionalExtension as _, hooks::Action};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawAccident, RawStation, encode_dt, encode_severity, encode_uuid},
  identity::SqliteIdentity,
  schema::SCHEMA,
};

/// Buffered change events per subscriber. Events are kind-only, so a
/// consumer that falls further behind just resyncs.
const CHANGE_BUFFER: usize = 64;

/// The read shape for accidents: every column plus the claiming station
/// left-joined. Station columns are NULL while no claim is held.
const ACCIDENT_SELECT: &str = "
  SELECT
    a.id, a.title, a.description, a.severity, a.status,
    a.location_lat, a.location_lng, a.location_address,
    a.reported_at, a.acknowledged_by, a.acknowledged_at, a.resolved_at,
    a.created_at, a.updated_at,
    s.id, s.user_id, s.name, s.location_lat, s.location_lng,
    s.created_at, s.updated_at
  FROM accidents a
  LEFT JOIN stations s ON s.id = a.acknowledged_by";

fn accident_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAccident> {
  Ok(RawAccident {
    id:               row.get(0)?,
    title:            row.get(1)?,
    description:      row.get(2)?,
    severity:         row.get(3)?,
    status:           row.get(4)?,
    location_lat:     row.get(5)?,
    location_lng:     row.get(6)?,
    location_address: row.get(7)?,
    reported_at:      row.get(8)?,
    acknowledged_by:  row.get(9)?,
    acknowledged_at:  row.get(10)?,
    resolved_at:      row.get(11)?,
    created_at:       row.get(12)?,
    updated_at:       row.get(13)?,

    station_id:         row.get(14)?,
    station_user_id:    row.get(15)?,
    station_name:       row.get(16)?,
    station_lat:        row.get(17)?,
    station_lng:        row.get(18)?,
    station_created_at: row.get(19)?,
    station_updated_at: row.get(20)?,
  })
}

fn station_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawStation> {
  Ok(RawStation {
    id:           row.get(0)?,
    user_id:      row.get(1)?,
    name:         row.get(2)?,
    location_lat: row.get(3)?,
    location_lng: row.get(4)?,
    created_at:   row.get(5)?,
    updated_at:   row.get(6)?,
  })
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// A Guardian accident store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and all
/// clones feed the same change channel.
#[derive(Clone)]
pub struct SqliteBackend {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteBackend {
  /// Open (or create) a backend at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory backend — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_BUFFER);
    let backend = Self { conn, changes };
    backend.init_schema().await?;
    backend.install_update_hook().await?;
    Ok(backend)
  }

  /// An identity provider persisting into this backend's database. Each
  /// handle keeps its own session state; the identity records are shared.
  pub fn identity(&self) -> SqliteIdentity {
    SqliteIdentity::with_connection(self.conn.clone())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Forward every committed mutation of the accidents table into the
  /// change channel. SQLite fires the hook once per modified row, so a
  /// conditional UPDATE that matches zero rows notifies nobody.
  async fn install_update_hook(&self) -> Result<()> {
    let tx = self.changes.clone();
    self
      .conn
      .call(move |conn| {
        conn.update_hook(Some(
          move |action: Action, _db: &str, table: &str, _rowid: i64| {
            if table != "accidents" {
              return;
            }
            let event = match action {
              Action::SQLITE_INSERT => ChangeEvent::Inserted,
              Action::SQLITE_UPDATE => ChangeEvent::Updated,
              Action::SQLITE_DELETE => ChangeEvent::Deleted,
              _ => return,
            };
            // No receivers just means nobody is watching yet.
            let _ = tx.send(event);
          },
        ));
        Ok(())
      })
      .await?;
    Ok(())
  }

}

// ─── AccidentStore impl ──────────────────────────────────────────────────────

impl AccidentStore for SqliteBackend {
  type Error = Error;
  type Changes = SqliteChanges;

  // ── Accidents ───────────────────────────────────────────────────────────

  async fn list_accidents(&self) -> Result<Vec<Accident>> {
    let raws: Vec<RawAccident> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("{ACCIDENT_SELECT} ORDER BY a.reported_at DESC"))?;
        let rows = stmt
          .query_map([], accident_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccident::into_accident).collect()
  }

  async fn create_accident(&self, input: NewAccident) -> Result<Accident> {
    let now = Utc::now();
    let accident = Accident {
      id:               Uuid::new_v4(),
      title:            input.title,
      description:      input.description,
      severity:         input.severity,
      // Every accident enters the store pending, whatever the caller held.
      status:           Status::Pending,
      location_lat:     input.location_lat,
      location_lng:     input.location_lng,
      location_address: input.location_address,
      reported_at:      now,
      acknowledged_by:  None,
      acknowledged_at:  None,
      resolved_at:      None,
      created_at:       now,
      updated_at:       now,
      station:          None,
    };

    let id_str       = encode_uuid(accident.id);
    let title        = accident.title.clone();
    let description  = accident.description.clone();
    let severity_str = encode_severity(accident.severity);
    let lat          = accident.location_lat;
    let lng          = accident.location_lng;
    let address      = accident.location_address.clone();
    let now_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accidents (
             id, title, description, severity, status,
             location_lat, location_lng, location_address,
             reported_at, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7, ?8, ?8, ?8)",
          rusqlite::params![
            id_str,
            title,
            description,
            severity_str,
            lat,
            lng,
            address,
            now_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(accident)
  }

  async fn claim(
    &self,
    accident_id: Uuid,
    station_id: Uuid,
  ) -> Result<Option<Accident>> {
    let id_str      = encode_uuid(accident_id);
    let station_str = encode_uuid(station_id);
    let now_str     = encode_dt(Utc::now());

    // UPDATE and re-read run in one closure, serialised on the connection
    // thread, so the returned row is the state this claim produced.
    let raw: Option<RawAccident> = self
      .conn
      .call(move |conn| {
        let matched = conn.execute(
          "UPDATE accidents
              SET status          = 'acknowledged',
                  acknowledged_by = ?2,
                  acknowledged_at = ?3,
                  updated_at      = ?3
            WHERE id = ?1 AND status = 'pending'",
          rusqlite::params![id_str, station_str, now_str],
        )?;

        if matched == 0 {
          return Ok(None);
        }

        let row = conn.query_row(
          &format!("{ACCIDENT_SELECT} WHERE a.id = ?1"),
          rusqlite::params![id_str],
          accident_from_row,
        )?;
        Ok(Some(row))
      })
      .await?;

    raw.map(RawAccident::into_accident).transpose()
  }

  async fn complete(
    &self,
    accident_id: Uuid,
    station_id: Uuid,
  ) -> Result<Option<Accident>> {
    let id_str      = encode_uuid(accident_id);
    let station_str = encode_uuid(station_id);
    let now_str     = encode_dt(Utc::now());

    // The status term keeps a second resolve from matching: acknowledged_by
    // survives resolution, the acknowledged state does not.
    let raw: Option<RawAccident> = self
      .conn
      .call(move |conn| {
        let matched = conn.execute(
          "UPDATE accidents
              SET status      = 'resolved',
                  resolved_at = ?3,
                  updated_at  = ?3
            WHERE id = ?1
              AND status = 'acknowledged'
              AND acknowledged_by = ?2",
          rusqlite::params![id_str, station_str, now_str],
        )?;

        if matched == 0 {
          return Ok(None);
        }

        let row = conn.query_row(
          &format!("{ACCIDENT_SELECT} WHERE a.id = ?1"),
          rusqlite::params![id_str],
          accident_from_row,
        )?;
        Ok(Some(row))
      })
      .await?;

    raw.map(RawAccident::into_accident).transpose()
  }

  // ── Stations ────────────────────────────────────────────────────────────

  async fn create_station(&self, input: NewStation) -> Result<Station> {
    let now = Utc::now();
    let station = Station {
      id:           Uuid::new_v4(),
      user_id:      input.user_id,
      name:         input.name,
      location_lat: input.location_lat,
      location_lng: input.location_lng,
      created_at:   now,
      updated_at:   now,
    };

    let id_str   = encode_uuid(station.id);
    let user_str = encode_uuid(station.user_id);
    let name     = station.name.clone();
    let lat      = station.location_lat;
    let lng      = station.location_lng;
    let now_str  = encode_dt(now);

    // Check-then-insert runs in one closure, serialised on the connection
    // thread, so a racing create surfaces as StationExists rather than a
    // raw UNIQUE-constraint failure.
    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: Option<i64> = conn
          .query_row(
            "SELECT 1 FROM stations WHERE user_id = ?1",
            rusqlite::params![user_str],
            |row| row.get(0),
          )
          .optional()?;

        if taken.is_some() {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO stations (
             id, user_id, name, location_lat, location_lng,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, user_str, name, lat, lng, now_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::StationExists(station.user_id));
    }

    Ok(station)
  }

  async fn station_for_user(&self, user_id: Uuid) -> Result<Option<Station>> {
    let user_str = encode_uuid(user_id);

    let raw: Option<RawStation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, user_id, name, location_lat, location_lng,
                      created_at, updated_at
                 FROM stations WHERE user_id = ?1",
              rusqlite::params![user_str],
              station_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStation::into_station).transpose()
  }

  // ── Change feed ─────────────────────────────────────────────────────────

  async fn subscribe(&self) -> Result<SqliteChanges> {
    Ok(SqliteChanges { rx: self.changes.subscribe() })
  }
}

// ─── Change stream ───────────────────────────────────────────────────────────

/// A live subscription to accident changes. Dropping the handle
/// unregisters the subscriber.
pub struct SqliteChanges {
  rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeStream for SqliteChanges {
  async fn next(&mut self) -> Option<ChangeEvent> {
    match self.rx.recv().await {
      Ok(event) => Some(event),
      // A lagged consumer missed events. It responds to any event with a
      // full re-list, so a synthetic Updated is enough to resync.
      Err(broadcast::error::RecvError::Lagged(_)) => Some(ChangeEvent::Updated),
      Err(broadcast::error::RecvError::Closed) => None,
    }
  }
}
