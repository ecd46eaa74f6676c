//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings (which sort
//! lexicographically in chronological order for UTC). UUIDs are stored as
//! hyphenated lowercase strings; severity and status use their wire
//! spellings, matched by the schema's CHECK constraints.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use guardian_core::{
  accident::{Accident, Severity, Status},
  station::Station,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Severity / Status ───────────────────────────────────────────────────────

pub fn encode_severity(s: Severity) -> String { s.to_string() }

pub fn decode_severity(s: &str) -> Result<Severity> {
  Severity::from_str(s).map_err(|_| Error::UnknownSeverity(s.to_owned()))
}

pub fn decode_status(s: &str) -> Result<Status> {
  Status::from_str(s).map_err(|_| Error::UnknownStatus(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `stations` row.
pub struct RawStation {
  pub id:           String,
  pub user_id:      String,
  pub name:         String,
  pub location_lat: f64,
  pub location_lng: f64,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawStation {
  pub fn into_station(self) -> Result<Station> {
    Ok(Station {
      id:           decode_uuid(&self.id)?,
      user_id:      decode_uuid(&self.user_id)?,
      name:         self.name,
      location_lat: self.location_lat,
      location_lng: self.location_lng,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from an `accidents` row left-joined with the claiming
/// station. The station columns are all NULL when no claim is held.
pub struct RawAccident {
  // accidents columns
  pub id:               String,
  pub title:            String,
  pub description:      Option<String>,
  pub severity:         String,
  pub status:           String,
  pub location_lat:     f64,
  pub location_lng:     f64,
  pub location_address: Option<String>,
  pub reported_at:      String,
  pub acknowledged_by:  Option<String>,
  pub acknowledged_at:  Option<String>,
  pub resolved_at:      Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
  // stations join
  pub station_id:         Option<String>,
  pub station_user_id:    Option<String>,
  pub station_name:       Option<String>,
  pub station_lat:        Option<f64>,
  pub station_lng:        Option<f64>,
  pub station_created_at: Option<String>,
  pub station_updated_at: Option<String>,
}

impl RawAccident {
  pub fn into_accident(self) -> Result<Accident> {
    let station = if let (
      Some(id),
      Some(user_id),
      Some(name),
      Some(lat),
      Some(lng),
      Some(created_at),
      Some(updated_at),
    ) = (
      self.station_id,
      self.station_user_id,
      self.station_name,
      self.station_lat,
      self.station_lng,
      self.station_created_at,
      self.station_updated_at,
    ) {
      Some(
        RawStation {
          id,
          user_id,
          name,
          location_lat: lat,
          location_lng: lng,
          created_at,
          updated_at,
        }
        .into_station()?,
      )
    } else {
      None
    };

    Ok(Accident {
      id:               decode_uuid(&self.id)?,
      title:            self.title,
      description:      self.description,
      severity:         decode_severity(&self.severity)?,
      status:           decode_status(&self.status)?,
      location_lat:     self.location_lat,
      location_lng:     self.location_lng,
      location_address: self.location_address,
      reported_at:      decode_dt(&self.reported_at)?,
      acknowledged_by:  self
        .acknowledged_by
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      acknowledged_at:  self
        .acknowledged_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      resolved_at:      self.resolved_at.as_deref().map(decode_dt).transpose()?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
      station,
    })
  }
}
