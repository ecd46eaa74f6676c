//! Accident types — the record every station watches and acts on.
//!
//! An accident advances through exactly one path: `pending` →
//! `acknowledged` → `resolved`. No field of a stored accident is edited
//! directly by clients; the store applies transitions as conditional
//! updates and stamps the timestamps itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};
use uuid::Uuid;

use crate::station::Station;

// ─── Severity ────────────────────────────────────────────────────────────────

/// How serious an accident is. A closed set; the spelling below is the wire
/// and column representation.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
  Critical,
  High,
  Medium,
  Low,
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where an accident sits in its lifecycle. Transitions are one-directional:
/// `Pending` → `Acknowledged` → `Resolved`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
  Pending,
  Acknowledged,
  Resolved,
}

impl Status {
  /// Human-readable label used in log lines and notices.
  pub fn label(self) -> &'static str {
    match self {
      Self::Pending => "Pending Response",
      Self::Acknowledged => "In Progress",
      Self::Resolved => "Resolved",
    }
  }

  /// `Resolved` is terminal; nothing transitions out of it.
  pub fn is_terminal(self) -> bool { matches!(self, Self::Resolved) }
}

// ─── Accident ────────────────────────────────────────────────────────────────

/// A stored accident as returned by the store, with the claiming station
/// joined when one holds the claim.
///
/// Field names are the wire contract and must not drift from the stored
/// column names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Accident {
  pub id:               Uuid,
  pub title:            String,
  pub description:      Option<String>,
  pub severity:         Severity,
  pub status:           Status,
  pub location_lat:     f64,
  pub location_lng:     f64,
  pub location_address: Option<String>,
  /// Store-assigned timestamp; never changes after creation.
  pub reported_at:      DateTime<Utc>,
  /// The station currently (or last) holding the claim.
  pub acknowledged_by:  Option<Uuid>,
  pub acknowledged_at:  Option<DateTime<Utc>>,
  pub resolved_at:      Option<DateTime<Utc>>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
  /// Read-model attachment: the claiming station's record, joined on read.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub station:          Option<Station>,
}

// ─── NewAccident ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::AccidentStore::create_accident`].
///
/// `status` is not accepted from callers — every new accident enters the
/// store as `Pending`, and `id`/`reported_at`/`created_at`/`updated_at` are
/// stamped by the store.
#[derive(Debug, Clone)]
pub struct NewAccident {
  pub title:            String,
  pub description:      Option<String>,
  pub severity:         Severity,
  pub location_lat:     f64,
  pub location_lng:     f64,
  pub location_address: Option<String>,
}

impl NewAccident {
  /// Convenience constructor with the optional fields left empty.
  pub fn new(
    title: impl Into<String>,
    severity: Severity,
    location: (f64, f64),
  ) -> Self {
    Self {
      title: title.into(),
      description: None,
      severity,
      location_lat: location.0,
      location_lng: location.1,
      location_address: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use chrono::TimeZone as _;

  use super::*;

  fn sample() -> Accident {
    Accident {
      id:               Uuid::nil(),
      title:            "Vehicle Collision".into(),
      description:      None,
      severity:         Severity::Critical,
      status:           Status::Pending,
      location_lat:     40.7128,
      location_lng:     -74.006,
      location_address: Some("123 Main Street".into()),
      reported_at:      Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
      acknowledged_by:  None,
      acknowledged_at:  None,
      resolved_at:      None,
      created_at:       Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
      updated_at:       Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
      station:          None,
    }
  }

  #[test]
  fn wire_field_names_are_stable() {
    let json = serde_json::to_value(sample()).unwrap();
    let obj = json.as_object().unwrap();

    for key in [
      "id",
      "title",
      "description",
      "severity",
      "status",
      "location_lat",
      "location_lng",
      "location_address",
      "reported_at",
      "acknowledged_by",
      "acknowledged_at",
      "resolved_at",
      "created_at",
      "updated_at",
    ] {
      assert!(obj.contains_key(key), "missing wire field {key:?}");
    }
    // The joined station is a read-model attachment, omitted when absent.
    assert!(!obj.contains_key("station"));

    assert_eq!(obj["severity"], "critical");
    assert_eq!(obj["status"], "pending");
  }

  #[test]
  fn enum_spellings_roundtrip() {
    assert_eq!(Severity::High.to_string(), "high");
    assert_eq!(Severity::from_str("critical").unwrap(), Severity::Critical);
    assert!(Severity::from_str("catastrophic").is_err());

    assert_eq!(Status::Acknowledged.as_ref(), "acknowledged");
    assert_eq!(Status::from_str("resolved").unwrap(), Status::Resolved);
    assert!(Status::from_str("closed").is_err());
  }

  #[test]
  fn status_labels() {
    assert_eq!(Status::Pending.label(), "Pending Response");
    assert_eq!(Status::Acknowledged.label(), "In Progress");
    assert_eq!(Status::Resolved.label(), "Resolved");
    assert!(Status::Resolved.is_terminal());
    assert!(!Status::Acknowledged.is_terminal());
  }

  #[test]
  fn accident_json_roundtrip() {
    let mut a = sample();
    a.status = Status::Acknowledged;
    a.acknowledged_by = Some(Uuid::new_v4());
    a.acknowledged_at = Some(a.updated_at);

    let json = serde_json::to_string(&a).unwrap();
    let back: Accident = serde_json::from_str(&json).unwrap();

    assert_eq!(back.id, a.id);
    assert_eq!(back.status, Status::Acknowledged);
    assert_eq!(back.acknowledged_by, a.acknowledged_by);
    assert_eq!(back.location_lng, a.location_lng);
  }
}
