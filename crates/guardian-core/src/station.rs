//! Station — a response unit bound to exactly one signed-in identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A response station. Each identity (`user_id`) owns at most one station,
/// provisioned at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
  pub id:           Uuid,
  pub user_id:      Uuid,
  pub name:         String,
  pub location_lat: f64,
  pub location_lng: f64,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::AccidentStore::create_station`].
/// `id` and the timestamps are stamped by the store.
#[derive(Debug, Clone)]
pub struct NewStation {
  pub user_id:      Uuid,
  pub name:         String,
  pub location_lat: f64,
  pub location_lng: f64,
}
