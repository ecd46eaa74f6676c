//! Accident simulation — random drafts for exercising the live feed.

use guardian_core::accident::{NewAccident, Severity};
use rand::Rng;
use strum::VariantArray as _;

/// Default base point for simulated coordinates (lower Manhattan).
pub const DEFAULT_BASE: (f64, f64) = (40.7128, -74.006);

/// Coordinates are jittered by up to this many degrees around the base.
const JITTER_DEGREES: f64 = 0.05;

const TITLES: [&str; 6] = [
  "Vehicle Collision",
  "Fire Reported",
  "Medical Emergency",
  "Hazardous Spill",
  "Building Collapse",
  "Power Line Down",
];

const ADDRESSES: [&str; 5] = [
  "123 Main Street",
  "456 Oak Avenue",
  "789 Pine Road",
  "321 Elm Boulevard",
  "654 Maple Lane",
];

const DESCRIPTION: &str = "Simulated accident for testing purposes";

/// Build a random accident draft near `base` using the thread-local RNG.
pub fn random_draft(base: (f64, f64)) -> NewAccident {
  draft_with(&mut rand::thread_rng(), base)
}

/// Deterministic variant for callers that hold their own RNG.
pub fn draft_with<R: Rng + ?Sized>(rng: &mut R, base: (f64, f64)) -> NewAccident {
  NewAccident {
    title:            TITLES[rng.gen_range(0..TITLES.len())].to_owned(),
    description:      Some(DESCRIPTION.to_owned()),
    severity:         Severity::VARIANTS[rng.gen_range(0..Severity::VARIANTS.len())],
    location_lat:     base.0 + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES),
    location_lng:     base.1 + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES),
    location_address: Some(ADDRESSES[rng.gen_range(0..ADDRESSES.len())].to_owned()),
  }
}
