//! Binary configuration, loaded from a TOML file plus `GUARDIAN_*`
//! environment overrides.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
  /// Path to the SQLite database file.
  pub store_path: PathBuf,

  pub email:    String,
  pub password: String,

  /// Required with `--register`; ignored otherwise.
  #[serde(default)]
  pub station_name: Option<String>,
  #[serde(default)]
  pub station_lat:  Option<f64>,
  #[serde(default)]
  pub station_lng:  Option<f64>,

  /// Seconds between simulated accidents with `--simulate`.
  #[serde(default)]
  pub simulate_interval_secs: Option<u64>,
}
