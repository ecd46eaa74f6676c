//! guardian dashboard binary.
//!
//! Reads `guardian.toml` (or the path specified with `--config`), opens an
//! in-process SQLite backend, signs the station in, and follows the live
//! accident feed, rendering notices and status counts as log lines.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use guardian_dashboard::{Dashboard, DashboardConfig, simulate};
use guardian_store_sqlite::SqliteBackend;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Fallback cadence for `--simulate` when the config does not set one.
const DEFAULT_SIMULATE_INTERVAL_SECS: u64 = 30;

#[derive(Parser)]
#[command(author, version, about = "Guardian incident dashboard")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "guardian.toml")]
  config: PathBuf,

  /// Register a new station account instead of signing in.
  #[arg(long)]
  register: bool,

  /// Periodically report simulated accidents.
  #[arg(long)]
  simulate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("GUARDIAN"))
    .build()
    .context("failed to read config file")?;

  let cfg: DashboardConfig = settings
    .try_deserialize()
    .context("failed to deserialise DashboardConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&cfg.store_path);

  let backend = SqliteBackend::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let identity = Arc::new(backend.identity());
  let store = Arc::new(backend);

  let dashboard = Dashboard::open(identity, store)
    .await
    .context("failed to start dashboard")?;

  if cli.register {
    let name = cfg
      .station_name
      .as_deref()
      .context("station_name is required with --register")?;
    let location = (
      cfg.station_lat.unwrap_or(simulate::DEFAULT_BASE.0),
      cfg.station_lng.unwrap_or(simulate::DEFAULT_BASE.1),
    );
    let station = dashboard
      .register(&cfg.email, &cfg.password, name, location)
      .await
      .context("registration failed")?;
    tracing::info!(station = %station.id, name = %station.name, "station registered");
  } else {
    dashboard
      .sign_in(&cfg.email, &cfg.password)
      .await
      .context("sign-in failed")?;
  }

  let mut snapshots = dashboard.watch();
  let mut sim_interval = tokio::time::interval(Duration::from_secs(
    cfg
      .simulate_interval_secs
      .unwrap_or(DEFAULT_SIMULATE_INTERVAL_SECS),
  ));

  tracing::info!("following the live accident feed; Ctrl-C to exit");

  loop {
    tokio::select! {
      _ = tokio::signal::ctrl_c() => break,

      changed = snapshots.changed() => {
        if changed.is_err() {
          break;
        }
        let counts = dashboard.counts();
        tracing::info!(
          all          = counts.all,
          pending      = counts.pending,
          acknowledged = counts.acknowledged,
          resolved     = counts.resolved,
          critical_unresolved = dashboard.critical_unresolved(),
          "accident feed updated",
        );
      }

      _ = sim_interval.tick(), if cli.simulate => {
        // One outcome notice per attempt; nothing more to do here.
        let _ = dashboard.simulate().await;
      }
    }
  }

  tracing::info!("shutting down");
  dashboard.sign_out().await.context("sign-out failed")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
