//! The dashboard view model — pure functions over an accident snapshot.
//!
//! Everything here is recomputed from scratch on every change; nothing is
//! cached or diffed incrementally. The input slice is expected in feed
//! order (newest `reported_at` first) and that order is preserved.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::accident::{Accident, Severity, Status};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// The status tab selected on the dashboard.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatusFilter {
  #[default]
  All,
  Pending,
  Acknowledged,
  Resolved,
}

impl StatusFilter {
  pub fn admits(self, status: Status) -> bool {
    match self {
      Self::All => true,
      Self::Pending => status == Status::Pending,
      Self::Acknowledged => status == Status::Acknowledged,
      Self::Resolved => status == Status::Resolved,
    }
  }
}

/// Accidents admitted by `filter`, in input order. `All` is the identity.
pub fn filtered(accidents: &[Accident], filter: StatusFilter) -> Vec<&Accident> {
  accidents
    .iter()
    .filter(|a| filter.admits(a.status))
    .collect()
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Per-tab counts shown alongside the filter. `all` is the snapshot length;
/// the three status counts partition it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
  pub all:          usize,
  pub pending:      usize,
  pub acknowledged: usize,
  pub resolved:     usize,
}

impl StatusCounts {
  pub fn of(accidents: &[Accident]) -> Self {
    let mut counts = Self::default();
    for accident in accidents {
      counts.all += 1;
      match accident.status {
        Status::Pending => counts.pending += 1,
        Status::Acknowledged => counts.acknowledged += 1,
        Status::Resolved => counts.resolved += 1,
      }
    }
    counts
  }

  pub fn get(self, filter: StatusFilter) -> usize {
    match filter {
      StatusFilter::All => self.all,
      StatusFilter::Pending => self.pending,
      StatusFilter::Acknowledged => self.acknowledged,
      StatusFilter::Resolved => self.resolved,
    }
  }
}

// ─── Critical banner ─────────────────────────────────────────────────────────

/// Count of critical accidents that are not yet resolved. Feeds the urgent
/// banner only; no control flow depends on it.
pub fn critical_unresolved(accidents: &[Accident]) -> usize {
  accidents
    .iter()
    .filter(|a| a.severity == Severity::Critical && a.status != Status::Resolved)
    .count()
}
