//! Client composition for the Guardian incident dashboard.
//!
//! Everything here is generic over the two `guardian-core` service traits;
//! only the binary picks a concrete backend.

pub mod config;
pub mod dashboard;
pub mod feed;
pub mod notice;
pub mod simulate;

pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use feed::LiveFeed;
pub use notice::{Notice, NoticeKind, Notices};

#[cfg(test)]
mod tests;
