//! SQLite backend for the Guardian accident store and identity provider.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The same database file carries the
//! accidents, stations and identity tables; [`SqliteBackend::identity`]
//! hands out an identity provider sharing the backend's connection.

mod encode;
mod identity;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use identity::{SqliteIdentity, SqliteSessionEvents};
pub use store::{SqliteBackend, SqliteChanges};
