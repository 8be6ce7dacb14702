//! SQLite directory for the Roster access-control engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every [`Directory`] read is a single
//! statement executed inside one connection call, so each answer reflects a
//! single point in time.
//!
//! [`Directory`]: roster_core::Directory

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteDirectory;
