//! SQLite backend for the Ordo positioning service.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every operation that touches more than
//! one row runs as a single `BEGIN IMMEDIATE` transaction inside one
//! connection call, so no partial shift is ever committed or observed.

mod encode;
mod engine;
mod positions;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteStore, StoreOptions};
