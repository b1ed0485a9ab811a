//! Core types and trait definitions for the Ordo positioning service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::PositionStore`]; the move and
//! compaction arithmetic lives in [`plan`] so it can be tested without a
//! database.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod group;
pub mod id;
pub mod item;
pub mod plan;
pub mod retry;
pub mod store;

pub use error::{Classify, Error, ErrorKind, Result};
pub use id::{GroupId, ItemId};
