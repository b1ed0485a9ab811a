//! JSON REST API for Ordo.
//!
//! Exposes an axum [`Router`] backed by any [`ordo_core::store::PositionStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ordo_api::api_router(store.clone(), RetryPolicy::default()))
//! ```

pub mod error;
pub mod groups;
pub mod items;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ordo_core::{retry::RetryPolicy, store::PositionStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store: Arc<S>,
  /// Applied to calls that can fail with a busy store.
  pub retry: Arc<RetryPolicy>,
}

// Manual impl: cloning the state must not require `S: Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), retry: Arc::clone(&self.retry) }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, retry: RetryPolicy) -> Router<()>
where
  S: PositionStore + 'static,
{
  let state = ApiState { store, retry: Arc::new(retry) };
  Router::new()
    // Groups
    .route("/groups", get(groups::list::<S>))
    .route("/groups/{id}", get(groups::get_one::<S>).put(groups::ensure::<S>))
    .route("/groups/{id}/items", get(groups::items::<S>))
    .route("/groups/{id}/reindex", post(groups::reindex::<S>))
    // Items
    .route("/items", post(items::create::<S>))
    .route("/items/{id}", get(items::get_one::<S>).delete(items::remove::<S>))
    .route("/items/{id}/move", post(items::move_one::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
