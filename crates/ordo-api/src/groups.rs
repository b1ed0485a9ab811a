//! Handlers for `/groups` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/groups` | Ordered by `sort_order` |
//! | `GET`  | `/groups/:id` | 404 if not found |
//! | `PUT`  | `/groups/:id` | Idempotent create; body: [`EnsureBody`] |
//! | `GET`  | `/groups/:id/items` | Active items ascending by position |
//! | `POST` | `/groups/:id/reindex` | Compacts positions to `0..n` |

use axum::{
  Json,
  extract::{Path, State},
};
use ordo_core::{
  GroupId,
  group::{Group, GroupDefaults},
  item::Slot,
  store::PositionStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /groups`
pub async fn list<S: PositionStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Group>>, ApiError> {
  let groups = state.store.list_groups().await.map_err(ApiError::from_store)?;
  Ok(Json(groups))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /groups/:id`
pub async fn get_one<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<GroupId>,
) -> Result<Json<Group>, ApiError> {
  let group = state
    .store
    .get_group(id.clone())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("group {id} not found")))?;
  Ok(Json(group))
}

// ─── Ensure ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /groups/:id`. Both fields only apply when the
/// group has to be created.
#[derive(Debug, Default, Deserialize)]
pub struct EnsureBody {
  pub label:      Option<String>,
  pub sort_order: Option<i64>,
}

/// `PUT /groups/:id`
pub async fn ensure<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<GroupId>,
  Json(body): Json<EnsureBody>,
) -> Result<Json<Group>, ApiError> {
  let defaults = GroupDefaults { label: body.label, sort_order: body.sort_order };
  let store = state.store.as_ref();
  let group = state
    .retry
    .run("ensure_group", move || store.ensure_group(id.clone(), defaults.clone()))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(group))
}

// ─── Items of a group ─────────────────────────────────────────────────────────

/// `GET /groups/:id/items`
pub async fn items<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<GroupId>,
) -> Result<Json<Vec<Slot>>, ApiError> {
  let slots = state.store.list(id).await.map_err(ApiError::from_store)?;
  Ok(Json(slots))
}

// ─── Reindex ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ReindexResponse {
  pub group_id:   GroupId,
  pub renumbered: usize,
}

/// `POST /groups/:id/reindex`
pub async fn reindex<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<GroupId>,
) -> Result<Json<ReindexResponse>, ApiError> {
  let store = state.store.as_ref();
  let target = id.clone();
  let renumbered = state
    .retry
    .run("reindex", move || store.reindex(target.clone()))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(ReindexResponse { group_id: id, renumbered }))
}
