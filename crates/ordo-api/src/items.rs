//! Handlers for `/items` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/items` | Body: [`CreateBody`]; returns 201 + stored item |
//! | `GET`    | `/items/:id` | 404 if not found |
//! | `DELETE` | `/items/:id` | Archives the item and closes its gap |
//! | `POST`   | `/items/:id/move` | Body: [`MoveBody`] |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ordo_core::{
  GroupId, ItemId,
  item::{Item, MoveRequest, NewItem},
  store::PositionStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /items`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Generated when absent.
  pub item_id:  Option<ItemId>,
  pub group_id: GroupId,
  /// Appends when absent.
  pub position: Option<i64>,
}

/// `POST /items`: returns 201 + the stored [`Item`].
pub async fn create<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let item_id = match body.item_id {
    Some(id) => id,
    None => ItemId::new(Uuid::new_v4().to_string()).map_err(ApiError::from_store)?,
  };
  let input = NewItem { item_id, group_id: body.group_id, position: body.position };

  let store = state.store.as_ref();
  let item = state
    .retry
    .run("add_item", move || store.add_item(input.clone()))
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(item)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /items/:id`
pub async fn get_one<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<ItemId>,
) -> Result<Json<Item>, ApiError> {
  let item = state
    .store
    .get_item(id.clone())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))?;
  Ok(Json(item))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /items/:id`
pub async fn remove<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<ItemId>,
) -> Result<Json<Item>, ApiError> {
  let store = state.store.as_ref();
  let item = state
    .retry
    .run("remove_item", move || store.remove_item(id.clone()))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(item))
}

// ─── Move ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /items/:id/move`.
#[derive(Debug, Deserialize)]
pub struct MoveBody {
  pub to_group_id:   GroupId,
  pub to_position:   i64,
  /// The group the client last saw the item in; rejected if stale.
  #[serde(default)]
  pub from_group_id: Option<GroupId>,
}

/// `POST /items/:id/move`: returns the moved [`Item`].
pub async fn move_one<S: PositionStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<ItemId>,
  Json(body): Json<MoveBody>,
) -> Result<Json<Item>, ApiError> {
  let request = MoveRequest {
    item_id:       id,
    from_group_id: body.from_group_id,
    to_group_id:   body.to_group_id,
    to_position:   body.to_position,
  };

  let store = state.store.as_ref();
  let item = state
    .retry
    .run("move_item", move || store.move_item(request.clone()))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(item))
}
