//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use ordo_core::retry::RetryPolicy;
use ordo_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store), RetryPolicy::none())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      req = req.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

async fn create(app: &Router, item: &str, group: &str) {
  let (status, _) = send(
    app,
    Method::POST,
    "/items",
    Some(json!({ "item_id": item, "group_id": group })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

fn ids(listing: &Value) -> Vec<String> {
  listing
    .as_array()
    .unwrap()
    .iter()
    .map(|slot| slot["item_id"].as_str().unwrap().to_owned())
    .collect()
}

#[tokio::test]
async fn create_then_list_group() {
  let app = app().await;
  create(&app, "A", "todo").await;
  create(&app, "B", "todo").await;

  let (status, body) = send(&app, Method::GET, "/groups/todo/items", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ids(&body), ["A", "B"]);
  assert_eq!(body[1]["position"], 1);
}

#[tokio::test]
async fn create_without_id_generates_one() {
  let app = app().await;
  let (status, body) =
    send(&app, Method::POST, "/items", Some(json!({ "group_id": "todo" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(!body["item_id"].as_str().unwrap().is_empty());
  assert_eq!(body["position"], 0);
}

#[tokio::test]
async fn move_endpoint_reorders() {
  let app = app().await;
  for id in ["A", "B", "C"] {
    create(&app, id, "todo").await;
  }

  let (status, body) = send(
    &app,
    Method::POST,
    "/items/C/move",
    Some(json!({ "to_group_id": "todo", "to_position": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["position"], 0);

  let (_, listing) = send(&app, Method::GET, "/groups/todo/items", None).await;
  assert_eq!(ids(&listing), ["C", "A", "B"]);
}

#[tokio::test]
async fn move_errors_map_to_status_codes() {
  let app = app().await;
  create(&app, "A", "todo").await;

  let (status, body) = send(
    &app,
    Method::POST,
    "/items/A/move",
    Some(json!({ "to_group_id": "todo", "to_position": -1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("non-negative"));

  let (status, _) = send(
    &app,
    Method::POST,
    "/items/missing/move",
    Some(json!({ "to_group_id": "todo", "to_position": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(
    &app,
    Method::POST,
    "/items/A/move",
    Some(json!({ "to_group_id": "backlog", "to_position": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_item_is_conflict() {
  let app = app().await;
  create(&app, "A", "todo").await;
  let (status, _) = send(
    &app,
    Method::POST,
    "/items",
    Some(json!({ "item_id": "A", "group_id": "todo" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn ensure_group_is_idempotent() {
  let app = app().await;
  let body = json!({ "label": "Done", "sort_order": 3 });

  let (first, a) = send(&app, Method::PUT, "/groups/col-done", Some(body.clone())).await;
  let (second, b) = send(&app, Method::PUT, "/groups/col-done", Some(body)).await;
  assert_eq!((first, second), (StatusCode::OK, StatusCode::OK));
  assert_eq!(a, b);

  let (_, groups) = send(&app, Method::GET, "/groups", None).await;
  assert_eq!(groups.as_array().unwrap().len(), 1);

  let (status, group) = send(&app, Method::GET, "/groups/col-done", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(group["label"], "Done");
}

#[tokio::test]
async fn delete_and_reindex() {
  let app = app().await;
  for id in ["A", "B", "C"] {
    create(&app, id, "todo").await;
  }

  let (status, removed) = send(&app, Method::DELETE, "/items/A", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(removed["active"], false);

  let (status, body) = send(&app, Method::POST, "/groups/todo/reindex", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["group_id"], "todo");
  assert_eq!(body["renumbered"], 0);

  let (_, listing) = send(&app, Method::GET, "/groups/todo/items", None).await;
  assert_eq!(ids(&listing), ["B", "C"]);
}

#[tokio::test]
async fn unknown_resources_are_404() {
  let app = app().await;
  assert_eq!(send(&app, Method::GET, "/items/nope", None).await.0, StatusCode::NOT_FOUND);
  assert_eq!(send(&app, Method::GET, "/groups/nope", None).await.0, StatusCode::NOT_FOUND);
  assert_eq!(
    send(&app, Method::GET, "/groups/nope/items", None).await.0,
    StatusCode::NOT_FOUND
  );
}
