//! The `PositionStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `ordo-store-sqlite`).
//! The HTTP layer and the server depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  Classify, GroupId, ItemId,
  group::{Group, GroupDefaults},
  item::{Item, MoveRequest, NewItem, Slot},
};

/// Abstraction over a positioning backend.
///
/// Every mutating method is atomic: it either applies completely or leaves
/// the store unchanged. After any call, the positions of active items within
/// one group are pairwise distinct.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PositionStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Return the group, creating it from `defaults` if it does not exist and
  /// re-activating it if it was archived. Safe to call concurrently.
  fn ensure_group(
    &self,
    group_id: GroupId,
    defaults: GroupDefaults,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn get_group(
    &self,
    group_id: GroupId,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  /// All groups, ascending by `sort_order`.
  fn list_groups(&self) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Insert an item, shifting siblings at or after its slot down by one.
  fn add_item(
    &self,
    input: NewItem,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    item_id: ItemId,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// Archive an item and close the gap it leaves behind.
  fn remove_item(
    &self,
    item_id: ItemId,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  // ── Ordering ──────────────────────────────────────────────────────────

  /// Active items of `group_id`, ascending by position.
  fn list(
    &self,
    group_id: GroupId,
  ) -> impl Future<Output = Result<Vec<Slot>, Self::Error>> + Send + '_;

  /// Relocate an item, shifting siblings in the source and destination
  /// groups. Returns the item as stored afterwards.
  fn move_item(
    &self,
    request: MoveRequest,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Rewrite the group's positions as `0..n`. Returns how many items moved.
  fn reindex(
    &self,
    group_id: GroupId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
