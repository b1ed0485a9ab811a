//! Items, their slots, and the request types that mutate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, GroupId, ItemId, Result};

/// A positioned item as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:    ItemId,
  pub group_id:   GroupId,
  /// Zero-based rank within `group_id`; unique among active items.
  pub position:   i64,
  /// Set by the store on every group or position change.
  pub updated_at: DateTime<Utc>,
  /// Archived items keep their row but no longer occupy a slot.
  pub active:     bool,
}

/// One entry of a group listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
  pub item_id:  ItemId,
  pub position: i64,
}

impl From<&Item> for Slot {
  fn from(item: &Item) -> Self {
    Slot { item_id: item.item_id.clone(), position: item.position }
  }
}

/// Input to [`PositionStore::add_item`](crate::store::PositionStore::add_item).
#[derive(Debug, Clone)]
pub struct NewItem {
  pub item_id:  ItemId,
  pub group_id: GroupId,
  /// Requested slot; clamped to the group size. `None` appends.
  pub position: Option<i64>,
}

impl NewItem {
  pub fn new(item_id: ItemId, group_id: GroupId) -> Self {
    Self { item_id, group_id, position: None }
  }

  pub fn at(mut self, position: i64) -> Self {
    self.position = Some(position);
    self
  }

  pub fn validate(&self) -> Result<()> {
    match self.position {
      Some(p) if p < 0 => Err(Error::InvalidArgument(format!(
        "position must be non-negative, got {p}"
      ))),
      _ => Ok(()),
    }
  }
}

/// Relocate `item_id` to `to_position` within `to_group_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
  pub item_id:       ItemId,
  /// The group the caller believes the item is in. Looked up when absent;
  /// a mismatch with the stored group is rejected.
  #[serde(default)]
  pub from_group_id: Option<GroupId>,
  pub to_group_id:   GroupId,
  pub to_position:   i64,
}

impl MoveRequest {
  pub fn new(item_id: ItemId, to_group_id: GroupId, to_position: i64) -> Self {
    Self { item_id, from_group_id: None, to_group_id, to_position }
  }

  pub fn from_group(mut self, group_id: GroupId) -> Self {
    self.from_group_id = Some(group_id);
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.to_position < 0 {
      return Err(Error::InvalidArgument(format!(
        "position must be non-negative, got {}",
        self.to_position
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn id(s: &str) -> ItemId { ItemId::new(s).unwrap() }
  fn group(s: &str) -> GroupId { GroupId::new(s).unwrap() }

  #[test]
  fn negative_positions_are_rejected() {
    let req = MoveRequest::new(id("a"), group("todo"), -1);
    assert!(matches!(req.validate(), Err(Error::InvalidArgument(_))));

    let new = NewItem::new(id("a"), group("todo")).at(-3);
    assert!(new.validate().is_err());
    assert!(NewItem::new(id("a"), group("todo")).validate().is_ok());
  }

  #[test]
  fn move_request_from_group_is_optional_in_json() {
    let req: MoveRequest = serde_json::from_str(
      r#"{"item_id":"a","to_group_id":"doing","to_position":2}"#,
    )
    .unwrap();
    assert_eq!(req.from_group_id, None);
    assert_eq!(req.to_position, 2);
  }
}
