//! The position index: the only code that writes `items.position`.
//!
//! Every function here runs on a caller-supplied connection (in practice an
//! open transaction) and is atomic on its own. Multi-step sequences are
//! composed by [`crate::engine`] inside one transaction.
//!
//! SQLite checks unique indexes row by row during an `UPDATE`, so a naive
//! `position = position + 1` can trip the `(group_id, position)` index
//! halfway through. Shifts therefore mirror the affected rows into a band
//! below every position the group currently holds (`p -> base - (p + delta)`)
//! and flip them back in a second statement. The band sits under the
//! group's minimum, so stray negative rows left by corruption are neither
//! collided with nor flipped.

use chrono::{DateTime, Utc};
use ordo_core::{
  GroupId, ItemId,
  group::Group,
  item::{Item, Slot},
  plan::{PARKED, Renumber},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  Result,
  encode::{GROUP_COLUMNS, ITEM_COLUMNS, RawGroup, RawItem, encode_dt},
};

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn load_item(conn: &Connection, item_id: &ItemId) -> Result<Option<Item>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1"),
      params![item_id.as_str()],
      RawItem::from_row,
    )
    .optional()?;
  raw.map(RawItem::into_item).transpose()
}

/// Load an item that currently occupies a slot.
pub fn require_active_item(conn: &Connection, item_id: &ItemId) -> Result<Item> {
  load_item(conn, item_id)?
    .filter(|item| item.active)
    .ok_or_else(|| ordo_core::Error::ItemNotFound(item_id.clone()).into())
}

pub fn load_group(conn: &Connection, group_id: &GroupId) -> Result<Option<Group>> {
  let raw = conn
    .query_row(
      &format!("SELECT {GROUP_COLUMNS} FROM item_groups WHERE group_id = ?1"),
      params![group_id.as_str()],
      RawGroup::from_row,
    )
    .optional()?;
  raw.map(RawGroup::into_group).transpose()
}

pub fn require_group(conn: &Connection, group_id: &GroupId) -> Result<Group> {
  load_group(conn, group_id)?
    .ok_or_else(|| ordo_core::Error::GroupNotFound(group_id.clone()).into())
}

pub fn list_groups(conn: &Connection) -> Result<Vec<Group>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {GROUP_COLUMNS} FROM item_groups ORDER BY active DESC, sort_order, group_id"
  ))?;
  let raws = stmt
    .query_map([], RawGroup::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawGroup::into_group).collect()
}

/// Active items of `group_id`, ascending by position. Fails with
/// `GroupNotFound` for an unknown group.
pub fn get_positions(conn: &Connection, group_id: &GroupId) -> Result<Vec<Slot>> {
  Ok(load_group_items(conn, group_id)?.iter().map(Slot::from).collect())
}

/// Full rows of the active items in `group_id`, ordered the way a reader
/// sees them (position, then `updated_at`, then id).
pub fn load_group_items(conn: &Connection, group_id: &GroupId) -> Result<Vec<Item>> {
  require_group(conn, group_id)?;
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {ITEM_COLUMNS} FROM items
     WHERE group_id = ?1 AND active = 1
     ORDER BY position, updated_at, item_id"
  ))?;
  let raws = stmt
    .query_map(params![group_id.as_str()], RawItem::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawItem::into_item).collect()
}

/// Number of active items in `group_id`, not counting `excluding`.
pub fn count_active(
  conn:      &Connection,
  group_id:  &GroupId,
  excluding: Option<&ItemId>,
) -> Result<usize> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM items
     WHERE group_id = ?1 AND active = 1 AND (?2 IS NULL OR item_id <> ?2)",
    params![group_id.as_str(), excluding.map(ItemId::as_str)],
    |row| row.get(0),
  )?;
  Ok(usize::try_from(count).unwrap_or_default())
}

/// Slot just past the highest occupied one (`0` for an empty group).
pub fn next_position(conn: &Connection, group_id: &GroupId) -> Result<i64> {
  let max: Option<i64> = conn.query_row(
    "SELECT MAX(position) FROM items WHERE group_id = ?1 AND active = 1 AND position >= 0",
    params![group_id.as_str()],
    |row| row.get(0),
  )?;
  Ok(max.map_or(0, |m| m + 1))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Move an item out of the way so no shift counts it.
pub fn park(conn: &Connection, item_id: &ItemId) -> Result<()> {
  let n = conn.execute(
    "UPDATE items SET position = ?2 WHERE item_id = ?1 AND active = 1",
    params![item_id.as_str(), PARKED],
  )?;
  if n == 0 {
    return Err(ordo_core::Error::ItemNotFound(item_id.clone()).into());
  }
  Ok(())
}

/// Single-item write of `(group_id, position)`; touches `updated_at`.
pub fn set_position(
  conn:     &Connection,
  item_id:  &ItemId,
  group_id: &GroupId,
  position: i64,
  at:       DateTime<Utc>,
) -> Result<()> {
  if position < 0 {
    return Err(
      ordo_core::Error::InvalidArgument(format!("position must be non-negative, got {position}"))
        .into(),
    );
  }
  require_group(conn, group_id)?;
  let n = conn.execute(
    "UPDATE items SET group_id = ?2, position = ?3, updated_at = ?4
     WHERE item_id = ?1 AND active = 1",
    params![item_id.as_str(), group_id.as_str(), position, encode_dt(at)],
  )?;
  if n == 0 {
    return Err(ordo_core::Error::ItemNotFound(item_id.clone()).into());
  }
  Ok(())
}

/// Add `delta` to every active item in `group_id` at or after
/// `from_position`. Returns the number of rows shifted.
pub fn shift_positions(
  conn:          &Connection,
  group_id:      &GroupId,
  from_position: i64,
  delta:         i64,
  at:            DateTime<Utc>,
) -> Result<usize> {
  shift_range(conn, group_id, from_position, None, delta, at)
}

/// Bounded form of [`shift_positions`]: only rows with
/// `from <= position <= until` move.
pub fn shift_range(
  conn:     &Connection,
  group_id: &GroupId,
  from:     i64,
  until:    Option<i64>,
  delta:    i64,
  at:       DateTime<Utc>,
) -> Result<usize> {
  if from < 0 || from + delta < 0 {
    return Err(
      ordo_core::Error::InvalidArgument(format!(
        "shift by {delta} from {from} would produce a negative position"
      ))
      .into(),
    );
  }
  require_group(conn, group_id)?;

  let base = mirror_base(conn, group_id)?;
  let shifted = conn.execute(
    "UPDATE items SET position = ?5 - (position + ?4)
     WHERE group_id = ?1 AND active = 1
       AND position >= ?2 AND (?3 IS NULL OR position <= ?3)",
    params![group_id.as_str(), from, until, delta, base],
  )?;
  if shifted > 0 {
    flip_back(conn, group_id, base, at)?;
  }
  Ok(shifted)
}

/// Apply a compaction plan with the same two-phase trick as shifts.
pub fn renumber(
  conn:     &Connection,
  group_id: &GroupId,
  plan:     &[Renumber],
  at:       DateTime<Utc>,
) -> Result<()> {
  if plan.is_empty() {
    return Ok(());
  }
  let base = mirror_base(conn, group_id)?;
  let mut stmt = conn.prepare_cached(
    "UPDATE items SET position = ?3 WHERE item_id = ?1 AND group_id = ?2 AND active = 1",
  )?;
  for step in plan {
    stmt.execute(params![step.item_id.as_str(), group_id.as_str(), base - step.to])?;
  }
  flip_back(conn, group_id, base, at)
}

/// Top of the mirror band: one below the lowest position in the group
/// (ignoring a parked mover), and never above `-1`.
fn mirror_base(conn: &Connection, group_id: &GroupId) -> Result<i64> {
  let lowest: Option<i64> = conn.query_row(
    "SELECT MIN(position) FROM items WHERE group_id = ?1 AND active = 1 AND position <> ?2",
    params![group_id.as_str(), PARKED],
    |row| row.get(0),
  )?;
  Ok(lowest.map_or(0, |p| p.min(0)) - 1)
}

/// Second phase: restore rows mirrored below `base` to their target slot.
fn flip_back(
  conn:     &Connection,
  group_id: &GroupId,
  base:     i64,
  at:       DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    "UPDATE items SET position = ?3 - position, updated_at = ?4
     WHERE group_id = ?1 AND active = 1 AND position <= ?3 AND position <> ?2",
    params![group_id.as_str(), PARKED, base, encode_dt(at)],
  )?;
  Ok(())
}
