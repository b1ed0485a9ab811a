//! Transactional operations: the reorder engine, default-group
//! materialisation, and the reindex routine.
//!
//! Each public function owns one `BEGIN IMMEDIATE` transaction. Returning
//! early with an error drops the transaction, which rolls it back.

use ordo_core::{
  Classify as _, ErrorKind, GroupId, ItemId,
  group::{Group, GroupDefaults, GroupSpec},
  item::{Item, MoveRequest, NewItem, Slot},
  plan::{self, MovePlan},
};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use tracing::debug;

use crate::{Error, Result, encode, positions};

fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
  Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

// ─── Groups ──────────────────────────────────────────────────────────────────

pub fn ensure_group(
  conn:     &mut Connection,
  group_id: &GroupId,
  defaults: &GroupDefaults,
) -> Result<Group> {
  defaults.validate()?;
  let tx = begin(conn)?;
  let group = ensure_group_in(&tx, group_id, defaults)?;
  tx.commit()?;
  Ok(group)
}

/// Existence check followed by an insert. A unique-key failure on the insert
/// means another writer created the group first, which counts as success.
fn ensure_group_in(
  conn:     &Connection,
  group_id: &GroupId,
  defaults: &GroupDefaults,
) -> Result<Group> {
  if let Some(existing) = positions::load_group(conn, group_id)? {
    if existing.active {
      return Ok(existing);
    }
    let sort_order = free_sort_order(conn, Some(existing.sort_order))?;
    conn.execute(
      "UPDATE item_groups SET active = 1, sort_order = ?2 WHERE group_id = ?1",
      params![group_id.as_str(), sort_order],
    )?;
    debug!(group = %group_id, sort_order, "reactivated group");
    return Ok(Group { sort_order, active: true, ..existing });
  }

  let group = Group {
    group_id:   group_id.clone(),
    label:      defaults.label.clone().unwrap_or_else(|| group_id.to_string()),
    sort_order: free_sort_order(conn, defaults.sort_order)?,
    active:     true,
  };

  let inserted = conn.execute(
    "INSERT INTO item_groups (group_id, label, sort_order, active) VALUES (?1, ?2, ?3, 1)",
    params![group.group_id.as_str(), group.label, group.sort_order],
  );
  match inserted {
    Ok(_) => {
      debug!(group = %group_id, sort_order = group.sort_order, "created group");
      Ok(group)
    }
    Err(e) => {
      let err = Error::from(e);
      if err.kind() == ErrorKind::ConstraintViolation
        && let Some(existing) = positions::load_group(conn, group_id)?
      {
        debug!(group = %group_id, "group created concurrently");
        return Ok(existing);
      }
      Err(err)
    }
  }
}

/// `hint` if no active group holds it, otherwise one past the current max.
fn free_sort_order(conn: &Connection, hint: Option<i64>) -> Result<i64> {
  if let Some(hint) = hint.filter(|h| *h >= 0) {
    let taken: bool = conn.query_row(
      "SELECT EXISTS(SELECT 1 FROM item_groups WHERE active = 1 AND sort_order = ?1)",
      params![hint],
      |row| row.get(0),
    )?;
    if !taken {
      return Ok(hint);
    }
  }
  let max: Option<i64> = conn.query_row(
    "SELECT MAX(sort_order) FROM item_groups WHERE active = 1",
    [],
    |row| row.get(0),
  )?;
  Ok(max.map_or(0, |m| m + 1))
}

/// Resolve a group that items are about to be placed in. Missing or archived
/// canonical groups are materialised; anything else must already be active.
fn resolve_destination(
  conn:      &Connection,
  group_id:  &GroupId,
  canonical: &[GroupSpec],
) -> Result<Group> {
  match positions::load_group(conn, group_id)? {
    Some(group) if group.active => Ok(group),
    _ => match canonical.iter().find(|spec| spec.group_id == *group_id) {
      Some(spec) => ensure_group_in(conn, group_id, &spec.defaults()),
      None => Err(ordo_core::Error::GroupNotFound(group_id.clone()).into()),
    },
  }
}

// ─── Items ───────────────────────────────────────────────────────────────────

pub fn add_item(conn: &mut Connection, input: &NewItem, canonical: &[GroupSpec]) -> Result<Item> {
  input.validate()?;
  let tx = begin(conn)?;

  if positions::load_item(&tx, &input.item_id)?.is_some() {
    return Err(ordo_core::Error::ItemExists(input.item_id.clone()).into());
  }
  resolve_destination(&tx, &input.group_id, canonical)?;

  let now = encode::now();
  let position = match input.position {
    Some(requested) => {
      let size = positions::count_active(&tx, &input.group_id, None)?;
      let target = plan::clamp_position(requested, size);
      positions::shift_positions(&tx, &input.group_id, target, 1, now)?;
      target
    }
    None => positions::next_position(&tx, &input.group_id)?,
  };

  tx.execute(
    "INSERT INTO items (item_id, group_id, position, updated_at, active)
     VALUES (?1, ?2, ?3, ?4, 1)",
    params![
      input.item_id.as_str(),
      input.group_id.as_str(),
      position,
      encode::encode_dt(now)
    ],
  )?;
  tx.commit()?;

  Ok(Item {
    item_id: input.item_id.clone(),
    group_id: input.group_id.clone(),
    position,
    updated_at: now,
    active: true,
  })
}

pub fn remove_item(conn: &mut Connection, item_id: &ItemId) -> Result<Item> {
  let tx = begin(conn)?;
  let item = positions::require_active_item(&tx, item_id)?;
  let now = encode::now();

  tx.execute(
    "UPDATE items SET active = 0, updated_at = ?2 WHERE item_id = ?1",
    params![item_id.as_str(), encode::encode_dt(now)],
  )?;
  let closed = positions::shift_positions(&tx, &item.group_id, item.position + 1, -1, now)?;
  tx.commit()?;

  debug!(item = %item_id, group = %item.group_id, closed, "archived item");
  Ok(Item { updated_at: now, active: false, ..item })
}

// ─── Ordering ────────────────────────────────────────────────────────────────

pub fn list(conn: &mut Connection, group_id: &GroupId) -> Result<Vec<Slot>> {
  // A deferred transaction gives the read a single snapshot.
  let tx = conn.transaction()?;
  let slots = positions::get_positions(&tx, group_id)?;
  tx.commit()?;
  Ok(slots)
}

pub fn move_item(
  conn:      &mut Connection,
  request:   &MoveRequest,
  canonical: &[GroupSpec],
) -> Result<Item> {
  request.validate()?;
  let tx = begin(conn)?;

  let current = positions::require_active_item(&tx, &request.item_id)?;
  if let Some(from) = &request.from_group_id
    && *from != current.group_id
  {
    return Err(
      ordo_core::Error::InvalidArgument(format!(
        "item {} is in group {}, not {from}",
        current.item_id, current.group_id
      ))
      .into(),
    );
  }
  resolve_destination(&tx, &request.to_group_id, canonical)?;

  let dest_size = positions::count_active(&tx, &request.to_group_id, Some(&request.item_id))?;
  let (target, shifts) = match plan::plan_move(
    &current.group_id,
    current.position,
    &request.to_group_id,
    request.to_position,
    dest_size,
  ) {
    MovePlan::Unchanged => {
      debug!(item = %request.item_id, "move is a no-op");
      return Ok(current);
    }
    MovePlan::Relocate { target, shifts } => (target, shifts),
  };

  let now = encode::now();
  positions::park(&tx, &request.item_id)?;
  for shift in &shifts {
    positions::shift_range(&tx, &shift.group_id, shift.from, shift.until, shift.delta, now)?;
  }
  positions::set_position(&tx, &request.item_id, &request.to_group_id, target, now)?;
  tx.commit()?;

  debug!(
    item = %request.item_id,
    from_group = %current.group_id,
    from = current.position,
    to_group = %request.to_group_id,
    to = target,
    "moved item"
  );
  Ok(Item {
    item_id:    current.item_id,
    group_id:   request.to_group_id.clone(),
    position:   target,
    updated_at: now,
    active:     true,
  })
}

pub fn reindex(conn: &mut Connection, group_id: &GroupId) -> Result<usize> {
  let tx = begin(conn)?;
  let items = positions::load_group_items(&tx, group_id)?;
  let steps = plan::plan_compaction(&items);
  if steps.is_empty() {
    return Ok(0);
  }
  positions::renumber(&tx, group_id, &steps, encode::now())?;
  tx.commit()?;

  debug!(group = %group_id, renumbered = steps.len(), "reindexed group");
  Ok(steps.len())
}
