//! Pure arithmetic behind moves and compaction.
//!
//! A move is planned as "logically remove, then insert": the mover is parked
//! at [`PARKED`] so it is never counted by a shift, the affected siblings are
//! shifted by one, and the mover is written at the clamped target slot. The
//! storage backend executes the returned [`Shift`]s in order inside a single
//! transaction.

use crate::{GroupId, ItemId, item::Item};

/// Position the mover holds while its siblings shift. Outside the range any
/// shift can produce.
pub const PARKED: i64 = i64::MIN;

// ─── Moves ───────────────────────────────────────────────────────────────────

/// Add `delta` to every active item in `group_id` whose position lies in
/// `from..=until` (open-ended when `until` is `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
  pub group_id: GroupId,
  pub from:     i64,
  pub until:    Option<i64>,
  pub delta:    i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
  /// The item already sits at the requested slot.
  Unchanged,
  Relocate {
    target: i64,
    shifts: Vec<Shift>,
  },
}

/// Clamp a requested slot to `[0, size]`.
pub fn clamp_position(requested: i64, size: usize) -> i64 {
  requested.clamp(0, i64::try_from(size).unwrap_or(i64::MAX))
}

/// Plan moving an item currently at `(source, old_position)` to
/// `(dest, requested)`. `dest_size` counts the destination's active items
/// excluding the mover.
pub fn plan_move(
  source:       &GroupId,
  old_position: i64,
  dest:         &GroupId,
  requested:    i64,
  dest_size:    usize,
) -> MovePlan {
  let target = clamp_position(requested, dest_size);

  if source != dest {
    return MovePlan::Relocate {
      target,
      shifts: vec![
        Shift { group_id: dest.clone(), from: target, until: None, delta: 1 },
        Shift {
          group_id: source.clone(),
          from:     old_position + 1,
          until:    None,
          delta:    -1,
        },
      ],
    };
  }

  if requested == old_position || target == old_position {
    return MovePlan::Unchanged;
  }

  let shift = if old_position < target {
    Shift { group_id: dest.clone(), from: old_position + 1, until: Some(target), delta: -1 }
  } else {
    Shift { group_id: dest.clone(), from: target, until: Some(old_position - 1), delta: 1 }
  };
  MovePlan::Relocate { target, shifts: vec![shift] }
}

// ─── Compaction ──────────────────────────────────────────────────────────────

/// A position rewrite produced by [`plan_compaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renumber {
  pub item_id: ItemId,
  pub from:    i64,
  pub to:      i64,
}

/// Lay `items` out as `0, 1, 2, …` ordered by position, then `updated_at`,
/// then `item_id`. Only items whose position changes are returned.
pub fn plan_compaction(items: &[Item]) -> Vec<Renumber> {
  let mut ordered: Vec<&Item> = items.iter().collect();
  ordered.sort_by(|a, b| {
    a.position
      .cmp(&b.position)
      .then_with(|| a.updated_at.cmp(&b.updated_at))
      .then_with(|| a.item_id.cmp(&b.item_id))
  });

  ordered
    .into_iter()
    .zip(0_i64..)
    .filter(|(item, to)| item.position != *to)
    .map(|(item, to)| Renumber { item_id: item.item_id.clone(), from: item.position, to })
    .collect()
}
