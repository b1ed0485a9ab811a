//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! so that lexicographic order in SQL matches chronological order. Booleans
//! are stored as `0`/`1`.

use chrono::{DateTime, SecondsFormat, Utc};
use ordo_core::{GroupId, ItemId, group::Group, item::Item};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Current time truncated to what [`encode_dt`] stores, so values returned
/// to callers compare equal to what a later read produces.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const ITEM_COLUMNS: &str = "item_id, group_id, position, updated_at, active";

pub const GROUP_COLUMNS: &str = "group_id, label, sort_order, active";

/// An `items` row before validation.
pub struct RawItem {
  pub item_id:    String,
  pub group_id:   String,
  pub position:   i64,
  pub updated_at: String,
  pub active:     bool,
}

impl RawItem {
  /// Row mapper for queries selecting [`ITEM_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawItem {
      item_id:    row.get(0)?,
      group_id:   row.get(1)?,
      position:   row.get(2)?,
      updated_at: row.get(3)?,
      active:     row.get(4)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:    ItemId::new(self.item_id)?,
      group_id:   GroupId::new(self.group_id)?,
      position:   self.position,
      updated_at: decode_dt(&self.updated_at)?,
      active:     self.active,
    })
  }
}

/// An `item_groups` row before validation.
pub struct RawGroup {
  pub group_id:   String,
  pub label:      String,
  pub sort_order: i64,
  pub active:     bool,
}

impl RawGroup {
  /// Row mapper for queries selecting [`GROUP_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawGroup {
      group_id:   row.get(0)?,
      label:      row.get(1)?,
      sort_order: row.get(2)?,
      active:     row.get(3)?,
    })
  }

  pub fn into_group(self) -> Result<Group> {
    Ok(Group {
      group_id:   GroupId::new(self.group_id)?,
      label:      self.label,
      sort_order: self.sort_order,
      active:     self.active,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let early = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let late = early + chrono::Duration::microseconds(1500);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn now_survives_a_round_trip() {
    let t = now();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }
}
