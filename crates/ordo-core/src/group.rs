//! Groups: named ordered buckets that items live in.

use serde::{Deserialize, Serialize};

use crate::{Error, GroupId, Result};

/// A stored group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
  pub group_id:   GroupId,
  pub label:      String,
  /// Rank of the group among active groups; unique.
  pub sort_order: i64,
  pub active:     bool,
}

/// Values used when [`ensure_group`](crate::store::PositionStore::ensure_group)
/// has to create the group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupDefaults {
  /// Defaults to the group id.
  pub label:      Option<String>,
  /// A hint; if absent or already taken the group is appended.
  pub sort_order: Option<i64>,
}

impl GroupDefaults {
  pub fn validate(&self) -> Result<()> {
    match self.sort_order {
      Some(s) if s < 0 => Err(Error::InvalidArgument(format!(
        "sort order must be non-negative, got {s}"
      ))),
      _ => Ok(()),
    }
  }
}

/// A canonical group that is materialised on first reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
  pub group_id:   GroupId,
  pub label:      String,
  pub sort_order: i64,
}

impl GroupSpec {
  pub fn defaults(&self) -> GroupDefaults {
    GroupDefaults {
      label:      Some(self.label.clone()),
      sort_order: Some(self.sort_order),
    }
  }
}

/// The four standard pipeline stages.
pub fn default_groups() -> Vec<GroupSpec> {
  [("todo", "To Do"), ("doing", "In Progress"), ("review", "Review"), ("done", "Done")]
    .into_iter()
    .zip(0..)
    .filter_map(|((id, label), sort_order)| {
      Some(GroupSpec {
        group_id: GroupId::new(id).ok()?,
        label: label.to_owned(),
        sort_order,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_groups_are_ordered_pipeline_stages() {
    let groups = default_groups();
    let ids: Vec<_> = groups.iter().map(|g| g.group_id.as_str()).collect();
    assert_eq!(ids, ["todo", "doing", "review", "done"]);
    assert!(groups.iter().zip(0..).all(|(g, i)| g.sort_order == i));
  }

  #[test]
  fn negative_sort_order_hint_is_rejected() {
    let defaults = GroupDefaults { label: None, sort_order: Some(-1) };
    assert!(defaults.validate().is_err());
  }
}
