//! Opaque identifiers for items and groups.
//!
//! Both are non-empty strings. Validation happens on construction and on
//! deserialisation, so a handler that extracts an id never sees an empty one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident, $what:literal) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    #[serde(try_from = "String", into = "String")]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
          return Err(Error::InvalidArgument(concat!($what, " must not be empty").into()));
        }
        Ok(Self(id))
      }

      pub fn as_str(&self) -> &str { &self.0 }
    }

    impl TryFrom<String> for $name {
      type Error = Error;

      fn try_from(id: String) -> Result<Self> { Self::new(id) }
    }

    impl TryFrom<&str> for $name {
      type Error = Error;

      fn try_from(id: &str) -> Result<Self> { Self::new(id) }
    }

    impl From<$name> for String {
      fn from(id: $name) -> Self { id.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
    }
  };
}

string_id!(
  /// Identity of a positioned item (e.g. a kanban card).
  ItemId,
  "item id"
);

string_id!(
  /// Identity of an ordered bucket (e.g. a kanban column).
  GroupId,
  "group id"
);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_blank_ids() {
    assert!(ItemId::new("").is_err());
    assert!(GroupId::new("   ").is_err());
    assert_eq!(GroupId::new("todo").unwrap().as_str(), "todo");
  }

  #[test]
  fn deserialisation_validates() {
    let ok: ItemId = serde_json::from_str("\"card-1\"").unwrap();
    assert_eq!(ok.to_string(), "card-1");
    assert!(serde_json::from_str::<ItemId>("\"\"").is_err());
  }
}
