//! Error types for `ordo-core`, plus the classification every backend error
//! maps onto.

use thiserror::Error;

use crate::id::{GroupId, ItemId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("item not found: {0}")]
  ItemNotFound(ItemId),

  #[error("group not found: {0}")]
  GroupNotFound(GroupId),

  #[error("item already exists: {0}")]
  ItemExists(ItemId),

  /// A write would have produced a duplicate `(group, position)` pair.
  #[error("position constraint violated: {0}")]
  ConstraintViolation(String),

  #[error("store is busy, retry later")]
  Busy,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure category shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  InvalidArgument,
  Conflict,
  ConstraintViolation,
  Busy,
  Internal,
}

impl ErrorKind {
  pub fn is_retryable(self) -> bool { matches!(self, Self::Busy) }
}

/// Implemented by backend error types so callers (the HTTP layer, the retry
/// policy) can react without knowing the concrete backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Error::ItemNotFound(_) | Error::GroupNotFound(_) => ErrorKind::NotFound,
      Error::ItemExists(_) => ErrorKind::Conflict,
      Error::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
      Error::Busy => ErrorKind::Busy,
    }
  }
}
