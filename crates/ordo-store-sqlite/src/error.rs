//! Error type for `ordo-store-sqlite`.

use ordo_core::{Classify, ErrorKind};
use rusqlite::{
  ErrorCode,
  ffi::{SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] ordo_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Busy/locked failures and duplicate-key failures are lifted into the core
/// taxonomy; everything else (foreign keys, `NOT NULL`, trigger aborts) stays
/// a raw SQLite error.
impl From<rusqlite::Error> for Error {
  fn from(e: rusqlite::Error) -> Self {
    if let rusqlite::Error::SqliteFailure(failure, message) = &e {
      match failure.code {
        ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
          return Error::Core(ordo_core::Error::Busy);
        }
        ErrorCode::ConstraintViolation
          if matches!(
            failure.extended_code,
            SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY
          ) =>
        {
          let detail = message.clone().unwrap_or_else(|| failure.to_string());
          return Error::Core(ordo_core::Error::ConstraintViolation(detail));
        }
        _ => {}
      }
    }
    Error::Sqlite(e)
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _)))
        if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
      {
        ErrorKind::Busy
      }
      _ => ErrorKind::Internal,
    }
  }
}
