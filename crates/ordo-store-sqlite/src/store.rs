//! [`SqliteStore`], the SQLite implementation of [`PositionStore`].

use std::{path::Path, sync::Arc, time::Duration};

use ordo_core::{
  Classify as _, ErrorKind, GroupId, ItemId,
  group::{Group, GroupDefaults, GroupSpec, default_groups},
  item::{Item, MoveRequest, NewItem, Slot},
  store::PositionStore,
};
use tracing::{debug, error};

use crate::{Result, engine, positions, schema::SCHEMA};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Connection-level settings fixed at open time.
#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// How long a writer waits for the database lock before failing with
  /// `Busy`.
  pub busy_timeout:   Duration,
  /// Groups that are created on first reference by a move or insert.
  pub default_groups: Vec<GroupSpec>,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      busy_timeout:   Duration::from_secs(5),
      default_groups: default_groups(),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A positioning store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  canonical: Arc<[GroupSpec]>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with default options.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  pub async fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, options).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with(StoreOptions::default()).await
  }

  pub async fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, options).await
  }

  async fn init(conn: tokio_rusqlite::Connection, options: StoreOptions) -> Result<Self> {
    let busy_timeout = options.busy_timeout;
    conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, canonical: options.default_groups.into() })
  }

  /// Close the underlying connection. Other clones of this store fail with a
  /// closed-connection error afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Run a synchronous engine function on the connection thread.
  async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    let result = self.conn.call(move |conn| Ok(f(conn))).await?;
    if let Err(e) = &result
      && e.kind() == ErrorKind::ConstraintViolation
    {
      error!(op, error = %e, "position invariant violated; transaction rolled back");
    }
    result
  }
}

// ─── PositionStore impl ──────────────────────────────────────────────────────

impl PositionStore for SqliteStore {
  type Error = crate::Error;

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn ensure_group(&self, group_id: GroupId, defaults: GroupDefaults) -> Result<Group> {
    debug!(group = %group_id, "ensure_group");
    self
      .run("ensure_group", move |conn| engine::ensure_group(conn, &group_id, &defaults))
      .await
  }

  async fn get_group(&self, group_id: GroupId) -> Result<Option<Group>> {
    self
      .run("get_group", move |conn| positions::load_group(conn, &group_id))
      .await
  }

  async fn list_groups(&self) -> Result<Vec<Group>> {
    self.run("list_groups", |conn| positions::list_groups(conn)).await
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn add_item(&self, input: NewItem) -> Result<Item> {
    debug!(item = %input.item_id, group = %input.group_id, position = ?input.position, "add_item");
    let canonical = Arc::clone(&self.canonical);
    self
      .run("add_item", move |conn| engine::add_item(conn, &input, &canonical))
      .await
  }

  async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
    self
      .run("get_item", move |conn| positions::load_item(conn, &item_id))
      .await
  }

  async fn remove_item(&self, item_id: ItemId) -> Result<Item> {
    debug!(item = %item_id, "remove_item");
    self
      .run("remove_item", move |conn| engine::remove_item(conn, &item_id))
      .await
  }

  // ── Ordering ──────────────────────────────────────────────────────────────

  async fn list(&self, group_id: GroupId) -> Result<Vec<Slot>> {
    self
      .run("list", move |conn| engine::list(conn, &group_id))
      .await
  }

  async fn move_item(&self, request: MoveRequest) -> Result<Item> {
    debug!(
      item = %request.item_id,
      to_group = %request.to_group_id,
      to = request.to_position,
      "move_item"
    );
    let canonical = Arc::clone(&self.canonical);
    self
      .run("move_item", move |conn| engine::move_item(conn, &request, &canonical))
      .await
  }

  async fn reindex(&self, group_id: GroupId) -> Result<usize> {
    debug!(group = %group_id, "reindex");
    self
      .run("reindex", move |conn| engine::reindex(conn, &group_id))
      .await
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Raw connection access so tests can stage states the engine never
  /// produces on its own.
  pub(crate) async fn with_raw<T, F>(&self, f: F) -> T
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(f(conn)?))
      .await
      .expect("raw test query")
  }
}
