//! HTTP server wiring for Ordo: configuration, the top-level router, and the
//! periodic reindex job.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{Router, routing::get};
use ordo_core::{
  GroupId,
  group::{GroupSpec, default_groups},
  retry::RetryPolicy,
  store::PositionStore,
};
use ordo_store_sqlite::StoreOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),
}

/// Runtime server configuration, deserialised from `ordo.toml` layered under
/// `ORDO_*` environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms:       u64,
  /// Reindex every group on this period. Disabled when absent.
  #[serde(default)]
  pub reindex_interval_secs: Option<u64>,
  /// Groups created on first reference.
  #[serde(default = "default_groups")]
  pub default_groups:        Vec<GroupSpec>,
  #[serde(default)]
  pub retry:                 RetryPolicy,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 5280 }

fn default_store_path() -> PathBuf { PathBuf::from("ordo.sqlite") }

fn default_busy_timeout_ms() -> u64 { 5_000 }

impl ServerConfig {
  /// Read `path` (optional) and `ORDO_*` environment overrides, e.g.
  /// `ORDO_PORT=8080` or `ORDO_RETRY__MAX_ATTEMPTS=5`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ORDO")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions {
      busy_timeout:   Duration::from_millis(self.busy_timeout_ms),
      default_groups: self.default_groups.clone(),
    }
  }

  pub fn reindex_interval(&self) -> Option<Duration> {
    self.reindex_interval_secs.filter(|s| *s > 0).map(Duration::from_secs)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api`, a health probe, and
/// request tracing.
pub fn app<S>(store: Arc<S>, retry: RetryPolicy) -> Router
where
  S: PositionStore + 'static,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", ordo_api::api_router(store, retry))
    .layer(TraceLayer::new_for_http())
}

// ─── Reindex job ──────────────────────────────────────────────────────────────

/// Outcome of one [`reindex_all`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexReport {
  pub renumbered: usize,
  pub failed:     Vec<GroupId>,
}

/// Reindex every group once. A group that fails is logged and skipped so the
/// remaining groups are still compacted; only listing the groups can fail the
/// whole pass.
pub async fn reindex_all<S: PositionStore>(store: &S) -> Result<ReindexReport, S::Error> {
  let mut report = ReindexReport::default();
  for group in store.list_groups().await? {
    match store.reindex(group.group_id.clone()).await {
      Ok(0) => {}
      Ok(renumbered) => {
        tracing::info!(group = %group.group_id, renumbered, "compacted group");
        report.renumbered += renumbered;
      }
      Err(e) => {
        tracing::warn!(group = %group.group_id, error = %e, "reindex failed for group");
        report.failed.push(group.group_id);
      }
    }
  }
  Ok(report)
}

/// Spawn a task that runs [`reindex_all`] every `period`. Failures are
/// logged and the next tick tries again.
pub fn spawn_reindex_job<S>(store: Arc<S>, period: Duration) -> JoinHandle<()>
where
  S: PositionStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it so startup is not
    // followed by a full pass.
    ticker.tick().await;
    loop {
      ticker.tick().await;
      match reindex_all(store.as_ref()).await {
        Ok(report) => tracing::debug!(
          renumbered = report.renumbered,
          failed = report.failed.len(),
          "periodic reindex finished"
        ),
        Err(e) => tracing::warn!(error = %e, "periodic reindex failed"),
      }
    }
  })
}

// ─── Paths ────────────────────────────────────────────────────────────────────

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use ordo_core::{GroupId, ItemId, item::NewItem};
  use ordo_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn config_file_overrides_defaults() {
    let path = std::env::temp_dir().join(format!("ordo-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
      &path,
      r#"
port = 9000
reindex_interval_secs = 60

[retry]
max_attempts = 5

[[default_groups]]
group_id = "backlog"
label = "Backlog"
sort_order = 0
"#,
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.reindex_interval(), Some(Duration::from_secs(60)));
    assert_eq!(cfg.retry.max_attempts, 5);
    assert_eq!(cfg.retry.initial_backoff_ms, RetryPolicy::default().initial_backoff_ms);
    assert_eq!(cfg.default_groups.len(), 1);
    assert_eq!(cfg.default_groups[0].group_id.as_str(), "backlog");
  }

  #[test]
  fn missing_config_file_uses_defaults() {
    let path = std::env::temp_dir().join(format!("ordo-missing-{}.toml", uuid::Uuid::new_v4()));
    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 5280);
    assert_eq!(cfg.default_groups, default_groups());
    assert_eq!(cfg.reindex_interval(), None);
    assert_eq!(cfg.store_options().busy_timeout, Duration::from_secs(5));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/ordo.sqlite")), PathBuf::from(home).join("ordo.sqlite"));
    assert_eq!(expand_tilde(Path::new("/var/ordo.sqlite")), PathBuf::from("/var/ordo.sqlite"));
  }

  #[tokio::test]
  async fn healthz_and_api_are_mounted() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = app(store, RetryPolicy::none());

    let resp = app
      .clone()
      .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
      .oneshot(Request::builder().uri("/api/groups").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
  }

  #[tokio::test]
  async fn reindex_all_visits_every_group() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    for (item, group) in [("a", "todo"), ("b", "todo"), ("c", "done")] {
      store
        .add_item(NewItem::new(ItemId::new(item).unwrap(), GroupId::new(group).unwrap()))
        .await
        .unwrap();
    }
    assert_eq!(reindex_all(&store).await.unwrap(), ReindexReport::default());
    assert_eq!(store.list_groups().await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn reindex_all_continues_past_a_failing_group() {
    let path = std::env::temp_dir().join(format!("ordo-{}.sqlite", uuid::Uuid::new_v4()));
    let store = SqliteStore::open(&path).await.unwrap();
    for (item, group) in [("a1", "todo"), ("a2", "todo"), ("b1", "doing"), ("b2", "doing")] {
      store
        .add_item(NewItem::new(ItemId::new(item).unwrap(), GroupId::new(group).unwrap()))
        .await
        .unwrap();
    }

    // Open a gap in both groups, then make every write to `todo` abort.
    let raw = rusqlite::Connection::open(&path).unwrap();
    raw
      .execute_batch(
        "UPDATE items SET position = 5 WHERE item_id IN ('a2', 'b2');
         CREATE TRIGGER freeze_todo BEFORE UPDATE ON items
         WHEN OLD.group_id = 'todo'
         BEGIN SELECT RAISE(ABORT, 'frozen'); END;",
      )
      .unwrap();
    drop(raw);

    let report = reindex_all(&store).await.unwrap();
    assert_eq!(report.renumbered, 1);
    assert_eq!(report.failed, vec![GroupId::new("todo").unwrap()]);

    let doing: Vec<i64> = store
      .list(GroupId::new("doing").unwrap())
      .await
      .unwrap()
      .into_iter()
      .map(|slot| slot.position)
      .collect();
    assert_eq!(doing, [0, 1]);

    store.close().await.unwrap();
    for suffix in ["", "-wal", "-shm"] {
      let mut file = path.clone().into_os_string();
      file.push(suffix);
      std::fs::remove_file(file).ok();
    }
  }
}
