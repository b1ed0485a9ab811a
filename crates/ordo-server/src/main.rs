//! ordo-server binary.
//!
//! Reads `ordo.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the JSON API over HTTP.
//!
//! # One-shot maintenance
//!
//! To compact every group and exit without starting the server:
//!
//! ```
//! cargo run -p ordo-server -- --reindex-all
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use ordo_server::{ServerConfig, app, expand_tilde, reindex_all, spawn_reindex_job};
use ordo_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Ordo positioning server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "ordo.toml")]
  config: PathBuf,

  /// Reindex every group once and exit.
  #[arg(long)]
  reindex_all: bool,

  /// Print the resolved configuration as JSON and exit.
  #[arg(long)]
  print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;

  if cli.print_config {
    println!("{}", serde_json::to_string_pretty(&server_cfg)?);
    return Ok(());
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open_with(&store_path, server_cfg.store_options())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: compact and exit.
  if cli.reindex_all {
    let report = reindex_all(&store).await.context("reindex failed")?;
    println!("renumbered {} item(s)", report.renumbered);
    store.close().await.context("failed to close store")?;
    if !report.failed.is_empty() {
      anyhow::bail!("reindex failed for {} group(s)", report.failed.len());
    }
    return Ok(());
  }

  let store = Arc::new(store);
  let reindex_job = server_cfg.reindex_interval().map(|period| {
    tracing::info!(every_secs = period.as_secs(), "periodic reindex enabled");
    spawn_reindex_job(Arc::clone(&store), period)
  });

  let app = app(Arc::clone(&store), server_cfg.retry.clone());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("shutting down");
  if let Some(job) = reindex_job {
    job.abort();
    let _ = job.await;
  }
  if let Ok(store) = Arc::try_unwrap(store) {
    store.close().await.context("failed to close store")?;
  }
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
