//! sop-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! annotation and question databases, loads the question pool and serves the
//! JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use sop_server::{AppState, ServerConfig, load_catalog, pool::PoolHandle};
use sop_store_sqlite::{QuestionBank, SqliteStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Question annotation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SOP"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  server_cfg.annotation_db = expand_tilde(&server_cfg.annotation_db);
  server_cfg.question_db = expand_tilde(&server_cfg.question_db);
  server_cfg.pool_path = expand_tilde(&server_cfg.pool_path);
  server_cfg.statements_path = server_cfg.statements_path.as_deref().map(expand_tilde);

  let catalog = load_catalog(server_cfg.statements_path.as_deref())
    .context("failed to load statement catalog")?;
  let catalog = Arc::new(catalog);

  let store = SqliteStore::open(&server_cfg.annotation_db, catalog.clone())
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.annotation_db))?;
  let bank = QuestionBank::open(&server_cfg.question_db, catalog)
    .await
    .with_context(|| format!("failed to open question bank at {:?}", server_cfg.question_db))?;
  let pool = PoolHandle::open(server_cfg.pool_path.clone(), &bank)
    .await
    .with_context(|| format!("failed to load pool at {:?}", server_cfg.pool_path))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = sop_server::router(AppState::new(store, bank, pool, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
