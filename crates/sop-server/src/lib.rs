//! JSON API for the annotation workflow.
//!
//! Exposes an axum [`Router`] over the SQLite annotation store, the question
//! bank and the shared question pool.

pub mod error;
pub mod handlers;
pub mod pool;

pub use error::Error;

use std::{path::{Path, PathBuf}, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use sop_core::sampling::{DEFAULT_ATTEMPT_FACTOR, Sampler};
use sop_store_sqlite::{QuestionBank, SqliteStore, StatementCatalog};
use tower_http::trace::TraceLayer;

use handlers::{annotations, annotators, questions, sampling};
use pool::PoolHandle;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  pub annotation_db:   PathBuf,
  pub question_db:     PathBuf,
  pub pool_path:       PathBuf,
  #[serde(default = "default_attempt_factor")]
  pub attempt_factor:  usize,
  /// Accepted values for the annotator's function. Empty accepts anything.
  #[serde(default = "default_functions")]
  pub functions:       Vec<String>,
  /// Optional YAML file overriding entries of the statement catalog.
  #[serde(default)]
  pub statements_path: Option<PathBuf>,
}

fn default_host() -> String { "0.0.0.0".into() }

fn default_port() -> u16 { 8100 }

fn default_attempt_factor() -> usize { DEFAULT_ATTEMPT_FACTOR }

fn default_functions() -> Vec<String> {
  ["Physician", "Nurse", "Researcher", "Student", "Technician", "Other"]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Build the statement catalog, applying overrides from `path` if given.
pub fn load_catalog(path: Option<&Path>) -> Result<StatementCatalog, config::ConfigError> {
  let Some(path) = path else {
    return Ok(StatementCatalog::default());
  };
  config::Config::builder()
    .add_source(config::File::from(path))
    .build()?
    .try_deserialize()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub store:   Arc<SqliteStore>,
  pub bank:    Arc<QuestionBank>,
  pub pool:    Arc<PoolHandle>,
  pub sampler: Sampler,
  pub config:  Arc<ServerConfig>,
}

impl AppState {
  pub fn new(
    store:  SqliteStore,
    bank:   QuestionBank,
    pool:   PoolHandle,
    config: ServerConfig,
  ) -> Self {
    Self {
      store:   Arc::new(store),
      bank:    Arc::new(bank),
      pool:    Arc::new(pool),
      sampler: Sampler::new(config.attempt_factor),
      config:  Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the annotation API.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/annotators",      get(annotators::lookup).post(annotators::register))
    .route("/functions",       get(annotators::functions))
    .route("/sample",          get(sampling::sample))
    .route("/annotations",     post(annotations::create))
    .route("/questions",       post(questions::import))
    .route("/questions/stats", get(questions::stats))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
