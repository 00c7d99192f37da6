//! Question import and pool statistics.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sop_core::question::Question;

use crate::{AppState, Error};

/// Raw `[question, answer, passage]` rows, already parsed from whatever
/// upload format the client used.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
  pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
  pub added:     usize,
  pub questions: Vec<Question>,
}

/// `POST /questions`
///
/// All rows are checked before anything is written; one bad row rejects the
/// batch with 422 and lists every offending row.
pub async fn import(
  State(state): State<AppState>,
  payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportResponse>), Error> {
  let Json(req) = payload?;
  let questions = state.bank.import_rows(req.rows).await?;
  state.pool.extend(questions.clone()).await?;
  Ok((
    StatusCode::CREATED,
    Json(ImportResponse { added: questions.len(), questions }),
  ))
}

#[derive(Debug, Serialize)]
pub struct Stats {
  pub live:          usize,
  pub backup:        usize,
  pub pool:          usize,
  pub pool_revision: u64,
  pub annotators:    usize,
  pub annotations:   usize,
}

/// `GET /questions/stats`
pub async fn stats(State(state): State<AppState>) -> Result<Json<Stats>, Error> {
  let bank = state.bank.counts().await?;
  let store = state.store.counts().await?;
  Ok(Json(Stats {
    live:          bank.live,
    backup:        bank.backup,
    pool:          state.pool.len().await,
    pool_revision: state.pool.revision().await,
    annotators:    store.annotators,
    annotations:   store.annotations,
  }))
}
