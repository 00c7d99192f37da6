//! Annotator registration and lookup.

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sop_core::{
  annotator::{Annotator, AnnotatorForm, AnnotatorId, Function, FunctionId},
  store::AnnotationStore,
};
use tracing::info;

use crate::{AppState, Error};

#[derive(Debug, Serialize)]
pub struct Registered {
  pub function_id:  FunctionId,
  pub annotator_id: AnnotatorId,
}

/// `POST /annotators`: validate the form, then resolve the function and the
/// annotator. Registering the same person twice returns the same keys.
pub async fn register(
  State(state): State<AppState>,
  payload: Result<Json<AnnotatorForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Registered>), Error> {
  let Json(form) = payload?;
  let valid = form.validate(&state.config.functions)?;
  let function_id = state.store.resolve_function(&valid.function).await?;
  let annotator_id = state
    .store
    .resolve_annotator(valid.into_new_annotator(function_id))
    .await?;
  info!(%annotator_id, %function_id, "annotator registered");
  Ok((StatusCode::CREATED, Json(Registered { function_id, annotator_id })))
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
  pub first_name: String,
  pub last_name:  String,
}

/// `GET /annotators?first_name=..&last_name=..`
pub async fn lookup(
  State(state): State<AppState>,
  Query(q): Query<NameQuery>,
) -> Result<Json<Vec<Annotator>>, Error> {
  let found = state
    .store
    .annotators_by_name(q.first_name.trim(), q.last_name.trim())
    .await?;
  Ok(Json(found))
}

#[derive(Debug, Serialize)]
pub struct Functions {
  /// Names accepted by the registration form.
  pub choices:    Vec<String>,
  /// Functions that already have a key.
  pub registered: Vec<Function>,
}

/// `GET /functions`
pub async fn functions(State(state): State<AppState>) -> Result<Json<Functions>, Error> {
  Ok(Json(Functions {
    choices:    state.config.functions.clone(),
    registered: state.store.functions().await?,
  }))
}
