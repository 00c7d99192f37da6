use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use sop_core::{annotator::AnnotatorId, question::Question, store::AnnotationStore};

use crate::{AppState, Error};

#[derive(Debug, Deserialize)]
pub struct SampleQuery {
  pub annotator_id: AnnotatorId,
}

/// `GET /sample?annotator_id=..`
///
/// The function is taken from the stored annotator, not from the request.
pub async fn sample(
  State(state): State<AppState>,
  Query(q): Query<SampleQuery>,
) -> Result<Json<Question>, Error> {
  let annotator = state
    .store
    .get_annotator(q.annotator_id)
    .await?
    .ok_or_else(|| Error::NotFound(format!("annotator {}", q.annotator_id)))?;

  let question = state
    .pool
    .sample(&state.sampler, &state.store, &state.bank, annotator.id, annotator.function_id)
    .await?;
  Ok(Json(question))
}
