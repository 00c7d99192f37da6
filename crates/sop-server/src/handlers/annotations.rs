use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use serde_json::{Value, json};
use sop_core::{annotation::NewAnnotation, store::AnnotationStore};
use tracing::{info, warn};

use crate::{AppState, Error};

/// `POST /annotations`
///
/// The question, answer and passage text must be the ones stored for the
/// question. The insert itself re-checks the assignment rules, so a stale
/// sample cannot push a question past two annotations.
pub async fn create(
  State(state): State<AppState>,
  payload: Result<Json<NewAnnotation>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Error> {
  let Json(input) = payload?;
  let question_id = input.question_id;
  let annotator_id = input.annotator_id;

  let question = state
    .bank
    .get(question_id)
    .await?
    .ok_or_else(|| Error::NotFound(format!("question {question_id}")))?;
  if input.question_text != question.question_text
    || input.answer_text != question.answer_text
    || input.passage_text != question.passage_text
  {
    warn!(%question_id, %annotator_id, "annotation text differs from question");
    return Err(Error::QuestionMismatch(question_id));
  }

  state.store.record_annotation(input).await?;
  info!(%question_id, %annotator_id, "annotation recorded");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "question_id": question_id, "annotator_id": annotator_id })),
  ))
}
