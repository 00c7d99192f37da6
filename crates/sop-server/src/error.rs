//! Error type and axum `IntoResponse` implementation.
//!
//! Every response body is `{"error": "<message>", "code": "<code>"}`. The
//! `code` lets clients tell "no more work" apart from real failures.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use sop_core::question::QuestionId;
use sop_store_sqlite::Error as StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),

  /// The body could not be read as the expected JSON document.
  #[error("invalid request body: {0}")]
  Body(#[from] JsonRejection),

  /// The submitted texts are not those stored for the question.
  #[error("annotation text does not match question {0}")]
  QuestionMismatch(QuestionId),

  #[error(transparent)]
  Core(#[from] sop_core::Error),

  #[error(transparent)]
  Store(#[from] StoreError),
}

fn core_status(e: &sop_core::Error) -> (StatusCode, &'static str) {
  use sop_core::Error as C;
  match e {
    C::RatingOutOfRange(_) | C::InvalidAnnotator(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
    C::PoolExhausted => (StatusCode::NOT_FOUND, "pool_exhausted"),
    C::NoSuitableQuestion { .. } => (StatusCode::NOT_FOUND, "no_suitable_question"),
    C::InvariantViolation { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "invariant_violation"),
    C::Store(_) | C::Io(_) | C::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
  }
}

impl Error {
  pub fn status(&self) -> (StatusCode, &'static str) {
    match self {
      Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
      Error::Body(rejection) => (rejection.status(), "invalid_body"),
      Error::QuestionMismatch(_) => (StatusCode::UNPROCESSABLE_ENTITY, "question_mismatch"),
      Error::Core(e) => core_status(e),
      Error::Store(e) => match e {
        StoreError::Core(e) => core_status(e),
        StoreError::Validation { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_rows"),
        StoreError::DuplicateEntry { .. } => (StatusCode::CONFLICT, "duplicate"),
        StoreError::QuestionExhausted(_) => (StatusCode::CONFLICT, "question_exhausted"),
        StoreError::SameAnnotator { .. } => (StatusCode::CONFLICT, "same_annotator"),
        StoreError::FunctionMismatch(_) => (StatusCode::CONFLICT, "function_mismatch"),
        StoreError::UnknownAnnotator(_) => (StatusCode::NOT_FOUND, "not_found"),
        StoreError::Database(_)
        | StoreError::Sqlite(_)
        | StoreError::UnknownTable(_)
        | StoreError::KeyNotFound(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
      },
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, code) = self.status();
    if code == "invariant_violation" {
      tracing::error!(error = %self, "annotation history is corrupted; assignment halted");
    } else if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string(), "code": code }))).into_response()
  }
}
