//! Error types for `sop-core`.

use thiserror::Error;

use crate::question::QuestionId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("rating {0} is outside 1..=5")]
  RatingOutOfRange(i64),

  /// Every problem found in a registration form, in field order.
  #[error("invalid annotator: {}", .0.join("; "))]
  InvalidAnnotator(Vec<String>),

  #[error("question pool is exhausted")]
  PoolExhausted,

  /// The pool still holds questions but none may go to this annotator.
  #[error("no suitable question found after {attempts} draws")]
  NoSuitableQuestion { attempts: usize },

  #[error("question {question_id} has {count} annotations; at most 2 are allowed")]
  InvariantViolation { question_id: QuestionId, count: usize },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
