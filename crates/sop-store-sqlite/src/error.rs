//! Error type for `sop-store-sqlite`.

use sop_core::{annotator::AnnotatorId, question::QuestionId};
use thiserror::Error;

/// A row whose length does not match the table's insert columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowArity {
  pub index: usize,
  pub len:   usize,
}

fn describe(offending: &[RowArity]) -> String {
  offending
    .iter()
    .map(|r| format!("row {} has {}", r.index, r.len))
    .collect::<Vec<_>>()
    .join(", ")
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] sop_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  /// Lists every offending row, not just the first.
  #[error("invalid rows for table {table}: expected {expected} columns; {}", describe(.offending))]
  Validation {
    table:     String,
    expected:  usize,
    offending: Vec<RowArity>,
  },

  #[error("entry already present in table {table}")]
  DuplicateEntry { table: String },

  #[error("question {0} already has the maximum number of annotations")]
  QuestionExhausted(QuestionId),

  #[error("annotator {annotator_id} already annotated question {question_id}")]
  SameAnnotator {
    question_id:  QuestionId,
    annotator_id: AnnotatorId,
  },

  #[error("question {0} was first annotated under a different function")]
  FunctionMismatch(QuestionId),

  #[error("annotator not found: {0}")]
  UnknownAnnotator(AnnotatorId),

  #[error("no such table: {0}")]
  UnknownTable(String),

  /// A row was inserted or found but its key could not be read back.
  #[error("key not found after insert into {0}")]
  KeyNotFound(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
