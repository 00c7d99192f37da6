//! Conversions between domain types and SQLite rows.
//!
//! Candidate rows are laid out in the tables' declaration order, which is
//! the order [`crate::introspect::get_insert_columns`] reports. Booleans are
//! stored as 0/1 integers.

use rusqlite::types::Value;
use sop_core::{
  annotation::{AnnotationStamp, NewAnnotation},
  annotator::{Annotator, AnnotatorId, Function, FunctionId, NewAnnotator},
  question::{NewQuestion, Question, QuestionId},
};

use crate::Row;

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn opt_text(s: Option<&str>) -> Value { s.map_or(Value::Null, text) }

// ─── Candidate rows ──────────────────────────────────────────────────────────

pub fn annotator_row(a: &NewAnnotator) -> Row {
  vec![
    text(&a.first_name),
    text(&a.last_name),
    Value::Integer(a.function_id.0),
    Value::Integer(a.years_in_function),
  ]
}

pub fn annotation_row(a: &NewAnnotation) -> Row {
  vec![
    text(&a.question_text),
    Value::Integer(a.question_id.0),
    opt_text(a.alt_question.as_deref()),
    text(&a.passage_text),
    text(&a.answer_text),
    opt_text(a.alt_answer.as_deref()),
    Value::Integer(i64::from(a.question_accepted)),
    Value::Integer(a.fluency.into()),
    Value::Integer(a.comprehensiveness.into()),
    Value::Integer(a.factuality.into()),
    Value::Integer(a.annotator_id.0),
  ]
}

/// Backup row: question, answer, passage.
pub fn question_row(q: &NewQuestion) -> Row {
  vec![text(&q.question_text), text(&q.answer_text), text(&q.passage_text)]
}

/// Live-table row: the backup key followed by the backup row.
pub fn live_question_row(id: QuestionId, q: &NewQuestion) -> Row {
  let mut row = Vec::with_capacity(4);
  row.push(Value::Integer(id.0));
  row.extend(question_row(q));
  row
}

// ─── Row readers ─────────────────────────────────────────────────────────────

/// Expects `id, first_name, last_name, function_id, years_in_function`.
pub fn annotator_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Annotator> {
  Ok(Annotator {
    id:                AnnotatorId(row.get(0)?),
    first_name:        row.get(1)?,
    last_name:         row.get(2)?,
    function_id:       FunctionId(row.get(3)?),
    years_in_function: row.get(4)?,
  })
}

/// Expects `question_id, question_text, answer_text, passage_text`.
pub fn question_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
  Ok(Question {
    question_id:   QuestionId(row.get(0)?),
    question_text: row.get(1)?,
    answer_text:   row.get(2)?,
    passage_text:  row.get(3)?,
  })
}

pub fn function_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Function> {
  Ok(Function { id: FunctionId(row.get(0)?), name: row.get(1)? })
}

pub fn stamp_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnnotationStamp> {
  Ok(AnnotationStamp {
    annotator_id: AnnotatorId(row.get(0)?),
    function_id:  FunctionId(row.get(1)?),
  })
}
