//! Insert router (`db_push`).
//!
//! | Entity | Semantics |
//! |--------|-----------|
//! | function | idempotent: insert if the name is new, always return the key |
//! | annotator | idempotent on the full row tuple, always return the key |
//! | annotation | append exactly once; a duplicate or a policy breach is an error |
//!
//! All functions here run inside a caller-provided transaction (see
//! [`crate::SqliteStore::scoped`]).

use std::slice;

use rusqlite::{Connection, OptionalExtension as _, params};
use sop_core::{
  annotation::NewAnnotation,
  annotator::{AnnotatorId, FunctionId, NewAnnotator},
  sampling::{Verdict, classify},
};
use tracing::{debug, error, info, warn};

use crate::{
  Error, Result, Row,
  catalog::{StatementCatalog, render},
  encode,
  guard::{guard_rows, guard_scalar},
  introspect::validate_rows_for_table_db,
  lookup,
  schema::{ANNOTATION_TABLE, FUNCTION_TABLE, USER_TABLE},
};

/// One insert request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Push {
  Function(String),
  Annotator(NewAnnotator),
  Annotation(NewAnnotation),
}

/// What an insert request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushed {
  Function(FunctionId),
  Annotator(AnnotatorId),
  /// Annotations are tracked by question id; no key is returned.
  Annotation,
}

/// Dispatch `push` to the entity-specific insert path.
pub fn db_push(conn: &Connection, catalog: &StatementCatalog, push: Push) -> Result<Pushed> {
  match push {
    Push::Function(name) => push_function(conn, catalog, &name).map(Pushed::Function),
    Push::Annotator(input) => push_annotator(conn, catalog, &input).map(Pushed::Annotator),
    Push::Annotation(input) => push_annotation(conn, catalog, &input).map(|()| Pushed::Annotation),
  }
}

/// Insert `row` into `table` using `template`; returns the new rowid.
pub(crate) fn insert_row<S: AsRef<str>>(
  conn:     &Connection,
  template: &str,
  table:    &str,
  columns:  &[S],
  row:      &Row,
) -> Result<i64> {
  conn.execute(&render(template, table, columns), rusqlite::params_from_iter(row.iter()))?;
  Ok(conn.last_insert_rowid())
}

// ─── Function ────────────────────────────────────────────────────────────────

pub fn push_function(conn: &Connection, catalog: &StatementCatalog, name: &str) -> Result<FunctionId> {
  let row: Row = vec![rusqlite::types::Value::Text(name.to_owned())];
  let columns = validate_rows_for_table_db(conn, FUNCTION_TABLE, slice::from_ref(&row))?;

  match guard_scalar(conn, catalog, FUNCTION_TABLE, &columns, name)? {
    Some(_) => {
      insert_row(conn, &catalog.insert_in_function, FUNCTION_TABLE, &columns, &row)?;
      info!(name, "function created");
    }
    None => debug!(name, "function already present"),
  }

  let id = conn
    .query_row(
      &render(&catalog.select_pk_function, FUNCTION_TABLE, &columns),
      [name],
      |r| r.get(0),
    )
    .optional()?
    .ok_or(Error::KeyNotFound(FUNCTION_TABLE))?;
  Ok(FunctionId(id))
}

// ─── Annotator ───────────────────────────────────────────────────────────────

pub fn push_annotator(
  conn:    &Connection,
  catalog: &StatementCatalog,
  input:   &NewAnnotator,
) -> Result<AnnotatorId> {
  let row = encode::annotator_row(input);
  let columns = validate_rows_for_table_db(conn, USER_TABLE, slice::from_ref(&row))?;

  if guard_rows(conn, catalog, USER_TABLE, &columns, vec![row.clone()])?.is_empty() {
    debug!(first_name = %input.first_name, last_name = %input.last_name, "annotator already present");
  } else {
    insert_row(conn, &catalog.insert_in_user, USER_TABLE, &columns, &row)?;
    info!(
      first_name = %input.first_name,
      last_name = %input.last_name,
      function_id = %input.function_id,
      "annotator created"
    );
  }

  let id = conn
    .query_row(
      &render(&catalog.select_pk_user, USER_TABLE, &columns),
      params![
        input.first_name,
        input.last_name,
        input.function_id.0,
        input.years_in_function
      ],
      |r| r.get(0),
    )
    .optional()?
    .ok_or(Error::KeyNotFound(USER_TABLE))?;
  Ok(AnnotatorId(id))
}

// ─── Annotation ──────────────────────────────────────────────────────────────

/// Append an annotation.
///
/// # Errors
///
/// * [`Error::DuplicateEntry`]: an identical row already exists.
/// * [`Error::QuestionExhausted`]: the question already has two annotations.
/// * [`Error::Core`] wrapping `InvariantViolation`: it already has more.
/// * [`Error::SameAnnotator`] / [`Error::FunctionMismatch`]: the question
///   has one annotation and this annotator may not add the second.
pub fn push_annotation(
  conn:    &Connection,
  catalog: &StatementCatalog,
  input:   &NewAnnotation,
) -> Result<()> {
  let question_id = input.question_id;
  let annotator_id = input.annotator_id;

  let row = encode::annotation_row(input);
  let columns = validate_rows_for_table_db(conn, ANNOTATION_TABLE, slice::from_ref(&row))?;

  if guard_rows(conn, catalog, ANNOTATION_TABLE, &columns, vec![row.clone()])?.is_empty() {
    warn!(%question_id, %annotator_id, "annotation already present");
    return Err(Error::DuplicateEntry { table: ANNOTATION_TABLE.to_owned() });
  }

  // Same assignment rule as the sampler, checked in the insert transaction.
  let own = lookup::annotator_by_id(conn, catalog, annotator_id)?
    .ok_or(Error::UnknownAnnotator(annotator_id))?;
  let stamps = lookup::annotation_stamps(conn, catalog, question_id)?;

  match classify(&stamps, annotator_id, own.function_id) {
    Verdict::Accept => {}
    Verdict::Blocked if stamps.iter().any(|s| s.annotator_id == annotator_id) => {
      warn!(%question_id, %annotator_id, "annotator already annotated question");
      return Err(Error::SameAnnotator { question_id, annotator_id });
    }
    Verdict::Blocked => {
      warn!(%question_id, %annotator_id, "function differs from first annotation");
      return Err(Error::FunctionMismatch(question_id));
    }
    Verdict::Exhausted => {
      warn!(%question_id, existing = stamps.len(), "question already exhausted");
      return Err(Error::QuestionExhausted(question_id));
    }
    Verdict::Corrupt(count) => {
      error!(%question_id, count, "question has too many annotations");
      return Err(sop_core::Error::InvariantViolation { question_id, count }.into());
    }
  }

  insert_row(conn, &catalog.insert_in_annotation, ANNOTATION_TABLE, &columns, &row)?;
  info!(%question_id, %annotator_id, accepted = input.question_accepted, "annotation recorded");
  Ok(())
}
