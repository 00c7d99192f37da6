//! Read-side queries shared by the insert router and the stores.

use rusqlite::{Connection, OptionalExtension as _};
use sop_core::{
  annotation::AnnotationStamp,
  annotator::{Annotator, AnnotatorId, Function},
  question::{Question, QuestionId},
};

use crate::{
  Result,
  catalog::{StatementCatalog, render},
  encode,
  schema::{ANNOTATION_TABLE, FUNCTION_TABLE, USER_TABLE},
};

const QUESTION_COLUMNS: [&str; 4] = ["question_id", "question_text", "answer_text", "passage_text"];

fn sql(template: &str, table: &str) -> String { render::<&str>(template, table, &[]) }

pub fn annotation_stamps(
  conn:        &Connection,
  catalog:     &StatementCatalog,
  question_id: QuestionId,
) -> Result<Vec<AnnotationStamp>> {
  let mut stmt = conn.prepare(&sql(&catalog.select_join, ANNOTATION_TABLE))?;
  let stamps = stmt
    .query_map([question_id.0], encode::stamp_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(stamps)
}

pub fn annotator_by_id(
  conn:    &Connection,
  catalog: &StatementCatalog,
  id:      AnnotatorId,
) -> Result<Option<Annotator>> {
  Ok(
    conn
      .query_row(
        &sql(&catalog.select_user_by_id, USER_TABLE),
        [id.0],
        encode::annotator_from_row,
      )
      .optional()?,
  )
}

pub fn annotators_by_name(
  conn:       &Connection,
  catalog:    &StatementCatalog,
  first_name: &str,
  last_name:  &str,
) -> Result<Vec<Annotator>> {
  let mut stmt = conn.prepare(&sql(&catalog.select_user_by_username, USER_TABLE))?;
  let annotators = stmt
    .query_map([first_name, last_name], encode::annotator_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(annotators)
}

pub fn functions(conn: &Connection, catalog: &StatementCatalog) -> Result<Vec<Function>> {
  let mut stmt = conn.prepare(&render(&catalog.select_all, FUNCTION_TABLE, &["id", "name"]))?;
  let functions = stmt
    .query_map([], encode::function_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(functions)
}

pub fn count_rows(conn: &Connection, catalog: &StatementCatalog, table: &str) -> Result<usize> {
  let n: i64 = conn.query_row(&sql(&catalog.select_length, table), [], |row| row.get(0))?;
  Ok(usize::try_from(n).unwrap_or_default())
}

pub fn question_by_id(
  conn:    &Connection,
  catalog: &StatementCatalog,
  table:   &str,
  id:      QuestionId,
) -> Result<Option<Question>> {
  Ok(
    conn
      .query_row(&sql(&catalog.select_question, table), [id.0], encode::question_from_row)
      .optional()?,
  )
}

pub fn all_questions(
  conn:    &Connection,
  catalog: &StatementCatalog,
  table:   &str,
) -> Result<Vec<Question>> {
  let mut stmt = conn.prepare(&render(&catalog.select_all, table, &QUESTION_COLUMNS))?;
  let questions = stmt
    .query_map([], encode::question_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(questions)
}
