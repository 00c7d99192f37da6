//! [`QuestionBank`]: live questions plus their append-only backup.
//!
//! New questions are written to `backup` first, which assigns the key, and
//! then copied into `questions` under the same key. Exhausted questions are
//! deleted from `questions` only, so `backup` always holds a superset.

use std::{path::Path, sync::Arc};

use rusqlite::{Connection, Transaction, types::Value};
use sop_core::question::{NewQuestion, Question, QuestionId, QuestionPool};
use tracing::info;

use crate::{
  Result, Row,
  catalog::{StatementCatalog, render},
  encode,
  guard::guard_rows,
  introspect::{get_insert_columns, validate_rows_for_table_db},
  lookup,
  router::insert_row,
  schema::{BACKUP_TABLE, QUESTION_SCHEMA, QUESTION_TABLE},
  scope::Scope,
};

#[derive(Clone)]
pub struct QuestionBank {
  scope: Scope,
}

/// Row counts of the live and backup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BankCounts {
  pub live:   usize,
  pub backup: usize,
}

impl QuestionBank {
  pub async fn open(path: impl AsRef<Path>, catalog: Arc<StatementCatalog>) -> Result<Self> {
    let scope = Scope::open(path, QUESTION_SCHEMA, catalog).await?;
    Ok(Self { scope })
  }

  pub async fn open_in_memory(catalog: Arc<StatementCatalog>) -> Result<Self> {
    let scope = Scope::open_in_memory(QUESTION_SCHEMA, catalog).await?;
    Ok(Self { scope })
  }

  /// Run `work` in one transaction on this bank's connection.
  pub async fn scoped<T, F>(&self, work: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>, &StatementCatalog) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.scope.run(work).await
  }

  /// Import raw `[question, answer, passage]` rows.
  ///
  /// Every row is arity-checked before anything is written; a single bad row
  /// rejects the whole batch and the error lists all bad rows. Rows already
  /// in the backup (or repeated within the batch) are skipped. Returns the
  /// questions that were added.
  pub async fn import_rows(&self, rows: Vec<Vec<String>>) -> Result<Vec<Question>> {
    self
      .scoped(move |tx, catalog| {
        let raw: Vec<Row> = rows
          .iter()
          .map(|r| r.iter().map(|v| Value::Text(v.clone())).collect())
          .collect();
        validate_rows_for_table_db(tx, BACKUP_TABLE, &raw)?;

        let questions = rows
          .into_iter()
          .filter_map(|r| match r.as_slice() {
            [q, a, p] => Some(NewQuestion {
              question_text: q.clone(),
              answer_text:   a.clone(),
              passage_text:  p.clone(),
            }),
            _ => None,
          })
          .collect();
        import(tx, catalog, questions)
      })
      .await
  }

  /// Import typed questions; see [`QuestionBank::import_rows`].
  pub async fn import(&self, questions: Vec<NewQuestion>) -> Result<Vec<Question>> {
    self
      .scoped(move |tx, catalog| import(tx, catalog, questions))
      .await
  }

  /// All questions that can still be handed out.
  pub async fn live_questions(&self) -> Result<Vec<Question>> {
    self
      .scoped(|tx, catalog| lookup::all_questions(tx, catalog, QUESTION_TABLE))
      .await
  }

  /// Look a question up in the backup, so exhausted questions are found too.
  pub async fn get(&self, id: QuestionId) -> Result<Option<Question>> {
    self
      .scoped(move |tx, catalog| lookup::question_by_id(tx, catalog, BACKUP_TABLE, id))
      .await
  }

  /// Delete exhausted questions from the live table. Returns how many rows
  /// were removed.
  pub async fn retire(&self, ids: Vec<QuestionId>) -> Result<usize> {
    if ids.is_empty() {
      return Ok(0);
    }
    self
      .scoped(move |tx, catalog| {
        let sql = render::<&str>(&catalog.delete_row, QUESTION_TABLE, &[]);
        let mut removed = 0;
        for id in &ids {
          removed += tx.execute(&sql, [id.0])?;
        }
        info!(removed, "questions retired from live table");
        Ok(removed)
      })
      .await
  }

  pub async fn counts(&self) -> Result<BankCounts> {
    self
      .scoped(|tx, catalog| {
        Ok(BankCounts {
          live:   lookup::count_rows(tx, catalog, QUESTION_TABLE)?,
          backup: lookup::count_rows(tx, catalog, BACKUP_TABLE)?,
        })
      })
      .await
  }

  /// Build a fresh pool from the live table.
  pub async fn load_pool(&self) -> Result<QuestionPool> {
    Ok(QuestionPool::new(self.live_questions().await?))
  }
}

fn import(
  conn:      &Connection,
  catalog:   &StatementCatalog,
  questions: Vec<NewQuestion>,
) -> Result<Vec<Question>> {
  let mut unique: Vec<NewQuestion> = Vec::with_capacity(questions.len());
  for q in questions {
    if !unique.contains(&q) {
      unique.push(q);
    }
  }

  let rows: Vec<Row> = unique.iter().map(encode::question_row).collect();
  let backup_columns = validate_rows_for_table_db(conn, BACKUP_TABLE, &rows)?;
  let fresh = guard_rows(conn, catalog, BACKUP_TABLE, &backup_columns, rows)?;
  let live_columns = get_insert_columns(conn, QUESTION_TABLE)?;

  let mut added = Vec::with_capacity(fresh.len());
  for q in unique {
    let row = encode::question_row(&q);
    if !fresh.contains(&row) {
      continue;
    }
    let id = QuestionId(insert_row(conn, &catalog.insert_into, BACKUP_TABLE, &backup_columns, &row)?);
    let live = encode::live_question_row(id, &q);
    insert_row(conn, &catalog.insert_into, QUESTION_TABLE, &live_columns, &live)?;
    added.push(Question {
      question_id:   id,
      question_text: q.question_text,
      answer_text:   q.answer_text,
      passage_text:  q.passage_text,
    });
  }

  info!(added = added.len(), "questions imported");
  Ok(added)
}
