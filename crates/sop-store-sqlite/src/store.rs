//! [`SqliteStore`], the SQLite implementation of [`AnnotationStore`].

use std::{path::Path, sync::Arc};

use rusqlite::Transaction;
use sop_core::{
  annotation::{AnnotationStamp, NewAnnotation},
  annotator::{Annotator, AnnotatorId, Function, FunctionId, NewAnnotator},
  question::QuestionId,
  store::AnnotationStore,
};

use crate::{
  Error, Result,
  catalog::StatementCatalog,
  lookup,
  router::{self, Push, Pushed},
  schema::{ANNOTATION_SCHEMA, ANNOTATION_TABLE, FUNCTION_TABLE, USER_TABLE},
  scope::Scope,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Function, annotator and annotation store backed by a single SQLite file.
///
/// Clones share the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  scope: Scope,
}

/// Row counts of the three tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreCounts {
  pub functions:   usize,
  pub annotators:  usize,
  pub annotations: usize,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, catalog: Arc<StatementCatalog>) -> Result<Self> {
    let scope = Scope::open(path, ANNOTATION_SCHEMA, catalog).await?;
    Ok(Self { scope })
  }

  /// Open an in-memory store.
  pub async fn open_in_memory(catalog: Arc<StatementCatalog>) -> Result<Self> {
    let scope = Scope::open_in_memory(ANNOTATION_SCHEMA, catalog).await?;
    Ok(Self { scope })
  }

  /// Run `work` in one transaction on this store's connection.
  ///
  /// Committed when `work` returns `Ok`, rolled back otherwise.
  pub async fn scoped<T, F>(&self, work: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>, &StatementCatalog) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.scope.run(work).await
  }

  /// Route one insert request (see [`router`]).
  pub async fn push(&self, push: Push) -> Result<Pushed> {
    self.scoped(move |tx, catalog| router::db_push(tx, catalog, push)).await
  }

  pub async fn annotators_by_name(
    &self,
    first_name: &str,
    last_name:  &str,
  ) -> Result<Vec<Annotator>> {
    let (first_name, last_name) = (first_name.to_owned(), last_name.to_owned());
    self
      .scoped(move |tx, catalog| lookup::annotators_by_name(tx, catalog, &first_name, &last_name))
      .await
  }

  pub async fn functions(&self) -> Result<Vec<Function>> {
    self.scoped(|tx, catalog| lookup::functions(tx, catalog)).await
  }

  pub async fn counts(&self) -> Result<StoreCounts> {
    self
      .scoped(|tx, catalog| {
        Ok(StoreCounts {
          functions:   lookup::count_rows(tx, catalog, FUNCTION_TABLE)?,
          annotators:  lookup::count_rows(tx, catalog, USER_TABLE)?,
          annotations: lookup::count_rows(tx, catalog, ANNOTATION_TABLE)?,
        })
      })
      .await
  }
}

// ─── AnnotationStore impl ────────────────────────────────────────────────────

impl AnnotationStore for SqliteStore {
  type Error = Error;

  async fn resolve_function(&self, name: &str) -> Result<FunctionId> {
    let name = name.to_owned();
    self
      .scoped(move |tx, catalog| router::push_function(tx, catalog, &name))
      .await
  }

  async fn resolve_annotator(&self, input: NewAnnotator) -> Result<AnnotatorId> {
    self
      .scoped(move |tx, catalog| router::push_annotator(tx, catalog, &input))
      .await
  }

  async fn get_annotator(&self, id: AnnotatorId) -> Result<Option<Annotator>> {
    self
      .scoped(move |tx, catalog| lookup::annotator_by_id(tx, catalog, id))
      .await
  }

  async fn record_annotation(&self, input: NewAnnotation) -> Result<()> {
    self
      .scoped(move |tx, catalog| router::push_annotation(tx, catalog, &input))
      .await
  }

  async fn annotation_stamps(&self, question_id: QuestionId) -> Result<Vec<AnnotationStamp>> {
    self
      .scoped(move |tx, catalog| lookup::annotation_stamps(tx, catalog, question_id))
      .await
  }
}
