//! The `AnnotationStore` trait.
//!
//! Implemented by storage backends (e.g. `sop-store-sqlite`). The sampler and
//! the HTTP layer depend on this abstraction, not on a concrete backend.

use std::future::Future;

use crate::{
  annotation::{AnnotationStamp, NewAnnotation},
  annotator::{Annotator, AnnotatorId, FunctionId, NewAnnotator},
  question::QuestionId,
};

/// Abstraction over the function / annotator / annotation store.
///
/// Function and annotator resolution is idempotent: resolving the same input
/// twice yields the same key and creates at most one row. Recording an
/// annotation is not: a second identical record is an error.
pub trait AnnotationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the key of the function called `name`, creating it if needed.
  fn resolve_function<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<FunctionId, Self::Error>> + Send + 'a;

  /// Return the key of the annotator matching the full input tuple,
  /// creating it if needed.
  fn resolve_annotator(
    &self,
    input: NewAnnotator,
  ) -> impl Future<Output = Result<AnnotatorId, Self::Error>> + Send + '_;

  /// Retrieve an annotator by key. Returns `None` if not found.
  fn get_annotator(
    &self,
    id: AnnotatorId,
  ) -> impl Future<Output = Result<Option<Annotator>, Self::Error>> + Send + '_;

  /// Append an annotation.
  ///
  /// Fails if an identical annotation already exists or if the question
  /// cannot take another annotation from this annotator.
  fn record_annotation(
    &self,
    input: NewAnnotation,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Annotator and function of every annotation referencing `question_id`.
  fn annotation_stamps(
    &self,
    question_id: QuestionId,
  ) -> impl Future<Output = Result<Vec<AnnotationStamp>, Self::Error>> + Send + '_;
}
