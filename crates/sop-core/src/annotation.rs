//! Annotation records.
//!
//! An annotation is an immutable historical record: it is inserted once and
//! never updated or deleted. At most two annotations may reference the same
//! question.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  annotator::{AnnotatorId, FunctionId},
  question::{Question, QuestionId},
};

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// A score on the 1..=5 scale. Out-of-range values cannot be constructed or
/// deserialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: i64 = 1;
  pub const MAX: i64 = 5;

  pub fn new(value: i64) -> Result<Self> {
    if (Self::MIN..=Self::MAX).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::RatingOutOfRange(value))
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Rating {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> { Self::new(value) }
}

impl From<Rating> for i64 {
  fn from(r: Rating) -> Self { i64::from(r.0) }
}

/// The three scores collected for every annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratings {
  pub fluency:           Rating,
  pub comprehensiveness: Rating,
  pub factuality:        Rating,
}

// ─── Annotation input ────────────────────────────────────────────────────────

fn accepted() -> bool { true }

/// Input for recording an annotation.
///
/// The question, answer and passage text are copied from the question at the
/// time of annotation. A rejected question may carry alternative text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnnotation {
  pub question_id:       QuestionId,
  pub question_text:     String,
  #[serde(default)]
  pub alt_question:      Option<String>,
  pub passage_text:      String,
  pub answer_text:       String,
  #[serde(default)]
  pub alt_answer:        Option<String>,
  #[serde(default = "accepted")]
  pub question_accepted: bool,
  pub fluency:           Rating,
  pub comprehensiveness: Rating,
  pub factuality:        Rating,
  pub annotator_id:      AnnotatorId,
}

impl NewAnnotation {
  /// Annotation that accepts the question as-is.
  pub fn accept(question: &Question, annotator_id: AnnotatorId, ratings: Ratings) -> Self {
    Self {
      question_id: question.question_id,
      question_text: question.question_text.clone(),
      alt_question: None,
      passage_text: question.passage_text.clone(),
      answer_text: question.answer_text.clone(),
      alt_answer: None,
      question_accepted: true,
      fluency: ratings.fluency,
      comprehensiveness: ratings.comprehensiveness,
      factuality: ratings.factuality,
      annotator_id,
    }
  }

  /// Annotation that rejects the question, optionally proposing
  /// replacement question and answer text.
  pub fn reject(
    question:     &Question,
    annotator_id: AnnotatorId,
    ratings:      Ratings,
    alt_question: Option<String>,
    alt_answer:   Option<String>,
  ) -> Self {
    Self {
      alt_question,
      alt_answer,
      question_accepted: false,
      ..Self::accept(question, annotator_id, ratings)
    }
  }

  pub fn ratings(&self) -> Ratings {
    Ratings {
      fluency:           self.fluency,
      comprehensiveness: self.comprehensiveness,
      factuality:        self.factuality,
    }
  }
}

/// Who annotated a question, and under which function.
///
/// This is all the sampler needs to know about existing annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationStamp {
  pub annotator_id: AnnotatorId,
  pub function_id:  FunctionId,
}
