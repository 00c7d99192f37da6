//! Question assignment.
//!
//! [`Sampler::sample`] draws questions uniformly at random from the pool and
//! classifies each draw by the annotations already recorded for it:
//!
//! | Existing | Outcome |
//! |----------|---------|
//! | 0 | hand the question out |
//! | 1 | hand it out only to a different annotator of the same function |
//! | 2 | exhausted: remove it from the pool and draw again |
//! | >2 | corrupted history: fail without retrying |
//!
//! Draws are capped at `pool.len() * attempt_factor` so a pool full of
//! blocked questions fails fast instead of being scanned exhaustively.

use rand::Rng;
use tracing::{debug, error, info};

use crate::{
  Error, Result,
  annotation::AnnotationStamp,
  annotator::{AnnotatorId, FunctionId},
  question::{Question, QuestionId, QuestionPool},
  store::AnnotationStore,
};

/// Maximum number of annotations a question may receive.
pub const MAX_ANNOTATIONS: usize = 2;

pub const DEFAULT_ATTEMPT_FACTOR: usize = 3;

/// How a single draw is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
  Accept,
  /// One annotation exists, from this annotator or another function.
  Blocked,
  Exhausted,
  Corrupt(usize),
}

/// Classify a question for `annotator_id` / `function_id` given its existing
/// annotations.
pub fn classify(
  stamps:       &[AnnotationStamp],
  annotator_id: AnnotatorId,
  function_id:  FunctionId,
) -> Verdict {
  match stamps {
    [] => Verdict::Accept,
    [first] => {
      if first.annotator_id != annotator_id && first.function_id == function_id {
        Verdict::Accept
      } else {
        Verdict::Blocked
      }
    }
    _ if stamps.len() == MAX_ANNOTATIONS => Verdict::Exhausted,
    _ => Verdict::Corrupt(stamps.len()),
  }
}

#[derive(Debug, Clone, Copy)]
pub struct Sampler {
  attempt_factor: usize,
}

impl Default for Sampler {
  fn default() -> Self { Self { attempt_factor: DEFAULT_ATTEMPT_FACTOR } }
}

impl Sampler {
  /// `attempt_factor` is clamped to at least 2.
  pub fn new(attempt_factor: usize) -> Self {
    Self { attempt_factor: attempt_factor.max(2) }
  }

  pub fn attempt_factor(&self) -> usize { self.attempt_factor }

  /// Pick a question for `annotator_id` working under `function_id`.
  ///
  /// Exhausted questions met along the way are removed from `pool` in place
  /// and can be collected with [`QuestionPool::take_retired`]. The pool may
  /// have shrunk even when this returns an error, so callers persist it on
  /// both paths.
  ///
  /// # Errors
  ///
  /// * [`Error::PoolExhausted`]: the pool is (or became) empty.
  /// * [`Error::NoSuitableQuestion`]: the draw budget ran out while every
  ///   remaining question was blocked for this annotator.
  /// * [`Error::InvariantViolation`]: a question has more than two
  ///   annotations.
  /// * [`Error::Store`]: the store lookup failed.
  pub async fn sample<S, R>(
    &self,
    pool:         &mut QuestionPool,
    store:        &S,
    annotator_id: AnnotatorId,
    function_id:  FunctionId,
    rng:          &mut R,
  ) -> Result<Question>
  where
    S: AnnotationStore,
    R: Rng,
  {
    let budget = pool.len() * self.attempt_factor;
    let mut attempts = 0;

    loop {
      if pool.is_empty() {
        return Err(Error::PoolExhausted);
      }
      if attempts >= budget {
        debug!(%annotator_id, %function_id, attempts, "draw budget spent");
        return Err(Error::NoSuitableQuestion { attempts });
      }
      attempts += 1;

      let index = rng.gen_range(0..pool.len());
      let Some(candidate) = pool.get(index).cloned() else {
        continue;
      };
      let question_id = candidate.question_id;

      let stamps = store
        .annotation_stamps(question_id)
        .await
        .map_err(|e| Error::Store(Box::new(e)))?;

      match classify(&stamps, annotator_id, function_id) {
        Verdict::Accept => {
          debug!(%question_id, %annotator_id, existing = stamps.len(), "question assigned");
          return Ok(candidate);
        }
        Verdict::Blocked => {
          debug!(%question_id, %annotator_id, "question blocked for annotator");
        }
        Verdict::Exhausted => {
          info!(%question_id, "question exhausted; removing from pool");
          pool.remove(question_id);
        }
        Verdict::Corrupt(count) => {
          error!(%question_id, count, "question has too many annotations");
          return Err(Error::InvariantViolation { question_id, count });
        }
      }
    }
  }
}
