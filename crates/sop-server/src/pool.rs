//! Serialized access to the question pool.
//!
//! The pool is process-wide mutable state. [`PoolHandle`] owns it behind an
//! async mutex; a sample, the retirement of exhausted questions from the
//! live table and the write-back of the pool document all happen under one
//! lock acquisition.

use std::path::PathBuf;

use rand::{SeedableRng, rngs::StdRng};
use sop_core::{
  annotator::{AnnotatorId, FunctionId},
  question::{Question, QuestionPool},
  sampling::Sampler,
};
use sop_store_sqlite::{QuestionBank, SqliteStore};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::Error;

pub struct PoolHandle {
  pool: Mutex<QuestionPool>,
  path: PathBuf,
}

impl PoolHandle {
  pub fn new(pool: QuestionPool, path: PathBuf) -> Self {
    Self { pool: Mutex::new(pool), path }
  }

  /// Load the pool document at `path`, or seed it from the live question
  /// table (and write it) if the file does not exist yet.
  pub async fn open(path: PathBuf, bank: &QuestionBank) -> Result<Self, Error> {
    let pool = match QuestionPool::load(&path)? {
      Some(pool) => {
        info!(path = %path.display(), size = pool.len(), revision = pool.revision(), "pool loaded");
        pool
      }
      None => {
        let mut pool = bank.load_pool().await?;
        pool.save(&path)?;
        info!(path = %path.display(), size = pool.len(), "pool seeded from live questions");
        pool
      }
    };
    Ok(Self::new(pool, path))
  }

  pub async fn len(&self) -> usize { self.pool.lock().await.len() }

  pub async fn revision(&self) -> u64 { self.pool.lock().await.revision() }

  /// Sample a question for one annotator.
  ///
  /// Questions the sampler found exhausted are deleted from the live table
  /// and the pool document is rewritten, on success and on failure alike.
  /// The document is written even if the live-table delete fails.
  pub async fn sample(
    &self,
    sampler:      &Sampler,
    store:        &SqliteStore,
    bank:         &QuestionBank,
    annotator_id: AnnotatorId,
    function_id:  FunctionId,
  ) -> Result<Question, Error> {
    let mut pool = self.pool.lock().await;
    let mut rng = StdRng::from_entropy();

    let result = sampler
      .sample(&mut *pool, store, annotator_id, function_id, &mut rng)
      .await;

    let retired = pool.take_retired();
    if !retired.is_empty() {
      let count = retired.len();
      let retire = bank.retire(retired).await;
      pool.save(&self.path)?;
      if let Err(e) = retire {
        error!(error = %e, count, "exhausted questions left in live table");
        return Err(e.into());
      }
    }

    Ok(result?)
  }

  /// Add newly imported questions and persist. Returns how many were added.
  pub async fn extend(&self, questions: Vec<Question>) -> Result<usize, Error> {
    let mut pool = self.pool.lock().await;
    let added = pool.extend(questions);
    if added > 0 {
      pool.save(&self.path)?;
    }
    Ok(added)
  }
}
