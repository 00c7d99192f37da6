//! Questions and the in-memory question pool.
//!
//! The pool is the working set of questions that can still be handed out. It
//! is read fully into memory at start-up and written back fully after every
//! mutation; there is no incremental I/O.

use std::{
  fmt, fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Surrogate key shared by the `backup` and `questions` tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

impl fmt::Display for QuestionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A question/answer/passage triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub question_id:   QuestionId,
  pub question_text: String,
  pub answer_text:   String,
  pub passage_text:  String,
}

/// A question that has not been assigned a key yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
  pub question_text: String,
  pub answer_text:   String,
  pub passage_text:  String,
}

// ─── Pool ────────────────────────────────────────────────────────────────────

/// The persisted pool document.
///
/// `revision` increases by one on every [`QuestionPool::save`], so two
/// copies of the document can be ordered. Ids removed since the last
/// [`QuestionPool::take_retired`] are kept in memory only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionPool {
  #[serde(default)]
  revision:  u64,
  #[serde(default)]
  saved_at:  Option<DateTime<Utc>>,
  questions: Vec<Question>,
  #[serde(skip)]
  retired:   Vec<QuestionId>,
}

impl QuestionPool {
  pub fn new(questions: Vec<Question>) -> Self {
    Self { revision: 0, saved_at: None, questions, retired: Vec::new() }
  }

  pub fn len(&self) -> usize { self.questions.len() }

  pub fn is_empty(&self) -> bool { self.questions.is_empty() }

  pub fn questions(&self) -> &[Question] { &self.questions }

  pub fn revision(&self) -> u64 { self.revision }

  pub fn saved_at(&self) -> Option<DateTime<Utc>> { self.saved_at }

  pub fn get(&self, index: usize) -> Option<&Question> { self.questions.get(index) }

  pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
    self.questions.iter().map(|q| q.question_id)
  }

  pub fn contains(&self, id: QuestionId) -> bool {
    self.questions.iter().any(|q| q.question_id == id)
  }

  /// Remove a question by id, preserving the order of the rest. The id is
  /// recorded for [`QuestionPool::take_retired`].
  pub fn remove(&mut self, id: QuestionId) -> Option<Question> {
    let index = self.questions.iter().position(|q| q.question_id == id)?;
    self.retired.push(id);
    Some(self.questions.remove(index))
  }

  /// Ids removed since the previous call, in removal order.
  pub fn take_retired(&mut self) -> Vec<QuestionId> { std::mem::take(&mut self.retired) }

  /// Add questions that are not already pooled. Returns how many were added.
  pub fn extend(&mut self, questions: impl IntoIterator<Item = Question>) -> usize {
    let mut added = 0;
    for q in questions {
      if !self.contains(q.question_id) {
        self.questions.push(q);
        added += 1;
      }
    }
    added
  }

  /// Read a pool document. Returns `None` if the file does not exist.
  pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
    let bytes = match fs::read(path.as_ref()) {
      Ok(b) => b,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
  }

  /// Write the whole document, replacing the file atomically.
  ///
  /// The document goes to a sibling temporary file first and is then renamed
  /// over `path`, so a crash mid-write leaves the previous revision intact.
  pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    self.revision += 1;
    self.saved_at = Some(Utc::now());

    let tmp = tmp_path(path);
    fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
  }
}

fn tmp_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn q(id: i64) -> Question {
    Question {
      question_id:   QuestionId(id),
      question_text: format!("question {id}"),
      answer_text:   format!("answer {id}"),
      passage_text:  format!("passage {id}"),
    }
  }

  #[test]
  fn remove_keeps_order() {
    let mut pool = QuestionPool::new(vec![q(1), q(2), q(3)]);
    assert_eq!(pool.remove(QuestionId(2)).map(|q| q.question_id), Some(QuestionId(2)));
    assert!(pool.remove(QuestionId(2)).is_none());
    let ids: Vec<_> = pool.questions().iter().map(|q| q.question_id.0).collect();
    assert_eq!(ids, [1, 3]);
  }

  #[test]
  fn removals_are_taken_once() {
    let mut pool = QuestionPool::new(vec![q(1), q(2), q(3)]);
    pool.remove(QuestionId(3));
    pool.remove(QuestionId(9));
    pool.remove(QuestionId(1));
    assert_eq!(pool.take_retired(), [QuestionId(3), QuestionId(1)]);
    assert!(pool.take_retired().is_empty());
  }

  #[test]
  fn extend_skips_pooled_ids() {
    let mut pool = QuestionPool::new(vec![q(1)]);
    assert_eq!(pool.extend([q(1), q(2)]), 1);
    assert_eq!(pool.len(), 2);
  }

  #[test]
  fn load_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(QuestionPool::load(dir.path().join("pool.json")).unwrap().is_none());
  }

  #[test]
  fn save_bumps_revision_and_reloads() {
    let dir  = tempfile::tempdir().unwrap();
    let path = dir.path().join("pool.json");

    let mut pool = QuestionPool::new(vec![q(1), q(2)]);
    pool.save(&path).unwrap();
    pool.remove(QuestionId(1));
    pool.save(&path).unwrap();

    let loaded = QuestionPool::load(&path).unwrap().unwrap();
    assert_eq!(loaded.revision(), 2);
    assert!(loaded.saved_at().is_some());
    assert_eq!(loaded.questions(), &[q(2)]);
    assert!(!dir.path().join("pool.json.tmp").exists());
  }

  #[test]
  fn minimal_document_parses() {
    let doc = r#"{"questions":[{"question_id":7,"question_text":"q","answer_text":"a","passage_text":"p"}]}"#;
    let pool: QuestionPool = serde_json::from_str(doc).unwrap();
    assert_eq!(pool.revision(), 0);
    assert!(pool.contains(QuestionId(7)));
  }
}
