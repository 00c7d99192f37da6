//! Functions (professional roles) and the annotators who belong to them.
//!
//! Both are created on first use and never updated. A function groups
//! annotators who may co-annotate the same question.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Surrogate key of a row in the `function` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub i64);

/// Surrogate key of a row in the `user` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotatorId(pub i64);

impl fmt::Display for FunctionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for AnnotatorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A professional role, e.g. "Nurse". Names are compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
  pub id:   FunctionId,
  pub name: String,
}

/// A persisted annotator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotator {
  pub id:                AnnotatorId,
  pub first_name:        String,
  pub last_name:         String,
  pub function_id:       FunctionId,
  pub years_in_function: i64,
}

/// Input for creating (or resolving) an annotator. The full tuple is the
/// annotator's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAnnotator {
  pub first_name:        String,
  pub last_name:         String,
  pub function_id:       FunctionId,
  pub years_in_function: i64,
}

// ─── Registration form ───────────────────────────────────────────────────────

/// Raw registration input as typed by the annotator.
///
/// `years_in_function` stays a string until validated so that a bad value is
/// reported alongside every other problem instead of failing deserialisation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotatorForm {
  #[serde(default)]
  pub first_name:        String,
  #[serde(default)]
  pub last_name:         String,
  #[serde(default)]
  pub function:          String,
  #[serde(default)]
  pub years_in_function: String,
}

/// A form that passed validation. The function is still a name; the caller
/// resolves it to a key before building a [`NewAnnotator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidForm {
  pub first_name:        String,
  pub last_name:         String,
  pub function:          String,
  pub years_in_function: i64,
}

impl ValidForm {
  pub fn into_new_annotator(self, function_id: FunctionId) -> NewAnnotator {
    NewAnnotator {
      first_name: self.first_name,
      last_name: self.last_name,
      function_id,
      years_in_function: self.years_in_function,
    }
  }
}

impl AnnotatorForm {
  /// Trim and check every field, collecting all problems.
  ///
  /// An empty `choices` slice accepts any non-empty function name.
  pub fn validate(&self, choices: &[String]) -> Result<ValidForm> {
    let first_name = self.first_name.trim();
    let last_name  = self.last_name.trim();
    let function   = self.function.trim();
    let raw_years  = self.years_in_function.trim();

    let mut errors = Vec::new();
    if first_name.is_empty() {
      errors.push("First name is required.".to_owned());
    }
    if last_name.is_empty() {
      errors.push("Last name is required.".to_owned());
    }
    if function.is_empty() {
      errors.push("Function is required.".to_owned());
    } else if !choices.is_empty() && !choices.iter().any(|c| c == function) {
      errors.push(format!("Unknown function {function:?}."));
    }

    let mut years = 0;
    if raw_years.is_empty() {
      errors.push("Years in function is required.".to_owned());
    } else {
      match raw_years.parse::<i64>() {
        Ok(y) if y < 0 => {
          errors.push("Years in function must be zero or positive.".to_owned())
        }
        Ok(y) => years = y,
        Err(_) => errors.push("Years in function must be an integer.".to_owned()),
      }
    }

    if !errors.is_empty() {
      return Err(Error::InvalidAnnotator(errors));
    }

    Ok(ValidForm {
      first_name:        first_name.to_owned(),
      last_name:         last_name.to_owned(),
      function:          function.to_owned(),
      years_in_function: years,
    })
  }
}
