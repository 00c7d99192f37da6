//! Named SQL statement templates.
//!
//! Templates use three placeholders, filled by [`render`]:
//!
//! | Placeholder | Replaced with |
//! |-------------|---------------|
//! | `{table}` | the quoted table name |
//! | `{columns}` | the quoted, comma-separated column list |
//! | `{placeholders}` | `?1, ?2, …`, one per column |
//!
//! The built-in defaults match the schema in this crate. Deployments may
//! override any entry. Keys are the upper-case statement names such as
//! `SELECT_JOIN`; lower-case spellings are accepted too. A malformed
//! override surfaces as a SQLite error when the statement first runs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StatementCatalog {
  #[serde(alias = "insert_into")]
  pub insert_into:             String,
  #[serde(alias = "insert_in_function")]
  pub insert_in_function:      String,
  #[serde(alias = "insert_in_user")]
  pub insert_in_user:          String,
  #[serde(alias = "insert_in_annotation")]
  pub insert_in_annotation:    String,
  #[serde(alias = "select_all")]
  pub select_all:              String,
  /// Annotator and function of each annotation on `?1` (a question id).
  #[serde(alias = "select_join")]
  pub select_join:             String,
  #[serde(alias = "select_pk_function")]
  pub select_pk_function:      String,
  #[serde(alias = "select_pk_user")]
  pub select_pk_user:          String,
  #[serde(alias = "select_length")]
  pub select_length:           String,
  #[serde(alias = "select_question")]
  pub select_question:         String,
  #[serde(alias = "delete_row")]
  pub delete_row:              String,
  #[serde(alias = "select_user_by_username")]
  pub select_user_by_username: String,
  #[serde(alias = "select_user_by_id")]
  pub select_user_by_id:       String,
}

const INSERT: &str = "INSERT INTO {table} ({columns}) VALUES ({placeholders})";

impl Default for StatementCatalog {
  fn default() -> Self {
    Self {
      insert_into:             INSERT.into(),
      insert_in_function:      INSERT.into(),
      insert_in_user:          INSERT.into(),
      insert_in_annotation:    INSERT.into(),
      select_all:              "SELECT {columns} FROM {table}".into(),
      select_join:             "SELECT a.annotator_id, u.function_id
                                FROM {table} AS a
                                JOIN \"user\" AS u ON u.id = a.annotator_id
                                WHERE a.question_id = ?1
                                ORDER BY a.id"
        .into(),
      select_pk_function:      "SELECT id FROM {table} WHERE name = ?1 ORDER BY id LIMIT 1".into(),
      select_pk_user:          "SELECT id FROM {table}
                                WHERE first_name = ?1 AND last_name = ?2
                                  AND function_id = ?3 AND years_in_function = ?4
                                ORDER BY id LIMIT 1"
        .into(),
      select_length:           "SELECT COUNT(*) FROM {table}".into(),
      select_question:         "SELECT question_id, question_text, answer_text, passage_text
                                FROM {table} WHERE question_id = ?1"
        .into(),
      delete_row:              "DELETE FROM {table} WHERE question_id = ?1".into(),
      select_user_by_username: "SELECT id, first_name, last_name, function_id, years_in_function
                                FROM {table} WHERE first_name = ?1 AND last_name = ?2
                                ORDER BY id"
        .into(),
      select_user_by_id:       "SELECT id, first_name, last_name, function_id, years_in_function
                                FROM {table} WHERE id = ?1"
        .into(),
    }
  }
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

/// Fill a template for `table` and `columns`.
pub fn render<S: AsRef<str>>(template: &str, table: &str, columns: &[S]) -> String {
  let column_list = columns
    .iter()
    .map(|c| quote_ident(c.as_ref()))
    .collect::<Vec<_>>()
    .join(", ");
  let placeholders = (1..=columns.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");

  template
    .replace("{table}", &quote_ident(table))
    .replace("{columns}", &column_list)
    .replace("{placeholders}", &placeholders)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_insert() {
    let sql = render(INSERT, "user", &["first_name", "last_name"]);
    assert_eq!(
      sql,
      "INSERT INTO \"user\" (\"first_name\", \"last_name\") VALUES (?1, ?2)"
    );
  }

  #[test]
  fn quote_ident_escapes_quotes() {
    assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
  }

  #[test]
  fn partial_override_keeps_defaults() {
    let json = r#"{ "SELECT_LENGTH": "SELECT COUNT(1) FROM {table}" }"#;
    let catalog: StatementCatalog = serde_json::from_str(json).unwrap();
    assert_eq!(catalog.select_length, "SELECT COUNT(1) FROM {table}");
    assert_eq!(catalog.select_all, StatementCatalog::default().select_all);
  }
}
