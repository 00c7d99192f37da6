//! Schema introspection: which columns an INSERT must supply.

use rusqlite::{Connection, OptionalExtension as _};

use crate::{Error, Result, RowArity, catalog::quote_ident};

/// Surrogate key names that are never supplied explicitly.
fn is_surrogate_key(column: &str) -> bool {
  column.eq_ignore_ascii_case("id") || column.eq_ignore_ascii_case("question_id")
}

/// Column names of `table` in declaration order, minus any autoincrement
/// primary key named `id` or `question_id` (case-insensitive).
pub fn get_insert_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
  let ddl: Option<String> = conn
    .query_row(
      "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
      [table],
      |row| row.get(0),
    )
    .optional()?;
  let ddl = ddl.ok_or_else(|| Error::UnknownTable(table.to_owned()))?;
  let autoincrement = ddl.to_ascii_uppercase().contains("AUTOINCREMENT");

  let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
  let columns = stmt
    .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(5)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(
    columns
      .into_iter()
      .filter(|(name, pk)| !(autoincrement && *pk > 0 && is_surrogate_key(name)))
      .map(|(name, _)| name)
      .collect(),
  )
}

/// Check that every row in `rows` has exactly as many values as `table` has
/// insert columns, and return those columns.
///
/// On failure the error lists every offending row index and its length.
pub fn validate_rows_for_table_db<T>(
  conn:  &Connection,
  table: &str,
  rows:  &[Vec<T>],
) -> Result<Vec<String>> {
  let columns = get_insert_columns(conn, table)?;
  check_arity(table, columns.len(), rows)?;
  Ok(columns)
}

pub(crate) fn check_arity<T>(table: &str, expected: usize, rows: &[Vec<T>]) -> Result<()> {
  let offending: Vec<RowArity> = rows
    .iter()
    .enumerate()
    .filter(|(_, row)| row.len() != expected)
    .map(|(index, row)| RowArity { index, len: row.len() })
    .collect();

  if offending.is_empty() {
    Ok(())
  } else {
    Err(Error::Validation { table: table.to_owned(), expected, offending })
  }
}
