//! Duplicate guard.
//!
//! Neither function names nor annotations have a database-level uniqueness
//! constraint, so these checks are the only thing preventing re-insertion.
//! Both load the current contents of the table projected onto the compared
//! columns and filter the candidates in memory.

use rusqlite::{Connection, types::Value};
use tracing::debug;

use crate::{
  Result, Row,
  catalog::{StatementCatalog, render},
  introspect::check_arity,
};

/// Return `Some(value)` if `value` is absent from the first projected column
/// of `table`, `None` if it is already present.
pub fn guard_scalar<S: AsRef<str>>(
  conn:    &Connection,
  catalog: &StatementCatalog,
  table:   &str,
  columns: &[S],
  value:   &str,
) -> Result<Option<String>> {
  let existing = load_projection(conn, catalog, table, columns)?;
  let needle = Value::Text(value.to_owned());

  if existing.iter().any(|row| row.first() == Some(&needle)) {
    debug!(table, value, "scalar already present");
    Ok(None)
  } else {
    Ok(Some(value.to_owned()))
  }
}

/// Return the candidate rows whose full tuple does not already appear in
/// `table` projected onto `columns`. Comparison is positional.
///
/// Every candidate must be as wide as `columns`.
pub fn guard_rows<S: AsRef<str>>(
  conn:    &Connection,
  catalog: &StatementCatalog,
  table:   &str,
  columns: &[S],
  rows:    Vec<Row>,
) -> Result<Vec<Row>> {
  check_arity(table, columns.len(), &rows)?;
  let existing = load_projection(conn, catalog, table, columns)?;

  let candidates = rows.len();
  let fresh: Vec<Row> = rows.into_iter().filter(|row| !existing.contains(row)).collect();
  debug!(table, candidates, fresh = fresh.len(), "rows guarded");
  Ok(fresh)
}

fn load_projection<S: AsRef<str>>(
  conn:    &Connection,
  catalog: &StatementCatalog,
  table:   &str,
  columns: &[S],
) -> Result<Vec<Row>> {
  let mut stmt = conn.prepare(&render(&catalog.select_all, table, columns))?;
  let width = stmt.column_count();
  let rows = stmt
    .query_map([], |row| (0..width).map(|i| row.get::<_, Value>(i)).collect::<rusqlite::Result<Row>>())?
    .collect::<rusqlite::Result<Vec<Row>>>()?;
  Ok(rows)
}
