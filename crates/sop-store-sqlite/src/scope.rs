//! Connection scope: one transaction per unit of work.
//!
//! A [`Scope`] owns a [`tokio_rusqlite::Connection`] opened with
//! `PRAGMA foreign_keys = ON`. [`Scope::run`] executes a closure on the
//! connection thread inside a transaction that is committed when the closure
//! returns `Ok` and rolled back when it returns `Err` or unwinds.

use std::{path::Path, sync::Arc};

use rusqlite::Transaction;

use crate::{Result, catalog::StatementCatalog};

#[derive(Clone)]
pub(crate) struct Scope {
  conn:    tokio_rusqlite::Connection,
  catalog: Arc<StatementCatalog>,
}

impl Scope {
  pub(crate) async fn open(
    path:    impl AsRef<Path>,
    schema:  &'static str,
    catalog: Arc<StatementCatalog>,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, schema, catalog).await
  }

  pub(crate) async fn open_in_memory(
    schema:  &'static str,
    catalog: Arc<StatementCatalog>,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, schema, catalog).await
  }

  async fn init(
    conn:    tokio_rusqlite::Connection,
    schema:  &'static str,
    catalog: Arc<StatementCatalog>,
  ) -> Result<Self> {
    conn
      .call(move |conn| {
        conn.execute_batch(schema)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, catalog })
  }

  /// Run `work` inside one transaction.
  pub(crate) async fn run<T, F>(&self, work: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>, &StatementCatalog) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let catalog = Arc::clone(&self.catalog);
    self
      .conn
      .call(move |conn| Ok(within(conn, |tx| work(tx, &catalog))))
      .await?
  }
}

/// Commit on `Ok`; dropping the transaction on `Err` rolls it back.
pub(crate) fn within<T>(
  conn: &mut rusqlite::Connection,
  work: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction()?;
  let out = work(&tx)?;
  tx.commit()?;
  Ok(out)
}
