//! SQLite backend for the SOP annotation coordinator.
//!
//! Two stores, each on its own [`tokio_rusqlite`] connection:
//!
//! * [`SqliteStore`]: functions, annotators and annotations.
//! * [`QuestionBank`]: the live question table and its append-only backup.
//!
//! Every operation runs inside one transaction: committed when the
//! work succeeds, rolled back on any error.

mod encode;
mod lookup;
mod schema;
mod scope;

pub mod bank;
pub mod catalog;
pub mod error;
pub mod guard;
pub mod introspect;
pub mod router;
pub mod store;

pub use bank::QuestionBank;
pub use catalog::StatementCatalog;
pub use error::{Error, Result, RowArity};
pub use router::{Push, Pushed};
pub use schema::{ANNOTATION_TABLE, BACKUP_TABLE, FUNCTION_TABLE, QUESTION_TABLE, USER_TABLE};
pub use store::SqliteStore;

/// A candidate or existing row, one value per projected column.
pub type Row = Vec<rusqlite::types::Value>;

#[cfg(test)]
mod tests;
