//! SQL database handle with closure-scoped transactions, backed by SQLite.
//!
//! Every statement runs inside [`QlDb::with_ro_tx`] or [`QlDb::with_rw_tx`];
//! the handle begins the transaction and commits or rolls back based on the
//! closure's result.

mod config;
mod db;
mod error;
mod tx;

pub use config::*;
pub use db::*;
pub use tx::{SqlRow, SqlTx};

/// Bound on the parameters of [`SqlTx::execute`] and the query methods.
pub use rusqlite::Params;

/// Result type of every `qldb` operation.
pub type QlResult<T> = txbench::TxbenchResult<T>;
