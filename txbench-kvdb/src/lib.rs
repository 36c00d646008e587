//! Key-value database handle with named buckets and closure-scoped
//! transactions, backed by redb.
//!
//! Buckets map onto redb tables keyed and valued by byte strings. Every read
//! or write happens inside [`KvDb::with_ro_tx`] or [`KvDb::with_rw_tx`].

mod config;
mod db;
mod error;
mod tx;

pub use config::*;
pub use db::*;
pub use tx::{Bucket, BucketMut, ReadTx, WriteTx};

/// Result type of every `kvdb` operation.
pub type KvResult<T> = txbench::TxbenchResult<T>;
