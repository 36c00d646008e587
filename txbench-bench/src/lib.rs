//! Transaction Benchmark Library
//!
//! Measures the fixed cost of one transaction on an SQLite-backed database
//! (`qldb`) and on a redb-backed key/value store (`kvdb`), for empty and
//! populated read-only and read-write transactions.

pub mod config;
pub mod error;
pub mod fixtures;
pub mod stores;
pub mod workloads;

pub use config::BenchmarkConfig;
pub use error::{BenchError, BenchResult};
pub use workloads::{prepare, Backend, LazyWorkload, Scenario, TxWorkload};
