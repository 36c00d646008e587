//! Shared pieces of the txbench workspace.
//!
//! The `kvdb` and `qldb` wrappers report failures through [`errors::TxbenchError`],
//! label their transactions with [`mode::TxMode`], and lay out their files
//! with the helpers in [`fs`].

pub mod errors;
pub mod fs;
pub mod mode;

pub use errors::{ErrorKind, TxbenchError, TxbenchResult};
pub use mode::TxMode;
