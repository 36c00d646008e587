use redb::TableError;
use std::fmt::Display;
use txbench::{ErrorKind, TxbenchError};

pub(crate) fn backend_error(message: &str, err: impl Display) -> TxbenchError {
    TxbenchError::new(&format!("{}: {}", message, err), ErrorKind::BackendError)
}

pub(crate) fn table_error(bucket: &str, err: TableError) -> TxbenchError {
    match err {
        TableError::TableDoesNotExist(_) => TxbenchError::new(
            &format!("Bucket {} does not exist", bucket),
            ErrorKind::BucketNotFound,
        ),
        TableError::TableExists(_) => TxbenchError::new(
            &format!("Bucket {} already exists", bucket),
            ErrorKind::BucketAlreadyExists,
        ),
        err => backend_error(&format!("Failed to open bucket {}", bucket), err),
    }
}
