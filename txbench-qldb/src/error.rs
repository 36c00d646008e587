use rusqlite::ErrorCode;
use txbench::{ErrorKind, TxbenchError};

pub(crate) fn sql_error(message: &str, err: rusqlite::Error) -> TxbenchError {
    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::ReadOnly) => ErrorKind::ReadOnlyViolation,
        Some(ErrorCode::CannotOpen) => ErrorKind::FileNotFound,
        Some(ErrorCode::PermissionDenied) => ErrorKind::PermissionDenied,
        _ => ErrorKind::BackendError,
    };
    TxbenchError::new(&format!("{}: {}", message, err), kind)
}
