use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for txbench operations
///
/// Each kind names one category of failure so callers (tests mostly) can
/// match on what went wrong without parsing messages.
///
/// # Examples
///
/// ```rust
/// use txbench::errors::{ErrorKind, TxbenchError, TxbenchResult};
///
/// fn lookup() -> TxbenchResult<()> {
///     Err(TxbenchError::new("bucket01 does not exist", ErrorKind::BucketNotFound))
/// }
///
/// assert_eq!(lookup().unwrap_err().kind(), &ErrorKind::BucketNotFound);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // IO and filesystem errors
    /// Generic IO error
    IOError,
    /// Permission denied for a file or directory operation
    PermissionDenied,
    /// The file was not found
    FileNotFound,

    // Storage engine errors
    /// Error reported by the underlying storage engine
    BackendError,
    /// The named bucket does not exist
    BucketNotFound,
    /// A bucket with the same name already exists
    BucketAlreadyExists,
    /// The bucket name is not usable
    InvalidBucketName,

    // Transaction errors
    /// A write was attempted inside a read-only transaction
    ReadOnlyViolation,
    /// The transaction could not be started or finished
    TransactionFailed,
    /// The transaction could not be committed
    CommitFailed,

    // Harness errors
    /// Configuration value is missing or malformed
    InvalidConfiguration,
    /// A value read back does not match the fixture
    UnexpectedValue,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::BucketNotFound => write!(f, "Bucket not found"),
            ErrorKind::BucketAlreadyExists => write!(f, "Bucket already exists"),
            ErrorKind::InvalidBucketName => write!(f, "Invalid bucket name"),
            ErrorKind::ReadOnlyViolation => write!(f, "Read-only violation"),
            ErrorKind::TransactionFailed => write!(f, "Transaction failed"),
            ErrorKind::CommitFailed => write!(f, "Commit failed"),
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::UnexpectedValue => write!(f, "Unexpected value"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type shared by the database wrappers.
///
/// `TxbenchError` carries a message, a kind and an optional cause. The
/// backtrace is captured at construction and only printed by `Debug` when
/// the error has no cause (the innermost error owns the interesting trace).
#[derive(Clone)]
pub struct TxbenchError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<TxbenchError>>,
    backtrace: Backtrace,
}

impl TxbenchError {
    /// Creates a new error with the given message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        TxbenchError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new(),
        }
    }

    /// Creates a new error that wraps `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: TxbenchError) -> Self {
        TxbenchError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&TxbenchError> {
        self.cause.as_deref()
    }
}

impl Display for TxbenchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for TxbenchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}\nCaused by: {:?}", self.error_kind, self.message, cause),
            None => write!(f, "{}: {}\n{:?}", self.error_kind, self.message, self.backtrace),
        }
    }
}

impl Error for TxbenchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, TxbenchError>`.
pub type TxbenchResult<T> = Result<T, TxbenchError>;

impl From<std::io::Error> for TxbenchError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        TxbenchError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<String> for TxbenchError {
    fn from(msg: String) -> Self {
        TxbenchError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for TxbenchError {
    fn from(msg: &str) -> Self {
        TxbenchError::new(msg, ErrorKind::InternalError)
    }
}
