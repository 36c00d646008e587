use thiserror::Error;
use txbench::TxbenchError;

/// Errors raised while preparing or running a benchmark workload.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("database error: {0}")]
    Db(#[from] TxbenchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Config {
        name: String,
        value: String,
        reason: String,
    },
}

impl BenchError {
    pub(crate) fn config(name: &str, value: &str, reason: &str) -> Self {
        BenchError::Config {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for benchmark setup and execution.
pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;
    use txbench::ErrorKind;

    #[test]
    fn test_display_wraps_database_error() {
        let err: BenchError = TxbenchError::new("bucket01 missing", ErrorKind::BucketNotFound).into();
        assert_eq!(err.to_string(), "database error: bucket01 missing");
    }

    #[test]
    fn test_display_config_error() {
        let err = BenchError::config("TXBENCH_FIXTURE_SIZE", "abc", "not a number");
        assert_eq!(
            err.to_string(),
            "invalid value \"abc\" for TXBENCH_FIXTURE_SIZE: not a number"
        );
    }
}
