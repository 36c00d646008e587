use std::fmt::{Display, Formatter};

/// Kind of transaction a wrapper opens around a caller's closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxMode {
    /// Reads only. Never commits anything.
    ReadOnly,
    /// May mutate. Committed when the closure succeeds, rolled back otherwise.
    ReadWrite,
}

impl TxMode {
    #[inline]
    pub fn is_read_only(&self) -> bool {
        matches!(self, TxMode::ReadOnly)
    }
}

impl Display for TxMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TxMode::ReadOnly => write!(f, "ro"),
            TxMode::ReadWrite => write!(f, "rw"),
        }
    }
}
