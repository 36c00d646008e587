use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use txbench::fs::DEFAULT_FILE_PERM;

/// Database file name used inside the storage directory.
pub const DEFAULT_FILE_NAME: &str = "ql.db";

/// `PRAGMA synchronous` setting of the read-write connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronous {
    Off,
    Normal,
    #[default]
    Full,
}

impl Display for Synchronous {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Synchronous::Off => write!(f, "OFF"),
            Synchronous::Normal => write!(f, "NORMAL"),
            Synchronous::Full => write!(f, "FULL"),
        }
    }
}

/// `PRAGMA journal_mode` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalMode {
    /// Rollback journal deleted at the end of each transaction.
    #[default]
    Delete,
    /// Write-ahead log.
    Wal,
}

impl Display for JournalMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalMode::Delete => write!(f, "DELETE"),
            JournalMode::Wal => write!(f, "WAL"),
        }
    }
}

/// Settings used to open a [`crate::QlDb`].
#[derive(Debug, Clone)]
pub struct QlConfig {
    dir: PathBuf,
    file_name: String,
    file_mode: u32,
    synchronous: Synchronous,
    journal_mode: JournalMode,
    busy_timeout: Duration,
    statement_cache_capacity: usize,
}

impl QlConfig {
    #[inline]
    pub fn new() -> QlConfig {
        QlConfig {
            dir: PathBuf::new(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            file_mode: DEFAULT_FILE_PERM,
            synchronous: Synchronous::default(),
            journal_mode: JournalMode::default(),
            busy_timeout: Duration::from_secs(5),
            statement_cache_capacity: 32,
        }
    }

    /// Full path of the database file.
    #[inline]
    pub fn db_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub(crate) fn set_dir(&mut self, dir: &Path) {
        self.dir = dir.to_path_buf();
    }

    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[inline]
    pub(crate) fn set_file_name(&mut self, file_name: &str) {
        self.file_name = file_name.to_string();
    }

    #[inline]
    pub fn file_mode(&self) -> u32 {
        self.file_mode
    }

    #[inline]
    pub(crate) fn set_file_mode(&mut self, file_mode: u32) {
        self.file_mode = file_mode;
    }

    #[inline]
    pub fn synchronous(&self) -> Synchronous {
        self.synchronous
    }

    #[inline]
    pub(crate) fn set_synchronous(&mut self, synchronous: Synchronous) {
        self.synchronous = synchronous;
    }

    #[inline]
    pub fn journal_mode(&self) -> JournalMode {
        self.journal_mode
    }

    #[inline]
    pub(crate) fn set_journal_mode(&mut self, journal_mode: JournalMode) {
        self.journal_mode = journal_mode;
    }

    #[inline]
    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    #[inline]
    pub(crate) fn set_busy_timeout(&mut self, busy_timeout: Duration) {
        self.busy_timeout = busy_timeout;
    }

    /// Prepared statements kept per connection.
    #[inline]
    pub fn statement_cache_capacity(&self) -> usize {
        self.statement_cache_capacity
    }

    #[inline]
    pub(crate) fn set_statement_cache_capacity(&mut self, capacity: usize) {
        self.statement_cache_capacity = capacity;
    }
}

impl Default for QlConfig {
    fn default() -> Self {
        QlConfig::new()
    }
}
