use crate::config::{JournalMode, QlConfig, Synchronous};
use crate::error::sql_error;
use crate::tx::SqlTx;
use crate::QlResult;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::time::Duration;
use txbench::fs::{create_dir_with_mode, create_file_with_mode, DEFAULT_PATH_PERM};
use txbench::{ErrorKind, TxMode, TxbenchError};

/// Handle to an embedded SQL database stored in a directory.
///
/// Two connections are kept open: a read-write one used by
/// [`QlDb::with_rw_tx`] and one opened with `SQLITE_OPEN_READ_ONLY` used by
/// [`QlDb::with_ro_tx`], so read-only transactions are enforced by the engine
/// itself. Each connection is guarded by its own mutex; callers from several
/// threads are serialized per connection.
///
/// # Examples
///
/// ```rust,no_run
/// use qldb::QlDb;
///
/// # fn main() -> txbench::TxbenchResult<()> {
/// let db = QlDb::new("/tmp/bench")?;
/// db.with_rw_tx(|tx| {
///     tx.execute_batch("CREATE TABLE IF NOT EXISTS table01 (key TEXT, value TEXT);")?;
///     tx.execute("INSERT INTO table01 VALUES (?1, ?2)", ("key1", "value1"))?;
///     Ok(())
/// })?;
///
/// let values = db.with_ro_tx(|tx| {
///     tx.query("SELECT value FROM table01 WHERE key = ?1", ["key1"], |row| row.get::<String>(0))
/// })?;
/// assert_eq!(values, vec!["value1".to_string()]);
/// # Ok(())
/// # }
/// ```
pub struct QlDb {
    rw: Mutex<Connection>,
    ro: Mutex<Connection>,
    config: QlConfig,
}

impl QlDb {
    /// Opens (or creates) the database stored in `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> QlResult<QlDb> {
        QlDb::with_config().dir(dir).open()
    }

    #[inline]
    pub fn with_config() -> QlDbBuilder {
        QlDbBuilder::new()
    }

    fn open(config: QlConfig) -> QlResult<QlDb> {
        if config.dir().as_os_str().is_empty() {
            return Err(TxbenchError::new(
                "Database directory is not set",
                ErrorKind::InvalidConfiguration,
            ));
        }
        if !config.dir().exists() {
            create_dir_with_mode(config.dir(), DEFAULT_PATH_PERM)?;
        }

        let db_path = config.db_path();
        // create the file up front so it gets our mode instead of sqlite's default
        drop(create_file_with_mode(&db_path, config.file_mode())?);

        let rw = Connection::open(&db_path).map_err(|err| {
            log::error!("Failed to open database {}: {}", db_path.display(), err);
            sql_error(&format!("Failed to open database {}", db_path.display()), err)
        })?;
        configure_rw(&rw, &config)?;

        let ro = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| {
            sql_error(
                &format!("Failed to open read-only connection {}", db_path.display()),
                err,
            )
        })?;
        configure_common(&ro, &config)?;

        log::debug!("Opened SQL database {}", db_path.display());
        Ok(QlDb {
            rw: Mutex::new(rw),
            ro: Mutex::new(ro),
            config,
        })
    }

    pub fn config(&self) -> &QlConfig {
        &self.config
    }

    /// Runs `func` inside a read-write transaction. Same as [`QlDb::with_rw_tx`].
    #[inline]
    pub fn with_tx<F, R>(&self, func: F) -> QlResult<R>
    where
        F: FnOnce(&SqlTx<'_>) -> QlResult<R>,
    {
        self.with_rw_tx(func)
    }

    /// Runs `func` inside a read-only transaction.
    ///
    /// The transaction is always rolled back. Any write attempted by `func`
    /// fails with `ReadOnlyViolation`.
    pub fn with_ro_tx<F, R>(&self, func: F) -> QlResult<R>
    where
        F: FnOnce(&SqlTx<'_>) -> QlResult<R>,
    {
        let mut conn = self.ro.lock();
        log::trace!("Beginning {} transaction", TxMode::ReadOnly);
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(|err| tx_error("Failed to begin read transaction", err))?;

        let result = func(&SqlTx::new(&tx, TxMode::ReadOnly));
        let finished = tx
            .rollback()
            .map_err(|err| tx_error("Failed to finish read transaction", err));

        let value = result?;
        finished?;
        Ok(value)
    }

    /// Runs `func` inside a read-write transaction.
    ///
    /// The write lock is taken when the transaction begins. Commits when
    /// `func` returns `Ok`; rolls back and returns the error otherwise.
    pub fn with_rw_tx<F, R>(&self, func: F) -> QlResult<R>
    where
        F: FnOnce(&SqlTx<'_>) -> QlResult<R>,
    {
        let mut conn = self.rw.lock();
        log::trace!("Beginning {} transaction", TxMode::ReadWrite);
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| tx_error("Failed to begin write transaction", err))?;

        match func(&SqlTx::new(&tx, TxMode::ReadWrite)) {
            Ok(value) => {
                tx.commit().map_err(|err| {
                    TxbenchError::new_with_cause(
                        "Failed to commit write transaction",
                        ErrorKind::CommitFailed,
                        sql_error("Failed to commit write transaction", err),
                    )
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::error!("Failed to roll back write transaction: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}

fn tx_error(message: &str, err: rusqlite::Error) -> TxbenchError {
    TxbenchError::new_with_cause(message, ErrorKind::TransactionFailed, sql_error(message, err))
}

fn configure_common(conn: &Connection, config: &QlConfig) -> QlResult<()> {
    conn.busy_timeout(config.busy_timeout())
        .map_err(|err| sql_error("Failed to set busy timeout", err))?;
    conn.set_prepared_statement_cache_capacity(config.statement_cache_capacity());
    Ok(())
}

fn configure_rw(conn: &Connection, config: &QlConfig) -> QlResult<()> {
    configure_common(conn, config)?;
    conn.pragma_update(None, "synchronous", config.synchronous().to_string())
        .map_err(|err| sql_error("Failed to set synchronous", err))?;

    let mode: String = conn
        .pragma_update_and_check(
            None,
            "journal_mode",
            config.journal_mode().to_string(),
            |row| row.get(0),
        )
        .map_err(|err| sql_error("Failed to set journal mode", err))?;
    if !mode.eq_ignore_ascii_case(&config.journal_mode().to_string()) {
        log::warn!(
            "Requested journal mode {} but database uses {}",
            config.journal_mode(),
            mode
        );
    }
    Ok(())
}

impl Debug for QlDb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QlDb")
            .field("path", &self.config.db_path())
            .finish()
    }
}

impl Drop for QlDb {
    fn drop(&mut self) {
        log::debug!("Closing SQL database {}", self.config.db_path().display());
    }
}

/// Builder for [`QlDb`].
pub struct QlDbBuilder {
    config: QlConfig,
}

impl QlDbBuilder {
    #[inline]
    pub fn new() -> QlDbBuilder {
        QlDbBuilder {
            config: QlConfig::new(),
        }
    }

    /// Sets the storage directory. Required; created when missing.
    #[inline]
    pub fn dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.config.set_dir(dir.as_ref());
        self
    }

    #[inline]
    pub fn file_name(mut self, file_name: &str) -> Self {
        self.config.set_file_name(file_name);
        self
    }

    #[inline]
    pub fn file_mode(mut self, file_mode: u32) -> Self {
        self.config.set_file_mode(file_mode);
        self
    }

    #[inline]
    pub fn synchronous(mut self, synchronous: Synchronous) -> Self {
        self.config.set_synchronous(synchronous);
        self
    }

    #[inline]
    pub fn journal_mode(mut self, journal_mode: JournalMode) -> Self {
        self.config.set_journal_mode(journal_mode);
        self
    }

    #[inline]
    pub fn busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.config.set_busy_timeout(busy_timeout);
        self
    }

    #[inline]
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.config.set_statement_cache_capacity(capacity);
        self
    }

    #[inline]
    pub fn build(self) -> QlConfig {
        self.config
    }

    pub fn open(self) -> QlResult<QlDb> {
        QlDb::open(self.config)
    }
}

impl Default for QlDbBuilder {
    fn default() -> Self {
        QlDbBuilder::new()
    }
}
