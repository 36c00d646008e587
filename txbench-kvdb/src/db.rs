use crate::config::{KvConfig, KvDurability};
use crate::error::backend_error;
use crate::tx::{ReadTx, WriteTx};
use crate::KvResult;
use redb::{Database, ReadableDatabase};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use txbench::fs::create_file_with_mode;
use txbench::{ErrorKind, TxMode, TxbenchError};

/// Handle to a single-file key-value database.
///
/// `KvDb` owns the open engine handle and scopes every access in a
/// transaction: the caller passes a closure, the handle begins the
/// transaction, runs the closure, and commits or rolls back based on what the
/// closure returned.
///
/// # Examples
///
/// ```rust,no_run
/// use kvdb::KvDb;
///
/// # fn main() -> txbench::TxbenchResult<()> {
/// let db = KvDb::new("/tmp/bench/db", 0o660)?;
/// db.with_rw_tx(|tx| {
///     let mut bucket = tx.create_bucket("bucket01")?;
///     bucket.put(b"key1", b"value1")
/// })?;
///
/// let value = db.with_ro_tx(|tx| match tx.bucket("bucket01")? {
///     Some(bucket) => bucket.get(b"key1"),
///     None => Ok(None),
/// })?;
/// assert_eq!(value.as_deref(), Some(&b"value1"[..]));
/// # Ok(())
/// # }
/// ```
pub struct KvDb {
    db: Database,
    config: KvConfig,
}

impl KvDb {
    /// Opens the database file at `path`, creating it with `file_mode` if it
    /// does not exist. An existing empty file is initialized as a new database.
    pub fn new<P: AsRef<Path>>(path: P, file_mode: u32) -> KvResult<KvDb> {
        KvDb::with_config()
            .db_path(path.as_ref())
            .file_mode(file_mode)
            .open()
    }

    /// Creates a builder for configuring the handle before opening it.
    #[inline]
    pub fn with_config() -> KvDbBuilder {
        KvDbBuilder::new()
    }

    fn open(config: KvConfig) -> KvResult<KvDb> {
        if config.db_path().as_os_str().is_empty() {
            return Err(TxbenchError::new(
                "Database path is not set",
                ErrorKind::InvalidConfiguration,
            ));
        }

        let file = create_file_with_mode(config.db_path(), config.file_mode()).map_err(|err| {
            log::error!(
                "Failed to create database file {}: {}",
                config.db_path().display(),
                err
            );
            TxbenchError::from(err)
        })?;

        let mut builder = Database::builder();
        if let Some(bytes) = config.cache_size() {
            builder.set_cache_size(bytes);
        }
        let db = builder.create_file(file).map_err(|err| {
            log::error!(
                "Failed to open database {}: {}",
                config.db_path().display(),
                err
            );
            backend_error(
                &format!("Failed to open database {}", config.db_path().display()),
                err,
            )
        })?;

        log::debug!("Opened key-value database {}", config.db_path().display());
        Ok(KvDb { db, config })
    }

    pub fn path(&self) -> &Path {
        self.config.db_path()
    }

    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    /// Runs `func` inside a read-write transaction. Same as [`KvDb::with_rw_tx`].
    #[inline]
    pub fn with_tx<F, R>(&self, func: F) -> KvResult<R>
    where
        F: FnOnce(&WriteTx) -> KvResult<R>,
    {
        self.with_rw_tx(func)
    }

    /// Runs `func` inside a read-only transaction.
    ///
    /// The transaction is closed before this returns, whatever `func`
    /// returned. An error from `func` wins over an error from closing; closing
    /// fails when a bucket handle returned by `func` still holds the snapshot.
    pub fn with_ro_tx<F, R>(&self, func: F) -> KvResult<R>
    where
        F: FnOnce(&ReadTx) -> KvResult<R>,
    {
        log::trace!("Beginning {} transaction", TxMode::ReadOnly);
        let txn = self.db.begin_read().map_err(|err| {
            TxbenchError::new_with_cause(
                "Failed to begin read transaction",
                ErrorKind::TransactionFailed,
                backend_error("Failed to begin read transaction", err),
            )
        })?;
        let tx = ReadTx::new(txn);
        let result = func(&tx);
        let closed = tx.into_inner().close().map_err(|err| {
            TxbenchError::new_with_cause(
                "Failed to close read transaction",
                ErrorKind::TransactionFailed,
                backend_error("Failed to close read transaction", err),
            )
        });

        let value = result?;
        closed?;
        Ok(value)
    }

    /// Runs `func` inside a read-write transaction.
    ///
    /// Commits when `func` returns `Ok`. When it returns `Err` the transaction
    /// is aborted and that error is returned; a failure to abort is logged.
    pub fn with_rw_tx<F, R>(&self, func: F) -> KvResult<R>
    where
        F: FnOnce(&WriteTx) -> KvResult<R>,
    {
        log::trace!("Beginning {} transaction", TxMode::ReadWrite);
        let mut txn = self.db.begin_write().map_err(|err| {
            TxbenchError::new_with_cause(
                "Failed to begin write transaction",
                ErrorKind::TransactionFailed,
                backend_error("Failed to begin write transaction", err),
            )
        })?;
        if self.config.durability() != KvDurability::Immediate {
            txn.set_durability(self.config.durability().to_redb())
                .map_err(|err| backend_error("Failed to set durability", err))?;
        }

        let tx = WriteTx::new(txn);
        match func(&tx) {
            Ok(result) => {
                tx.into_inner().commit().map_err(|err| {
                    TxbenchError::new_with_cause(
                        "Failed to commit write transaction",
                        ErrorKind::CommitFailed,
                        backend_error("Failed to commit write transaction", err),
                    )
                })?;
                Ok(result)
            }
            Err(err) => {
                if let Err(abort_err) = tx.into_inner().abort() {
                    log::error!("Failed to abort write transaction: {}", abort_err);
                }
                Err(err)
            }
        }
    }
}

impl Debug for KvDb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvDb")
            .field("path", &self.config.db_path())
            .finish()
    }
}

impl Drop for KvDb {
    fn drop(&mut self) {
        log::debug!("Closing key-value database {}", self.config.db_path().display());
    }
}

/// Builder for [`KvDb`].
pub struct KvDbBuilder {
    config: KvConfig,
}

impl KvDbBuilder {
    #[inline]
    pub fn new() -> KvDbBuilder {
        KvDbBuilder {
            config: KvConfig::new(),
        }
    }

    /// Sets the database file path. Required.
    #[inline]
    pub fn db_path<P: AsRef<Path>>(mut self, db_path: P) -> Self {
        self.config.set_db_path(db_path.as_ref());
        self
    }

    /// Sets the permission mode used when the file is created.
    #[inline]
    pub fn file_mode(mut self, file_mode: u32) -> Self {
        self.config.set_file_mode(file_mode);
        self
    }

    /// Sets the engine page cache size in bytes.
    #[inline]
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config.set_cache_size(bytes);
        self
    }

    #[inline]
    pub fn durability(mut self, durability: KvDurability) -> Self {
        self.config.set_durability(durability);
        self
    }

    #[inline]
    pub fn build(self) -> KvConfig {
        self.config
    }

    /// Opens the database described by this builder.
    pub fn open(self) -> KvResult<KvDb> {
        KvDb::open(self.config)
    }
}

impl Default for KvDbBuilder {
    fn default() -> Self {
        KvDbBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    fn open_temp() -> (TempDir, KvDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = KvDb::new(dir.path().join("db"), 0o660).unwrap();
        (dir, db)
    }

    #[test]
    fn test_builder_sets_config() {
        let config = KvDb::with_config()
            .db_path("some/db")
            .file_mode(0o600)
            .cache_size(1024 * 1024)
            .durability(KvDurability::None)
            .build();

        assert_eq!(config.db_path(), Path::new("some/db"));
        assert_eq!(config.file_mode(), 0o600);
        assert_eq!(config.cache_size(), Some(1024 * 1024));
        assert_eq!(config.durability(), KvDurability::None);
    }

    #[test]
    fn test_open_without_path_fails() {
        let err = KvDb::with_config().open().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn test_open_initializes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        std::fs::File::create(&path).unwrap();

        let db = KvDb::new(&path, 0o660).unwrap();
        db.with_rw_tx(|_| Ok(())).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_open_applies_file_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let _db = KvDb::new(&path, 0o660).unwrap();
        assert_eq!(txbench::fs::mode_of(&path).unwrap(), 0o660);
    }

    #[test]
    fn test_empty_transactions_succeed() {
        let (_dir, db) = open_temp();
        db.with_rw_tx(|_| Ok(())).unwrap();
        db.with_ro_tx(|_| Ok(())).unwrap();
        db.with_tx(|_| Ok(())).unwrap();
    }

    #[test]
    fn test_rw_commit_is_visible_to_ro() {
        let (_dir, db) = open_temp();
        db.with_rw_tx(|tx| {
            let mut bucket = tx.create_bucket("bucket01")?;
            bucket.put(b"key500", b"value500")
        })
        .unwrap();

        let value = db
            .with_ro_tx(|tx| {
                let bucket = tx.bucket("bucket01")?.expect("bucket01 exists");
                bucket.get(b"key500")
            })
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"value500"[..]));
    }

    #[test]
    fn test_rw_error_rolls_back() {
        let (_dir, db) = open_temp();
        let result: KvResult<()> = db.with_rw_tx(|tx| {
            let mut bucket = tx.create_bucket("bucket01")?;
            bucket.put(b"key1", b"value1")?;
            Err(TxbenchError::new("stop", ErrorKind::InternalError))
        });
        assert_eq!(result.unwrap_err().message(), "stop");

        let exists = db.with_ro_tx(|tx| Ok(tx.bucket("bucket01")?.is_some())).unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_ro_error_is_returned() {
        let (_dir, db) = open_temp();
        let result: KvResult<()> =
            db.with_ro_tx(|_| Err(TxbenchError::new("nope", ErrorKind::UnexpectedValue)));
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::UnexpectedValue);
    }

    #[test]
    fn test_ro_close_fails_while_bucket_escapes() {
        let (_dir, db) = open_temp();
        db.with_rw_tx(|tx| tx.create_bucket("bucket01").map(|_| ()))
            .unwrap();

        let err = db.with_ro_tx(|tx| tx.bucket("bucket01")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TransactionFailed);
        assert_eq!(err.message(), "Failed to close read transaction");

        // the snapshot is released once the bucket goes away
        assert!(db.with_ro_tx(|tx| Ok(tx.bucket("bucket01")?.is_some())).unwrap());
    }

    #[test]
    fn test_create_bucket_twice_fails() {
        let (_dir, db) = open_temp();
        db.with_rw_tx(|tx| tx.create_bucket("bucket01").map(|_| ()))
            .unwrap();

        let err = db
            .with_rw_tx(|tx| tx.create_bucket("bucket01").map(|_| ()))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::BucketAlreadyExists);

        db.with_rw_tx(|tx| tx.create_bucket_if_not_exists("bucket01").map(|_| ()))
            .unwrap();
    }

    #[test]
    fn test_empty_bucket_name_is_rejected() {
        let (_dir, db) = open_temp();
        let err = db
            .with_rw_tx(|tx| tx.create_bucket("").map(|_| ()))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidBucketName);

        let err = db.with_ro_tx(|tx| tx.bucket("").map(|_| ())).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidBucketName);
    }

    #[test]
    fn test_missing_bucket_is_none() {
        let (_dir, db) = open_temp();
        assert!(db.with_ro_tx(|tx| Ok(tx.bucket("nope")?.is_none())).unwrap());
        assert!(db.with_rw_tx(|tx| Ok(tx.bucket("nope")?.is_none())).unwrap());
    }

    #[test]
    fn test_bucket_put_get_delete_len() {
        let (_dir, db) = open_temp();
        db.with_rw_tx(|tx| {
            let mut bucket = tx.create_bucket("bucket01")?;
            assert!(bucket.is_empty()?);
            for i in 0..10 {
                bucket.put(format!("key{}", i).as_bytes(), format!("value{}", i).as_bytes())?;
            }
            assert_eq!(bucket.len()?, 10);
            assert_eq!(bucket.get(b"key3")?.as_deref(), Some(&b"value3"[..]));
            assert!(bucket.delete(b"key3")?);
            assert!(!bucket.delete(b"key3")?);
            assert_eq!(bucket.name(), "bucket01");
            Ok(())
        })
        .unwrap();

        let (len, missing) = db
            .with_ro_tx(|tx| {
                let bucket = tx.bucket("bucket01")?.expect("bucket01 exists");
                Ok((bucket.len()?, bucket.get(b"key3")?))
            })
            .unwrap();
        assert_eq!(len, 9);
        assert!(missing.is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let (_dir, db) = open_temp();
        db.with_rw_tx(|tx| {
            let mut bucket = tx.create_bucket("bucket01")?;
            bucket.put(b"k", b"one")?;
            bucket.put(b"k", b"two")
        })
        .unwrap();
        let value = db
            .with_ro_tx(|tx| tx.bucket("bucket01")?.expect("bucket01 exists").get(b"k"))
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"two"[..]));
    }

    #[test]
    fn test_delete_and_list_buckets() {
        let (_dir, db) = open_temp();
        db.with_rw_tx(|tx| {
            tx.create_bucket("a")?;
            tx.create_bucket("b")?;
            Ok(())
        })
        .unwrap();

        let mut names = db.with_ro_tx(|tx| tx.bucket_names()).unwrap();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);

        assert!(db.with_rw_tx(|tx| tx.delete_bucket("a")).unwrap());
        assert!(!db.with_rw_tx(|tx| tx.delete_bucket("a")).unwrap());
        assert_eq!(db.with_rw_tx(|tx| tx.bucket_names()).unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let db = KvDb::new(&path, 0o660).unwrap();
            db.with_rw_tx(|tx| tx.create_bucket("bucket01")?.put(b"k", b"v"))
                .unwrap();
        }
        let db = KvDb::new(&path, 0o660).unwrap();
        let value = db
            .with_ro_tx(|tx| tx.bucket("bucket01")?.expect("bucket01 exists").get(b"k"))
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn test_non_durable_commits_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let db = KvDb::with_config()
            .db_path(dir.path().join("db"))
            .durability(KvDurability::None)
            .open()
            .unwrap();
        db.with_rw_tx(|tx| tx.create_bucket("bucket01")?.put(b"k", b"v"))
            .unwrap();
        let value = db
            .with_ro_tx(|tx| tx.bucket("bucket01")?.expect("bucket01 exists").get(b"k"))
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"v"[..]));
    }
}
