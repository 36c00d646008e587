//! Store factory functions for benchmarks

use crate::config::BenchmarkConfig;
use crate::error::BenchResult;
use kvdb::{KvDb, KvDurability};
use qldb::{QlDb, Synchronous};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use txbench::fs::{create_file_with_mode, create_temp_dir, DEFAULT_FILE_PERM, DEFAULT_PATH_PERM};

/// Prefix of every per-run directory created under the base path
pub const DIR_PREFIX: &str = "txbench-";

/// Name of the key/value database file inside its run directory
pub const KV_FILE_NAME: &str = "db";

/// A uniquely named directory that is removed when dropped, unless the
/// configuration asked to keep it.
pub struct BenchDir {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl BenchDir {
    pub fn create(config: &BenchmarkConfig) -> BenchResult<BenchDir> {
        let dir = create_temp_dir(&config.base_path, DIR_PREFIX, DEFAULT_PATH_PERM)?;
        let path = dir.path().to_path_buf();
        Ok(BenchDir {
            dir: Some(dir),
            path,
            keep: config.keep_dirs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BenchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if self.keep {
                let path = dir.keep();
                log::info!("Keeping benchmark directory {}", path.display());
            } else if let Err(err) = dir.close() {
                log::error!(
                    "Failed to remove benchmark directory {}: {}",
                    self.path.display(),
                    err
                );
            }
        }
    }
}

/// A key/value database and the directory holding it
pub struct KvContext {
    // dropped before `dir` so the file is closed when the directory goes
    db: KvDb,
    dir: BenchDir,
}

impl KvContext {
    pub fn db(&self) -> &KvDb {
        &self.db
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// An SQL database and the directory holding it
pub struct QlContext {
    db: QlDb,
    dir: BenchDir,
}

impl QlContext {
    pub fn db(&self) -> &QlDb {
        &self.db
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Create a redb-backed key/value database in a fresh directory.
///
/// The file is created empty with the default file mode first, and one
/// empty write transaction runs before the database is handed out.
pub fn create_kv_db(config: &BenchmarkConfig) -> BenchResult<KvContext> {
    let dir = BenchDir::create(config)?;
    let db_path = dir.path().join(KV_FILE_NAME);
    drop(create_file_with_mode(&db_path, DEFAULT_FILE_PERM)?);

    let durability = if config.durable {
        KvDurability::Immediate
    } else {
        KvDurability::None
    };
    let db = KvDb::with_config()
        .db_path(&db_path)
        .file_mode(DEFAULT_FILE_PERM)
        .durability(durability)
        .open()?;
    db.with_rw_tx(|_| Ok(()))?;

    Ok(KvContext { db, dir })
}

/// Create an SQLite-backed database in a fresh directory
pub fn create_ql_db(config: &BenchmarkConfig) -> BenchResult<QlContext> {
    let dir = BenchDir::create(config)?;

    let synchronous = if config.durable {
        Synchronous::Full
    } else {
        Synchronous::Off
    };
    let db = QlDb::with_config()
        .dir(dir.path())
        .file_mode(DEFAULT_FILE_PERM)
        .synchronous(synchronous)
        .open()?;

    Ok(QlContext { db, dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(base: &Path) -> BenchmarkConfig {
        BenchmarkConfig {
            base_path: base.to_path_buf(),
            ..BenchmarkConfig::quick()
        }
    }

    #[test]
    fn test_bench_dir_is_removed_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let dir = BenchDir::create(&config_in(base.path())).unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(DIR_PREFIX));

        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn test_bench_dir_is_kept_on_request() {
        let base = tempfile::tempdir().unwrap();
        let config = BenchmarkConfig {
            keep_dirs: true,
            ..config_in(base.path())
        };
        let dir = BenchDir::create(&config).unwrap();
        let path = dir.path().to_path_buf();

        drop(dir);
        assert!(path.is_dir());
    }

    #[test]
    fn test_bench_dirs_are_unique() {
        let base = tempfile::tempdir().unwrap();
        let config = config_in(base.path());
        let first = BenchDir::create(&config).unwrap();
        let second = BenchDir::create(&config).unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn test_create_kv_db_creates_file() {
        let base = tempfile::tempdir().unwrap();
        let ctx = create_kv_db(&config_in(base.path())).unwrap();
        assert!(ctx.dir().join(KV_FILE_NAME).is_file());
        assert_eq!(ctx.db().path(), ctx.dir().join(KV_FILE_NAME));
        assert_eq!(
            ctx.db().config().durability(),
            KvDurability::None
        );
    }

    #[test]
    fn test_create_ql_db_respects_durability() {
        let base = tempfile::tempdir().unwrap();
        let config = BenchmarkConfig {
            durable: true,
            ..config_in(base.path())
        };
        let ctx = create_ql_db(&config).unwrap();
        assert_eq!(ctx.db().config().synchronous(), Synchronous::Full);
        assert!(ctx.db().config().db_path().is_file());
    }

    #[test]
    fn test_contexts_clean_up_their_directories() {
        let base = tempfile::tempdir().unwrap();
        let config = config_in(base.path());

        let kv = create_kv_db(&config).unwrap();
        let ql = create_ql_db(&config).unwrap();
        let kv_dir = kv.dir().to_path_buf();
        let ql_dir = ql.dir().to_path_buf();

        drop(kv);
        drop(ql);
        assert!(!kv_dir.exists());
        assert!(!ql_dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use txbench::fs::mode_of;

        let base = tempfile::tempdir().unwrap();
        let config = config_in(base.path());

        let kv = create_kv_db(&config).unwrap();
        assert_eq!(mode_of(kv.dir()).unwrap(), DEFAULT_PATH_PERM);
        assert_eq!(
            mode_of(&kv.dir().join(KV_FILE_NAME)).unwrap(),
            DEFAULT_FILE_PERM
        );

        let ql = create_ql_db(&config).unwrap();
        assert_eq!(mode_of(ql.dir()).unwrap(), DEFAULT_PATH_PERM);
        assert_eq!(
            mode_of(&ql.db().config().db_path()).unwrap(),
            DEFAULT_FILE_PERM
        );
    }
}
