use std::path::{Path, PathBuf};
use txbench::fs::DEFAULT_FILE_PERM;

/// Commit durability for write transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KvDurability {
    /// Every commit is persisted before `with_rw_tx` returns.
    #[default]
    Immediate,
    /// Commits stay in memory until a later `Immediate` commit.
    None,
}

impl KvDurability {
    pub(crate) fn to_redb(self) -> redb::Durability {
        match self {
            KvDurability::Immediate => redb::Durability::Immediate,
            KvDurability::None => redb::Durability::None,
        }
    }
}

/// Settings used to open a [`crate::KvDb`].
///
/// Usage: build one through [`crate::KvDb::with_config`] rather than by hand,
/// the builder fills in the defaults:
/// - file mode `0o660`
/// - engine default cache size
/// - `Immediate` durability
#[derive(Debug, Clone)]
pub struct KvConfig {
    db_path: PathBuf,
    file_mode: u32,
    cache_size: Option<usize>,
    durability: KvDurability,
}

impl KvConfig {
    #[inline]
    pub fn new() -> KvConfig {
        KvConfig {
            db_path: PathBuf::new(),
            file_mode: DEFAULT_FILE_PERM,
            cache_size: None,
            durability: KvDurability::default(),
        }
    }

    #[inline]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    #[inline]
    pub(crate) fn set_db_path(&mut self, db_path: &Path) {
        self.db_path = db_path.to_path_buf();
    }

    #[inline]
    pub fn file_mode(&self) -> u32 {
        self.file_mode
    }

    #[inline]
    pub(crate) fn set_file_mode(&mut self, file_mode: u32) {
        self.file_mode = file_mode;
    }

    /// Cache size in bytes, `None` keeps the engine default.
    #[inline]
    pub fn cache_size(&self) -> Option<usize> {
        self.cache_size
    }

    #[inline]
    pub(crate) fn set_cache_size(&mut self, bytes: usize) {
        self.cache_size = Some(bytes);
    }

    #[inline]
    pub fn durability(&self) -> KvDurability {
        self.durability
    }

    #[inline]
    pub(crate) fn set_durability(&mut self, durability: KvDurability) {
        self.durability = durability;
    }
}

impl Default for KvConfig {
    fn default() -> Self {
        KvConfig::new()
    }
}
