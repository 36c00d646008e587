use crate::error::{backend_error, table_error};
use crate::KvResult;
use redb::{
    ReadOnlyTable, ReadTransaction, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
    TableError, TableHandle, WriteTransaction,
};
use txbench::{ErrorKind, TxbenchError};

type BucketDefinition<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

fn definition(name: &str) -> KvResult<BucketDefinition<'_>> {
    if name.is_empty() {
        return Err(TxbenchError::new(
            "Bucket name must not be empty",
            ErrorKind::InvalidBucketName,
        ));
    }
    Ok(TableDefinition::new(name))
}

/// Read-only view handed to [`crate::KvDb::with_ro_tx`] closures.
///
/// Sees a snapshot of everything committed before the transaction began.
pub struct ReadTx {
    txn: ReadTransaction,
}

impl ReadTx {
    pub(crate) fn new(txn: ReadTransaction) -> Self {
        ReadTx { txn }
    }

    pub(crate) fn into_inner(self) -> ReadTransaction {
        self.txn
    }

    /// Returns the bucket called `name`, or `None` when it was never created.
    pub fn bucket(&self, name: &str) -> KvResult<Option<Bucket>> {
        match self.txn.open_table(definition(name)?) {
            Ok(table) => Ok(Some(Bucket {
                name: name.to_string(),
                table,
            })),
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(err) => Err(table_error(name, err)),
        }
    }

    pub fn bucket_names(&self) -> KvResult<Vec<String>> {
        let tables = self
            .txn
            .list_tables()
            .map_err(|err| backend_error("Failed to list buckets", err))?;
        Ok(tables.map(|handle| handle.name().to_string()).collect())
    }
}

/// Read-write view handed to [`crate::KvDb::with_rw_tx`] closures.
///
/// Everything done through it becomes visible atomically when the closure
/// returns `Ok`, and is discarded when it returns `Err`.
pub struct WriteTx {
    txn: WriteTransaction,
}

impl WriteTx {
    pub(crate) fn new(txn: WriteTransaction) -> Self {
        WriteTx { txn }
    }

    pub(crate) fn into_inner(self) -> WriteTransaction {
        self.txn
    }

    /// Creates a new bucket. Fails with `BucketAlreadyExists` if `name` is taken.
    pub fn create_bucket(&self, name: &str) -> KvResult<BucketMut<'_>> {
        if self.has_bucket(name)? {
            return Err(TxbenchError::new(
                &format!("Bucket {} already exists", name),
                ErrorKind::BucketAlreadyExists,
            ));
        }
        self.open(name)
    }

    pub fn create_bucket_if_not_exists(&self, name: &str) -> KvResult<BucketMut<'_>> {
        self.open(name)
    }

    /// Returns the bucket called `name` for writing, or `None` when absent.
    pub fn bucket(&self, name: &str) -> KvResult<Option<BucketMut<'_>>> {
        if !self.has_bucket(name)? {
            return Ok(None);
        }
        self.open(name).map(Some)
    }

    /// Deletes a bucket and everything in it. Returns whether it existed.
    pub fn delete_bucket(&self, name: &str) -> KvResult<bool> {
        self.txn
            .delete_table(definition(name)?)
            .map_err(|err| table_error(name, err))
    }

    pub fn bucket_names(&self) -> KvResult<Vec<String>> {
        let tables = self
            .txn
            .list_tables()
            .map_err(|err| backend_error("Failed to list buckets", err))?;
        Ok(tables.map(|handle| handle.name().to_string()).collect())
    }

    fn has_bucket(&self, name: &str) -> KvResult<bool> {
        definition(name)?;
        let mut tables = self
            .txn
            .list_tables()
            .map_err(|err| backend_error("Failed to list buckets", err))?;
        Ok(tables.any(|handle| handle.name() == name))
    }

    fn open(&self, name: &str) -> KvResult<BucketMut<'_>> {
        let table = self
            .txn
            .open_table(definition(name)?)
            .map_err(|err| table_error(name, err))?;
        Ok(BucketMut {
            name: name.to_string(),
            table,
        })
    }
}

/// A bucket opened inside a read-only transaction.
#[derive(Debug)]
pub struct Bucket {
    name: String,
    table: ReadOnlyTable<&'static [u8], &'static [u8]>,
}

impl Bucket {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copies out the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        let value = self
            .table
            .get(key)
            .map_err(|err| backend_error(&format!("Failed to read from bucket {}", self.name), err))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    pub fn len(&self) -> KvResult<u64> {
        self.table
            .len()
            .map_err(|err| backend_error(&format!("Failed to count bucket {}", self.name), err))
    }

    pub fn is_empty(&self) -> KvResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// A bucket opened inside a read-write transaction.
///
/// Only one handle per bucket may be open at a time within a transaction.
pub struct BucketMut<'tx> {
    name: String,
    table: Table<'tx, &'static [u8], &'static [u8]>,
}

impl BucketMut<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.table
            .insert(key, value)
            .map_err(|err| backend_error(&format!("Failed to write to bucket {}", self.name), err))?;
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        let value = self
            .table
            .get(key)
            .map_err(|err| backend_error(&format!("Failed to read from bucket {}", self.name), err))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    /// Removes `key`. Returns whether it was present.
    pub fn delete(&mut self, key: &[u8]) -> KvResult<bool> {
        let removed = self
            .table
            .remove(key)
            .map_err(|err| backend_error(&format!("Failed to delete from bucket {}", self.name), err))?;
        Ok(removed.is_some())
    }

    pub fn len(&self) -> KvResult<u64> {
        self.table
            .len()
            .map_err(|err| backend_error(&format!("Failed to count bucket {}", self.name), err))
    }

    pub fn is_empty(&self) -> KvResult<bool> {
        Ok(self.len()? == 0)
    }
}
