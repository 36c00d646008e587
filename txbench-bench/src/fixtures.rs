//! Fixture data loaded before the timed loops, and the spot checks run inside them

use kvdb::{BucketMut, ReadTx, WriteTx};
use qldb::SqlTx;
use txbench::{ErrorKind, TxbenchError, TxbenchResult};

pub const TABLE_NAME: &str = "table01";
pub const BUCKET_NAME: &str = "bucket01";

pub const QL_SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS table01 (key TEXT, value TEXT);",
    "CREATE UNIQUE INDEX IF NOT EXISTS keyidx ON table01 (key);",
];
pub const QL_INSERT: &str = "INSERT INTO table01 VALUES (?1, ?2)";
pub const QL_SELECT_BY_KEY: &str = "SELECT key, value FROM table01 WHERE key = ?1";

pub fn fixture_key(i: u64) -> String {
    format!("key{}", i)
}

pub fn fixture_value(i: u64) -> String {
    format!("value{}", i)
}

pub fn create_ql_schema(tx: &SqlTx<'_>) -> TxbenchResult<()> {
    for stmt in QL_SCHEMA {
        tx.execute(stmt, [])?;
    }
    Ok(())
}

pub fn insert_ql_row(tx: &SqlTx<'_>, i: u64) -> TxbenchResult<()> {
    tx.execute(QL_INSERT, (fixture_key(i), fixture_value(i)))?;
    Ok(())
}

/// Creates the schema and inserts `count` rows.
pub fn populate_ql(tx: &SqlTx<'_>, count: usize) -> TxbenchResult<()> {
    create_ql_schema(tx)?;
    for i in 0..count as u64 {
        insert_ql_row(tx, i)?;
    }
    log::debug!("Loaded {} rows into {}", count, TABLE_NAME);
    Ok(())
}

/// Looks `key` up and checks every returned row carries `expected`.
///
/// Returns the number of matching rows; zero rows is an error too.
pub fn probe_ql(tx: &SqlTx<'_>, key: &str, expected: &str) -> TxbenchResult<usize> {
    let mut matched = 0;
    tx.for_each_row(QL_SELECT_BY_KEY, [key], |row| {
        let value: String = row.get(1)?;
        if value != expected {
            return Err(unexpected_value(key, expected, &value));
        }
        matched += 1;
        Ok(())
    })?;
    if matched == 0 {
        return Err(TxbenchError::new(
            &format!("no row found for {}", key),
            ErrorKind::UnexpectedValue,
        ));
    }
    Ok(matched)
}

pub fn create_kv_bucket<'tx>(tx: &'tx WriteTx) -> TxbenchResult<BucketMut<'tx>> {
    tx.create_bucket(BUCKET_NAME)
}

pub fn put_kv_pair(bucket: &mut BucketMut<'_>, i: u64) -> TxbenchResult<()> {
    bucket.put(fixture_key(i).as_bytes(), fixture_value(i).as_bytes())
}

/// Creates the bucket and puts `count` pairs into it.
pub fn populate_kv(tx: &WriteTx, count: usize) -> TxbenchResult<()> {
    let mut bucket = create_kv_bucket(tx)?;
    for i in 0..count as u64 {
        put_kv_pair(&mut bucket, i)?;
    }
    log::debug!("Loaded {} pairs into {}", count, BUCKET_NAME);
    Ok(())
}

/// Opens the fixture bucket for writing; a missing bucket is an error.
pub fn kv_bucket_mut(tx: &WriteTx) -> TxbenchResult<BucketMut<'_>> {
    tx.bucket(BUCKET_NAME)?.ok_or_else(missing_bucket)
}

/// Reads `key` from the fixture bucket and checks it holds `expected`.
pub fn probe_kv(tx: &ReadTx, key: &str, expected: &str) -> TxbenchResult<()> {
    let bucket = tx.bucket(BUCKET_NAME)?.ok_or_else(missing_bucket)?;
    match bucket.get(key.as_bytes())? {
        Some(value) if value == expected.as_bytes() => Ok(()),
        Some(value) => Err(unexpected_value(
            key,
            expected,
            &String::from_utf8_lossy(&value),
        )),
        None => Err(TxbenchError::new(
            &format!("no value found for {}", key),
            ErrorKind::UnexpectedValue,
        )),
    }
}

fn missing_bucket() -> TxbenchError {
    TxbenchError::new(
        &format!("non existent bucket {}", BUCKET_NAME),
        ErrorKind::BucketNotFound,
    )
}

fn unexpected_value(key: &str, expected: &str, actual: &str) -> TxbenchError {
    TxbenchError::new(
        &format!("unexpected value for {}: {} (want {})", key, actual, expected),
        ErrorKind::UnexpectedValue,
    )
}
