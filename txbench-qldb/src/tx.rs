use crate::error::sql_error;
use crate::QlResult;
use rusqlite::types::FromSql;
use rusqlite::{Connection, Params, Row};
use txbench::TxMode;

/// SQL access handed to the closures of [`crate::QlDb`].
///
/// Statements go through the connection's prepared statement cache, so
/// running the same SQL text in a loop only parses it once.
pub struct SqlTx<'conn> {
    conn: &'conn Connection,
    mode: TxMode,
}

impl<'conn> SqlTx<'conn> {
    pub(crate) fn new(conn: &'conn Connection, mode: TxMode) -> Self {
        SqlTx { conn, mode }
    }

    pub fn mode(&self) -> TxMode {
        self.mode
    }

    /// Executes one statement and returns the number of changed rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> QlResult<usize> {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|err| sql_error("Failed to prepare statement", err))?;
        stmt.execute(params)
            .map_err(|err| sql_error("Failed to execute statement", err))
    }

    /// Executes a `;` separated list of statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> QlResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|err| sql_error("Failed to execute batch", err))
    }

    /// Runs a query and calls `func` for every row, in order.
    ///
    /// Stops at the first error `func` returns.
    pub fn for_each_row<P, F>(&self, sql: &str, params: P, mut func: F) -> QlResult<()>
    where
        P: Params,
        F: FnMut(&SqlRow<'_, '_>) -> QlResult<()>,
    {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|err| sql_error("Failed to prepare query", err))?;
        let mut rows = stmt
            .query(params)
            .map_err(|err| sql_error("Failed to run query", err))?;
        while let Some(row) = rows
            .next()
            .map_err(|err| sql_error("Failed to fetch row", err))?
        {
            func(&SqlRow { row })?;
        }
        Ok(())
    }

    /// Runs a query and maps every row through `func`.
    pub fn query<T, P, F>(&self, sql: &str, params: P, mut func: F) -> QlResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&SqlRow<'_, '_>) -> QlResult<T>,
    {
        let mut out = Vec::new();
        self.for_each_row(sql, params, |row| {
            out.push(func(row)?);
            Ok(())
        })?;
        Ok(out)
    }

    /// Runs a query and maps its first row, `None` when there are no rows.
    pub fn query_one<T, P, F>(&self, sql: &str, params: P, func: F) -> QlResult<Option<T>>
    where
        P: Params,
        F: FnOnce(&SqlRow<'_, '_>) -> QlResult<T>,
    {
        let mut stmt = self
            .conn
            .prepare_cached(sql)
            .map_err(|err| sql_error("Failed to prepare query", err))?;
        let mut rows = stmt
            .query(params)
            .map_err(|err| sql_error("Failed to run query", err))?;
        match rows
            .next()
            .map_err(|err| sql_error("Failed to fetch row", err))?
        {
            Some(row) => func(&SqlRow { row }).map(Some),
            None => Ok(None),
        }
    }
}

/// One result row.
pub struct SqlRow<'stmt, 'row> {
    row: &'row Row<'stmt>,
}

impl SqlRow<'_, '_> {
    /// Reads column `index` (zero based) as `T`.
    pub fn get<T: FromSql>(&self, index: usize) -> QlResult<T> {
        self.row
            .get(index)
            .map_err(|err| sql_error(&format!("Failed to read column {}", index), err))
    }
}
