//! Data access contracts
//!
//! The engine never talks to a database itself. Everything it issues goes
//! through a [`StatementExecutor`] owned by the caller: connection lifecycle,
//! transactions, timeouts and retries all live behind this trait.

use crate::core::{DbError, Result, Value};
use crate::sql::SqlParam;

/// Forward-only rows of one result set.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<DataRecord>> + 'a>;

/// Physical column as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbColumn {
    pub name: String,
    pub sql_type: String,
}

impl DbColumn {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// One row read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl DataRecord {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Result<Self> {
        if columns.len() != values.len() {
            return Err(DbError::ExecutionError(format!(
                "record has {} column(s) but {} value(s)",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    pub fn get_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|index| self.values.get(index))
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Executes statements against one connection handle.
///
/// Readers borrow the executor mutably, so a result stream must be drained or
/// dropped before the next statement can be issued on the same handle.
/// Implementations report statement timeouts as [`DbError::Timeout`] and other
/// failures as [`DbError::ExecutionError`].
pub trait StatementExecutor {
    /// Run a statement batch and return the affected row count.
    fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64>;

    /// First column of the first row, or `Value::Null` for no rows.
    fn execute_scalar(&mut self, sql: &str, params: &[SqlParam]) -> Result<Value>;

    fn execute_reader<'a>(&'a mut self, sql: &str, params: &[SqlParam]) -> Result<RecordStream<'a>>;

    fn table_exists(&mut self, table: &str) -> Result<bool>;

    fn list_columns(&mut self, table: &str) -> Result<Vec<DbColumn>>;
}

impl<E: StatementExecutor + ?Sized> StatementExecutor for &mut E {
    fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn execute_scalar(&mut self, sql: &str, params: &[SqlParam]) -> Result<Value> {
        (**self).execute_scalar(sql, params)
    }

    fn execute_reader<'a>(&'a mut self, sql: &str, params: &[SqlParam]) -> Result<RecordStream<'a>> {
        (**self).execute_reader(sql, params)
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        (**self).table_exists(table)
    }

    fn list_columns(&mut self, table: &str) -> Result<Vec<DbColumn>> {
        (**self).list_columns(table)
    }
}
