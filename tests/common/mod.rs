#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use structdb::dac::{DataRecord, DbColumn, RecordStream, StatementExecutor};
use structdb::sql::SqlParam;
use structdb::{Document, Members, Result, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Members)]
pub struct Address {
    pub street: String,
    pub zip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Document)]
pub struct Customer {
    pub id: i64,
    #[document(unique)]
    pub customer_no: i32,
    pub name: String,
    pub age: i32,
    pub is_active: bool,
    #[document(nested)]
    pub address: Address,
    #[document(timestamp)]
    pub updated_at: Option<DateTime<Utc>>,
    #[document(skip)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Document)]
#[document(name = "SalesOrder")]
pub struct Order {
    #[document(id)]
    pub order_id: Uuid,
    pub customer_id: i64,
    pub total: f64,
}

pub fn customer(name: &str, age: i32) -> Customer {
    Customer {
        name: name.to_string(),
        age,
        customer_no: age * 10,
        is_active: true,
        address: Address {
            street: "Main Street 1".to_string(),
            zip: "12345".to_string(),
        },
        ..Default::default()
    }
}

/// One statement seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct Issued {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Issued {
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

/// In-memory executor recording every statement it is handed.
///
/// `create table` statements register the table so later existence checks see
/// it; results for scalars, readers and affected counts are queued up front.
#[derive(Default)]
pub struct RecordingExecutor {
    pub issued: Vec<Issued>,
    tables: HashMap<String, Vec<DbColumn>>,
    scalars: VecDeque<Value>,
    readers: VecDeque<Vec<DataRecord>>,
    affected: VecDeque<u64>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            table.to_ascii_lowercase(),
            columns.iter().map(|name| DbColumn::new(*name, "nvarchar(300)")).collect(),
        );
        self
    }

    pub fn push_scalar(&mut self, value: impl Into<Value>) {
        self.scalars.push_back(value.into());
    }

    pub fn push_rows(&mut self, columns: &[&str], rows: Vec<Vec<Value>>) {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let records = rows
            .into_iter()
            .map(|values| DataRecord::new(columns.clone(), values).unwrap())
            .collect();
        self.readers.push_back(records);
    }

    pub fn push_affected(&mut self, count: u64) {
        self.affected.push_back(count);
    }

    pub fn statements(&self) -> Vec<&str> {
        self.issued.iter().map(|i| i.sql.as_str()).collect()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(&table.to_ascii_lowercase())
    }

    pub fn clear(&mut self) {
        self.issued.clear();
    }

    fn record(&mut self, sql: &str, params: &[SqlParam]) {
        self.issued.push(Issued {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

impl StatementExecutor for RecordingExecutor {
    fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        self.record(sql, params);
        for line in sql.lines() {
            if let Some(rest) = line.strip_prefix("create table [") {
                if let Some(end) = rest.find(']') {
                    self.tables.insert(rest[..end].to_ascii_lowercase(), Vec::new());
                }
            }
            if let Some((_, rest)) = line.split_once("drop table [") {
                if let Some(end) = rest.find(']') {
                    self.tables.remove(&rest[..end].to_ascii_lowercase());
                }
            }
        }
        Ok(self.affected.pop_front().unwrap_or(1))
    }

    fn execute_scalar(&mut self, sql: &str, params: &[SqlParam]) -> Result<Value> {
        self.record(sql, params);
        Ok(self.scalars.pop_front().unwrap_or(Value::Null))
    }

    fn execute_reader<'a>(&'a mut self, sql: &str, params: &[SqlParam]) -> Result<RecordStream<'a>> {
        self.record(sql, params);
        let rows = self.readers.pop_front().unwrap_or_default();
        Ok(Box::new(rows.into_iter().map(Ok)))
    }

    fn table_exists(&mut self, table: &str) -> Result<bool> {
        Ok(self.has_table(table))
    }

    fn list_columns(&mut self, table: &str) -> Result<Vec<DbColumn>> {
        Ok(self
            .tables
            .get(&table.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}
