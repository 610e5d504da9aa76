//! The storage-side collaborator: anything that can execute compiled
//! statements against the SQLite file (spec §4.5 "Driver", consumed
//! collaborator). Kept as a trait so [`crate::transaction::Transaction`]
//! stays storage-agnostic; tests use [`FakeDriver`].

use crate::value::{Scalar, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DriverError {
    #[error("driver failed to execute statement: {0}")]
    Execution(String),
    #[error("driver returned a row with an unexpected shape: {0}")]
    MalformedRow(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// One returned cell. Mirrors [`Scalar`] plus an explicit null, since a
/// driver's row shape doesn't carry the IR's symbolic value variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Blob(Vec<u8>),
}

pub type Row = std::collections::BTreeMap<String, Cell>;

pub trait Driver {
    fn query(&self, statements: &[Statement]) -> Result<Vec<Vec<Row>>, DriverError>;
}

/// An in-memory SQLite-backed driver for tests (spec §4.5 note: "the
/// compiler and transaction layer are driver-agnostic; tests exercise them
/// against a real SQLite connection to avoid asserting on SQL text alone").
#[cfg(any(test, feature = "test-util"))]
pub struct FakeDriver {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

#[cfg(any(test, feature = "test-util"))]
impl FakeDriver {
    pub fn open_in_memory() -> Result<Self, DriverError> {
        let conn = rusqlite::Connection::open_in_memory().map_err(|e| DriverError::Execution(e.to_string()))?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn bind_param(scalar: &Value) -> rusqlite::types::Value {
        match scalar {
            Value::Null => rusqlite::types::Value::Null,
            Value::Literal(Scalar::String(s)) => rusqlite::types::Value::Text(s.clone()),
            Value::Literal(Scalar::Number(n)) => rusqlite::types::Value::Real(*n),
            Value::Literal(Scalar::Bool(b)) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
            Value::Literal(Scalar::Date(d)) => {
                rusqlite::types::Value::Text(d.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            }
            Value::Literal(Scalar::Json(v)) => rusqlite::types::Value::Text(v.to_string()),
            other => rusqlite::types::Value::Text(format!("{other:?}")),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Driver for FakeDriver {
    fn query(&self, statements: &[Statement]) -> Result<Vec<Vec<Row>>, DriverError> {
        let conn = self.conn.lock().expect("fake driver mutex poisoned");
        let mut batches = Vec::with_capacity(statements.len());

        for statement in statements {
            let mut stmt = conn
                .prepare(&statement.sql)
                .map_err(|e| DriverError::Execution(e.to_string()))?;
            let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
            let params: Vec<rusqlite::types::Value> = statement.params.iter().map(Self::bind_param).collect();
            let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

            let mut rows = Vec::new();
            let mut result_rows = stmt
                .query(params_ref.as_slice())
                .map_err(|e| DriverError::Execution(e.to_string()))?;
            while let Some(row) = result_rows.next().map_err(|e| DriverError::Execution(e.to_string()))? {
                let mut out = Row::new();
                for (i, name) in column_names.iter().enumerate() {
                    let value: rusqlite::types::Value =
                        row.get(i).map_err(|e| DriverError::MalformedRow(e.to_string()))?;
                    out.insert(name.clone(), into_cell(value));
                }
                rows.push(out);
            }
            batches.push(rows);
        }

        Ok(batches)
    }
}

#[cfg(any(test, feature = "test-util"))]
fn into_cell(value: rusqlite::types::Value) -> Cell {
    match value {
        rusqlite::types::Value::Null => Cell::Null,
        rusqlite::types::Value::Integer(i) => Cell::Number(i as f64),
        rusqlite::types::Value::Real(r) => Cell::Number(r),
        rusqlite::types::Value::Text(t) => Cell::Text(t),
        rusqlite::types::Value::Blob(b) => Cell::Blob(b),
    }
}
