use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, ToSql};
use tracing::debug;

use crate::error::Result;
use crate::models::{TabularResult, Value};
use crate::query::{Dialect, SqliteDialect};
use crate::source::DataSource;

/// Local stand-in for the warehouse tables the reports read.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS DIM_VENDOR (
    vendor_id INTEGER PRIMARY KEY,
    vendor_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS FACT_PROCUREMENT_SPEND (
    transaction_id INTEGER PRIMARY KEY,
    transaction_date TEXT NOT NULL,
    vendor_id INTEGER NOT NULL,
    category TEXT,
    city TEXT NOT NULL,
    quantity REAL NOT NULL CHECK (quantity >= 0),
    net_amount REAL NOT NULL,
    discount_amount REAL NOT NULL DEFAULT 0 CHECK (discount_amount >= 0),
    FOREIGN KEY (vendor_id) REFERENCES DIM_VENDOR(vendor_id)
);

CREATE INDEX IF NOT EXISTS idx_fact_date ON FACT_PROCUREMENT_SPEND(transaction_date);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Decimal(d) => ToSqlOutput::Borrowed(ValueRef::Real(*d)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Date(d) => ToSqlOutput::Owned(rusqlite::types::Value::Text(
                d.format("%Y-%m-%d").to_string(),
            )),
        })
    }
}

fn from_sql_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Decimal(r),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

/// A SQLite database file holding the fact and vendor tables.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open an existing warehouse file without write access.
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::new(conn))
    }
}

impl DataSource for SqliteSource {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<TabularResult> {
        debug!(%sql, ?params, "sqlite execute");
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let mut rows_iter = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sql_ref(row.get_ref(i)?));
            }
            rows.push(values);
        }
        debug!(rows = rows.len(), "sqlite execute done");
        Ok(TabularResult { columns, rows })
    }
}
