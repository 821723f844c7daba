use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A single cell as returned by a data source or held in a report result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Decimal(f64),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Convert into the declared semantic type, or `None` when the value
    /// cannot represent it. Nulls pass through; nullability is checked by
    /// the caller.
    pub fn coerce(self, ty: ColumnType) -> Option<Value> {
        match (ty, self) {
            (_, Value::Null) => Some(Value::Null),
            (ColumnType::Integer, Value::Integer(i)) => Some(Value::Integer(i)),
            (ColumnType::Integer, Value::Decimal(d))
                if d.fract() == 0.0 && d >= i64::MIN as f64 && d < i64::MAX as f64 =>
            {
                Some(Value::Integer(d as i64))
            }
            (ColumnType::Integer, Value::Text(s)) => s.trim().parse().ok().map(Value::Integer),
            (ColumnType::Decimal, Value::Integer(i)) => Some(Value::Decimal(i as f64)),
            (ColumnType::Decimal, Value::Decimal(d)) => Some(Value::Decimal(d)),
            (ColumnType::Decimal, Value::Text(s)) => s.trim().parse().ok().map(Value::Decimal),
            (ColumnType::String, Value::Text(s)) => Some(Value::Text(s)),
            (ColumnType::Date, Value::Date(d)) => Some(Value::Date(d)),
            (ColumnType::Date, Value::Text(s)) => parse_date(&s).map(Value::Date),
            _ => None,
        }
    }

    /// Total order used for report sorting. Nulls sort after every other value.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d:.2}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    String,
    Integer,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty, nullable: false }
    }

    pub const fn nullable(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty, nullable: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationHint {
    TimeSeries,
    RankedCategorical,
    RawTable,
}

impl fmt::Display for PresentationHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentationHint::TimeSeries => write!(f, "time-series"),
            PresentationHint::RankedCategorical => write!(f, "ranked"),
            PresentationHint::RawTable => write!(f, "table"),
        }
    }
}

/// Raw result set as handed back by a data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Validated, typed and ordered output of one report execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportResult {
    pub report: String,
    pub title: String,
    pub hint: PresentationHint,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Value>>,
}

impl ReportResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.rows.get(row)?.get(idx)
    }
}
