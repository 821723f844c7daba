//! Declarative aggregation templates and their SQL rendering.
//!
//! A template names what to group by, which aggregates to compute and which
//! filter dimensions it is scoped by. Filter values are never written into the
//! SQL text: every filter renders as a positional placeholder and its value
//! travels alongside in [`BoundQuery::params`].

use std::fmt;

use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::models::Value;

pub const FACT_TABLE: &str = "FACT_PROCUREMENT_SPEND";
pub const VENDOR_TABLE: &str = "DIM_VENDOR";

const DATE_COL: &str = "f.transaction_date";

// ---------------------------------------------------------------------------
// Dialects
// ---------------------------------------------------------------------------

/// Date functions and placeholder syntax of a SQL engine.
pub trait Dialect {
    fn name(&self) -> &'static str;
    fn year_of(&self, col: &str) -> String;
    fn month_of(&self, col: &str) -> String;
    fn day_of(&self, col: &str) -> String;
    fn month_start(&self, col: &str) -> String;
    fn placeholder(&self, index: usize) -> String;
}

pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn year_of(&self, col: &str) -> String {
        format!("CAST(strftime('%Y', {col}) AS INTEGER)")
    }

    fn month_of(&self, col: &str) -> String {
        format!("CAST(strftime('%m', {col}) AS INTEGER)")
    }

    fn day_of(&self, col: &str) -> String {
        format!("date({col})")
    }

    fn month_start(&self, col: &str) -> String {
        format!("date({col}, 'start of month')")
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }
}

pub struct SnowflakeDialect;

impl Dialect for SnowflakeDialect {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn year_of(&self, col: &str) -> String {
        format!("YEAR({col})")
    }

    fn month_of(&self, col: &str) -> String {
        format!("MONTH({col})")
    }

    fn day_of(&self, col: &str) -> String {
        format!("DATE({col})")
    }

    fn month_start(&self, col: &str) -> String {
        format!("DATE_TRUNC('MONTH', {col})")
    }

    fn placeholder(&self, index: usize) -> String {
        format!(":{index}")
    }
}

/// Look up a dialect by its name, ignoring case.
pub fn dialect_named(name: &str) -> Result<&'static dyn Dialect> {
    let known: [&'static dyn Dialect; 2] = [&SqliteDialect, &SnowflakeDialect];
    known
        .into_iter()
        .find(|d| d.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            ReportError::Settings(format!(
                "unknown dialect '{name}' (expected sqlite or snowflake)"
            ))
        })
}

// ---------------------------------------------------------------------------
// Template building blocks
// ---------------------------------------------------------------------------

/// A filter dimension a report can be scoped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Year,
    Month,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Year => write!(f, "year"),
            Dimension::Month => write!(f, "month"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Day,
    /// First calendar day of the month, so months from different years stay apart.
    Month,
    Year,
    Category,
    City,
    Vendor,
}

impl Grouping {
    pub fn alias(&self) -> &'static str {
        match self {
            Grouping::Day => "day",
            Grouping::Month => "month",
            Grouping::Year => "year",
            Grouping::Category => "category",
            Grouping::City => "city",
            Grouping::Vendor => "vendor_name",
        }
    }

    fn expr(&self, d: &dyn Dialect) -> String {
        match self {
            Grouping::Day => d.day_of(DATE_COL),
            Grouping::Month => d.month_start(DATE_COL),
            Grouping::Year => d.year_of(DATE_COL),
            Grouping::Category => "f.category".to_string(),
            Grouping::City => "f.city".to_string(),
            Grouping::Vendor => "v.vendor_name".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    SumNetAmount,
    SumQuantity,
    AvgDiscount,
    AvgQuantity,
    AvgNetAmount,
    Count,
}

impl Aggregate {
    fn expr(&self) -> &'static str {
        match self {
            Aggregate::SumNetAmount => "SUM(f.net_amount)",
            Aggregate::SumQuantity => "SUM(f.quantity)",
            Aggregate::AvgDiscount => "AVG(f.discount_amount)",
            Aggregate::AvgQuantity => "AVG(f.quantity)",
            Aggregate::AvgNetAmount => "AVG(f.net_amount)",
            Aggregate::Count => "COUNT(*)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
    pub aggregate: Aggregate,
    pub alias: &'static str,
    pub round: Option<u32>,
}

impl Measure {
    pub const fn new(aggregate: Aggregate, alias: &'static str) -> Self {
        Self { aggregate, alias, round: None }
    }

    pub const fn rounded(aggregate: Aggregate, alias: &'static str, places: u32) -> Self {
        Self { aggregate, alias, round: Some(places) }
    }

    fn expr(&self) -> String {
        match self.round {
            Some(places) => format!("ROUND({}, {places})", self.aggregate.expr()),
            None => self.aggregate.expr().to_string(),
        }
    }
}

/// Row ordering a report promises to its consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Ascending by each listed column in turn.
    Ascending(Vec<&'static str>),
    /// Descending by `amount`, ties broken by ascending `name`.
    Ranked { amount: &'static str, name: &'static str },
}

impl SortKey {
    fn order_by(&self) -> String {
        match self {
            SortKey::Ascending(cols) => cols
                .iter()
                .map(|c| format!("{c} ASC"))
                .collect::<Vec<_>>()
                .join(", "),
            SortKey::Ranked { amount, name } => format!("{amount} DESC, {name} ASC"),
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QueryTemplate {
    pub groupings: Vec<Grouping>,
    pub measures: Vec<Measure>,
    pub filters: Vec<Dimension>,
    pub skip_null_category: bool,
    pub sort: SortKey,
}

/// SQL text with positional placeholders plus the values bound to them.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryTemplate {
    fn joins_vendor(&self) -> bool {
        self.groupings.contains(&Grouping::Vendor)
    }

    /// Render the SQL text. Placeholders are numbered in `filters` order.
    pub fn render(&self, d: &dyn Dialect) -> String {
        let select: Vec<String> = self
            .groupings
            .iter()
            .map(|g| format!("{} AS {}", g.expr(d), g.alias()))
            .chain(self.measures.iter().map(|m| format!("{} AS {}", m.expr(), m.alias)))
            .collect();

        let mut sql = format!("SELECT {} FROM {FACT_TABLE} f", select.join(", "));
        if self.joins_vendor() {
            sql.push_str(&format!(" JOIN {VENDOR_TABLE} v ON f.vendor_id = v.vendor_id"));
        }

        let mut predicates: Vec<String> = self
            .filters
            .iter()
            .enumerate()
            .map(|(i, dim)| {
                let expr = match dim {
                    Dimension::Year => d.year_of(DATE_COL),
                    Dimension::Month => d.month_of(DATE_COL),
                };
                format!("{expr} = {}", d.placeholder(i + 1))
            })
            .collect();
        if self.skip_null_category {
            predicates.push("f.category IS NOT NULL".to_string());
        }
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }

        if !self.groupings.is_empty() {
            let keys: Vec<String> = self.groupings.iter().map(|g| g.expr(d)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&keys.join(", "));
        }

        sql.push_str(" ORDER BY ");
        sql.push_str(&self.sort.order_by());
        sql
    }

    /// Render and attach parameter values. The caller guarantees every filter
    /// dimension has a value.
    pub fn bind(&self, d: &dyn Dialect, year: Option<i32>, month: Option<u32>) -> BoundQuery {
        let params = self
            .filters
            .iter()
            .map(|dim| match dim {
                Dimension::Year => year.map_or(Value::Null, |y| Value::Integer(y as i64)),
                Dimension::Month => month.map_or(Value::Null, |m| Value::Integer(m as i64)),
            })
            .collect();
        BoundQuery { sql: self.render(d), params }
    }
}

pub fn distinct_years(d: &dyn Dialect) -> String {
    format!(
        "SELECT DISTINCT {} AS year FROM {FACT_TABLE} f ORDER BY year",
        d.year_of(DATE_COL)
    )
}

pub fn distinct_months(d: &dyn Dialect, year: i32) -> BoundQuery {
    let sql = format!(
        "SELECT DISTINCT {} AS month FROM {FACT_TABLE} f WHERE {} = {} ORDER BY month",
        d.month_of(DATE_COL),
        d.year_of(DATE_COL),
        d.placeholder(1)
    );
    BoundQuery { sql, params: vec![Value::Integer(year as i64)] }
}
