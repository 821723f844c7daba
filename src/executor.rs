use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::catalog::{ReportCatalog, ReportDefinition};
use crate::error::{ReportError, Result};
use crate::filter::FilterSnapshot;
use crate::models::{ColumnSpec, ReportResult, TabularResult, Value};
use crate::query::{BoundQuery, Dialect, Dimension, SortKey};
use crate::source::DataSource;

/// Runs catalog reports against an injected data source.
pub struct ReportExecutor<'a> {
    catalog: &'a ReportCatalog,
    source: &'a dyn DataSource,
}

impl<'a> ReportExecutor<'a> {
    pub fn new(catalog: &'a ReportCatalog, source: &'a dyn DataSource) -> Self {
        Self { catalog, source }
    }

    /// Render a report's statement for `dialect` without submitting it.
    pub fn explain(
        &self,
        report: &str,
        filter: &FilterSnapshot,
        dialect: &dyn Dialect,
    ) -> Result<BoundQuery> {
        let def = self.catalog.get(report)?;
        check_filters(def, filter)?;
        Ok(def.template.bind(dialect, filter.year, filter.month))
    }

    pub fn run(&self, report: &str, filter: &FilterSnapshot) -> Result<ReportResult> {
        let bound = self.explain(report, filter, self.source.dialect())?;
        let def = self.catalog.get(report)?;
        debug!(report = def.key, sql = %bound.sql, params = ?bound.params, "running report");

        let raw = self.source.execute(&bound.sql, &bound.params)?;
        let mut rows = normalize(def, raw).inspect_err(|e| warn!(report = def.key, "{e}"))?;
        sort_rows(def.sort(), &def.columns, &mut rows);
        debug!(report = def.key, rows = rows.len(), "report complete");

        Ok(ReportResult {
            report: def.key.to_string(),
            title: def.name.to_string(),
            hint: def.hint,
            columns: def.columns.clone(),
            rows,
        })
    }
}

fn check_filters(def: &ReportDefinition, filter: &FilterSnapshot) -> Result<()> {
    for dim in def.required() {
        let bound = match dim {
            Dimension::Year => filter.year.is_some(),
            Dimension::Month => filter.month.is_some(),
        };
        if !bound {
            return Err(ReportError::MissingFilter {
                report: def.name.to_string(),
                dimension: dim.to_string(),
            });
        }
    }
    Ok(())
}

/// Project the raw result onto the declared columns, coercing each value.
fn normalize(def: &ReportDefinition, raw: TabularResult) -> Result<Vec<Vec<Value>>> {
    let mismatch = |detail: String| ReportError::SchemaMismatch {
        report: def.name.to_string(),
        detail,
    };

    let mut positions = Vec::with_capacity(def.columns.len());
    for col in &def.columns {
        let pos = raw
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(col.name))
            .ok_or_else(|| {
                mismatch(format!("missing column '{}' (got: {})", col.name, raw.columns.join(", ")))
            })?;
        positions.push(pos);
    }

    let width = raw.columns.len();
    let mut rows = Vec::with_capacity(raw.rows.len());
    for (i, mut row) in raw.rows.into_iter().enumerate() {
        if row.len() != width {
            return Err(mismatch(format!(
                "row {i} has {} values for {width} columns",
                row.len()
            )));
        }
        let mut out = Vec::with_capacity(def.columns.len());
        for (col, &pos) in def.columns.iter().zip(&positions) {
            let value = std::mem::replace(&mut row[pos], Value::Null);
            out.push(coerce_cell(col, value, i).map_err(|d| mismatch(d))?);
        }
        rows.push(out);
    }
    Ok(rows)
}

fn coerce_cell(col: &ColumnSpec, value: Value, row: usize) -> std::result::Result<Value, String> {
    if value.is_null() && !col.nullable {
        return Err(format!("row {row}: column '{}' is null", col.name));
    }
    let shown = format!("{value:?}");
    value
        .coerce(col.ty)
        .ok_or_else(|| format!("row {row}: column '{}' expects {:?}, got {shown}", col.name, col.ty))
}

/// Stable, deterministic ordering. Nulls sort last in either direction.
pub fn sort_rows(sort: &SortKey, columns: &[ColumnSpec], rows: &mut [Vec<Value>]) {
    let idx = |name: &str| columns.iter().position(|c| c.name == name);
    match sort {
        SortKey::Ascending(keys) => {
            let keys: Vec<usize> = keys.iter().filter_map(|k| idx(k)).collect();
            rows.sort_by(|a, b| {
                keys.iter()
                    .map(|&k| a[k].sort_cmp(&b[k]))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }
        SortKey::Ranked { amount, name } => {
            let (Some(amount), Some(name)) = (idx(amount), idx(name)) else {
                return;
            };
            rows.sort_by(|a, b| {
                descending(&a[amount], &b[amount]).then_with(|| a[name].sort_cmp(&b[name]))
            });
        }
    }
}

fn descending(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (false, false) => b.sort_cmp(a),
        _ => a.sort_cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::filter::FilterContext;
    use crate::query::{Dialect, SqliteDialect};

    /// Returns a canned result and records every statement it receives.
    struct CannedSource {
        result: std::result::Result<TabularResult, String>,
        seen: RefCell<Vec<(String, Vec<Value>)>>,
    }

    impl CannedSource {
        fn ok(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
            Self {
                result: Ok(TabularResult {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                    rows,
                }),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(msg: &str) -> Self {
            Self { result: Err(msg.to_string()), seen: RefCell::new(Vec::new()) }
        }
    }

    impl DataSource for CannedSource {
        fn dialect(&self) -> &dyn Dialect {
            &SqliteDialect
        }

        fn execute(&self, sql: &str, params: &[Value]) -> Result<TabularResult> {
            self.seen.borrow_mut().push((sql.to_string(), params.to_vec()));
            self.result.clone().map_err(ReportError::DataSource)
        }
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn year_month(year: i32, month: u32) -> FilterSnapshot {
        FilterSnapshot { year: Some(year), month: Some(month), generation: 1 }
    }

    #[test]
    fn test_unknown_report() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&[], vec![]);
        let exec = ReportExecutor::new(&catalog, &source);
        let err = exec.run("UnknownReport", &year_month(2024, 1)).unwrap_err();
        assert!(matches!(err, ReportError::UnknownReport(_)));
    }

    #[test]
    fn test_missing_month_is_reported_before_querying() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&[], vec![]);
        let exec = ReportExecutor::new(&catalog, &source);
        let ctx = FilterContext::for_year(2024);
        let err = exec.run("Daily spend trend", &ctx.snapshot()).unwrap_err();
        match err {
            ReportError::MissingFilter { dimension, .. } => assert_eq!(dimension, "month"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(source.seen.borrow().is_empty());
    }

    #[test]
    fn test_missing_year() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&[], vec![]);
        let exec = ReportExecutor::new(&catalog, &source);
        let err = exec.run("year-spend", &FilterContext::new().snapshot()).unwrap_err();
        assert!(matches!(err, ReportError::MissingFilter { ref dimension, .. } if dimension == "year"));
    }

    #[test]
    fn test_filter_values_are_bound_not_spliced() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&["category", "total_spend"], vec![]);
        let exec = ReportExecutor::new(&catalog, &source);
        exec.run("category-spend", &year_month(2024, 11)).unwrap();
        let seen = source.seen.borrow();
        let (sql, params) = &seen[0];
        assert_eq!(params, &vec![Value::Integer(2024), Value::Integer(11)]);
        assert!(!sql.contains("2024") && !sql.contains("11"), "got: {sql}");
    }

    #[test]
    fn test_data_source_failure_is_not_retried() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::failing("connection reset");
        let exec = ReportExecutor::new(&catalog, &source);
        let err = exec.run("city-spend", &year_month(2024, 1)).unwrap_err();
        assert!(matches!(err, ReportError::DataSource(ref m) if m == "connection reset"));
        assert_eq!(source.seen.borrow().len(), 1);
    }

    #[test]
    fn test_missing_column_is_a_schema_mismatch() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&["category", "spend"], vec![vec![text("IT"), Value::Decimal(1.0)]]);
        let exec = ReportExecutor::new(&catalog, &source);
        let err = exec.run("category-spend", &year_month(2024, 1)).unwrap_err();
        assert!(matches!(err, ReportError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("total_spend"), "got: {err}");
    }

    #[test]
    fn test_uncoercible_value_is_a_schema_mismatch() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(
            &["day", "daily_spend"],
            vec![vec![text("not a date"), Value::Decimal(1.0)]],
        );
        let exec = ReportExecutor::new(&catalog, &source);
        let err = exec.run("daily-spend", &year_month(2024, 1)).unwrap_err();
        assert!(matches!(err, ReportError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_null_in_required_column_is_a_schema_mismatch() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&["city", "total_spend"], vec![vec![Value::Null, Value::Decimal(5.0)]]);
        let exec = ReportExecutor::new(&catalog, &source);
        let err = exec.run("city-spend", &year_month(2024, 1)).unwrap_err();
        assert!(matches!(err, ReportError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_uppercase_warehouse_columns_are_accepted_and_reordered() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(
            &["TOTAL_SPEND", "CATEGORY"],
            vec![
                vec![Value::Integer(150), text("Office")],
                vec![Value::Integer(200), text("IT")],
            ],
        );
        let exec = ReportExecutor::new(&catalog, &source);
        let result = exec.run("category-spend", &year_month(2024, 1)).unwrap();
        assert_eq!(
            result.rows,
            vec![
                vec![text("IT"), Value::Decimal(200.0)],
                vec![text("Office"), Value::Decimal(150.0)],
            ]
        );
    }

    #[test]
    fn test_ranked_ties_break_by_name_with_nulls_last() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(
            &["category", "total_spend"],
            vec![
                vec![text("Travel"), Value::Decimal(50.0)],
                vec![Value::Null, Value::Decimal(50.0)],
                vec![text("Fleet"), Value::Decimal(50.0)],
                vec![text("IT"), Value::Decimal(75.0)],
            ],
        );
        let exec = ReportExecutor::new(&catalog, &source);
        let result = exec.run("category-spend", &year_month(2024, 1)).unwrap();
        let names: Vec<Value> = result.rows.iter().map(|r| r[0].clone()).collect();
        assert_eq!(names, vec![text("IT"), text("Fleet"), text("Travel"), Value::Null]);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&["vendor_name", "vendor_spend"], vec![]);
        let exec = ReportExecutor::new(&catalog, &source);
        let result = exec.run("Vendor spend", &year_month(2030, 2)).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.title, "Vendor spend");
    }

    #[test]
    fn test_explain_matches_what_run_submits() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&["year", "total_spend"], vec![]);
        let exec = ReportExecutor::new(&catalog, &source);
        let filter = FilterSnapshot { year: Some(2023), month: None, generation: 0 };
        let bound = exec.explain("year-spend", &filter, source.dialect()).unwrap();
        exec.run("year-spend", &filter).unwrap();
        assert_eq!(source.seen.borrow()[0], (bound.sql, bound.params));
    }

    #[test]
    fn test_out_of_range_integer_is_a_schema_mismatch() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(
            &["year", "total_spend"],
            vec![vec![Value::Decimal(1e20), Value::Decimal(10.0)]],
        );
        let exec = ReportExecutor::new(&catalog, &source);
        let filter = FilterSnapshot { year: Some(2024), month: None, generation: 0 };
        let err = exec.run("year-spend", &filter).unwrap_err();
        assert!(matches!(err, ReportError::SchemaMismatch { .. }), "got: {err:?}");
    }

    #[test]
    fn test_explain_in_another_dialect_does_not_query() {
        let catalog = ReportCatalog::standard().unwrap();
        let source = CannedSource::ok(&[], vec![]);
        let exec = ReportExecutor::new(&catalog, &source);
        let bound = exec
            .explain("daily-spend", &year_month(2024, 3), &crate::query::SnowflakeDialect)
            .unwrap();
        assert!(bound.sql.contains("YEAR(f.transaction_date) = :1"), "{}", bound.sql);
        assert!(bound.sql.contains("MONTH(f.transaction_date) = :2"), "{}", bound.sql);
        assert_eq!(bound.params, vec![Value::Integer(2024), Value::Integer(3)]);
        assert!(source.seen.borrow().is_empty());
    }
}
