use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::{ReportError, Result};
use crate::fmt::{bar, money, quantity};
use crate::models::{ColumnSpec, ColumnType, PresentationHint, ReportResult, Value};

const BAR_WIDTH: usize = 30;

/// Output formats for a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Table,
    Csv,
    Json,
}

impl std::str::FromStr for Format {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Format::Table),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            other => Err(ReportError::Settings(format!(
                "unknown format '{other}' (expected table, csv or json)"
            ))),
        }
    }
}

pub fn render(result: &ReportResult, format: Format, currency: &str) -> Result<String> {
    match format {
        Format::Table => Ok(render_text(result, currency)),
        Format::Csv => to_csv(result),
        Format::Json => Ok(serde_json::to_string_pretty(&to_json(result))?),
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

pub fn render_text(result: &ReportResult, currency: &str) -> String {
    let title = result.title.bold().to_string();
    if result.is_empty() {
        return format!("{title}\nNo data for this period.");
    }
    let table = match result.hint {
        PresentationHint::RawTable => plain_table(result, currency),
        PresentationHint::TimeSeries => bar_table(result, currency, false),
        PresentationHint::RankedCategorical => bar_table(result, currency, true),
    };
    format!("{title}\n{table}")
}

fn plain_table(result: &ReportResult, currency: &str) -> Table {
    let mut table = Table::new();
    table.set_header(result.columns.iter().map(|c| header(c.name)).collect::<Vec<_>>());
    for row in &result.rows {
        table.add_row(
            result
                .columns
                .iter()
                .zip(row)
                .map(|(col, v)| cell(col, v, currency))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Label column, value column and a proportional bar. Ranked tables get a
/// leading rank number.
fn bar_table(result: &ReportResult, currency: &str, ranked: bool) -> Table {
    let label = &result.columns[0];
    let measure = &result.columns[result.columns.len() - 1];
    let last = result.columns.len() - 1;
    let max = result
        .rows
        .iter()
        .filter_map(|r| r[last].as_f64())
        .fold(0.0f64, f64::max);

    let mut table = Table::new();
    let mut head = Vec::new();
    if ranked {
        head.push("#".to_string());
    }
    head.extend([header(label.name), header(measure.name), String::new()]);
    table.set_header(head);

    for (i, row) in result.rows.iter().enumerate() {
        let mut cells = Vec::new();
        if ranked {
            cells.push(Cell::new(i + 1));
        }
        cells.push(cell(label, &row[0], currency));
        cells.push(cell(measure, &row[last], currency));
        let amount = row[last].as_f64().unwrap_or(0.0);
        cells.push(Cell::new(bar(amount, max, BAR_WIDTH).cyan()));
        table.add_row(cells);
    }
    table
}

fn header(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn cell(col: &ColumnSpec, v: &Value, currency: &str) -> Cell {
    let text = display(col, v, currency);
    match col.ty {
        ColumnType::Decimal | ColumnType::Integer => {
            Cell::new(text).set_alignment(CellAlignment::Right)
        }
        _ => Cell::new(text),
    }
}

/// Human formatting of one value given its column.
pub fn display(col: &ColumnSpec, v: &Value, currency: &str) -> String {
    match v {
        Value::Null => "—".to_string(),
        Value::Decimal(d) if col.name.contains("quantity") => quantity(*d),
        Value::Decimal(d) => money(*d, currency),
        Value::Integer(i) if col.name == "year" => i.to_string(),
        Value::Integer(i) => quantity(*i as f64),
        Value::Date(d) if col.name == "month" => d.format("%b %Y").to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Machine-readable
// ---------------------------------------------------------------------------

pub fn to_csv(result: &ReportResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(result.columns.iter().map(|c| c.name))?;
    for row in &result.rows {
        wtr.write_record(row.iter().map(csv_field))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Decimals keep full precision, unlike the two-place `Display` form.
fn csv_field(v: &Value) -> String {
    match v {
        Value::Decimal(d) => d.to_string(),
        other => other.to_string(),
    }
}

/// Rows as objects keyed by column name, in column order.
pub fn to_json(result: &ReportResult) -> serde_json::Value {
    let rows = result
        .rows
        .iter()
        .map(|row| {
            let obj: serde_json::Map<String, serde_json::Value> = result
                .columns
                .iter()
                .zip(row)
                .map(|(c, v)| (c.name.to_string(), serde_json::to_value(v).unwrap_or_default()))
                .collect();
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::json!({
        "report": result.report,
        "title": result.title,
        "presentation": result.hint,
        "rows": serde_json::Value::Array(rows),
    })
}
