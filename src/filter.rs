use tracing::debug;

use crate::error::{ReportError, Result};
use crate::models::Value;
use crate::query;
use crate::source::DataSource;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const FULL_MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

pub fn month_name(month: u32) -> Result<&'static str> {
    match month {
        1..=12 => Ok(MONTH_NAMES[(month - 1) as usize]),
        _ => Err(ReportError::InvalidFilter(format!(
            "month {month} is out of range (1-12)"
        ))),
    }
}

/// Parse `3`, `03`, `Mar` or `march` into a month number. Labels must be the
/// exact short or full name, in any case.
pub fn parse_month(input: &str) -> Result<u32> {
    let s = input.trim();
    if let Ok(n) = s.parse::<u32>() {
        month_name(n)?;
        return Ok(n);
    }
    MONTH_NAMES
        .iter()
        .zip(FULL_MONTH_NAMES)
        .position(|(short, full)| s.eq_ignore_ascii_case(short) || s.eq_ignore_ascii_case(full))
        .map(|i| i as u32 + 1)
        .ok_or_else(|| ReportError::InvalidFilter(format!("unrecognized month: {input}")))
}

/// Distinct years present in the fact table, ascending.
pub fn available_years(source: &dyn DataSource) -> Result<Vec<i32>> {
    let sql = query::distinct_years(source.dialect());
    let result = source.execute(&sql, &[])?;
    Ok(int_column(&result.rows)
        .into_iter()
        .map(|y| y as i32)
        .collect())
}

fn int_column(rows: &[Vec<Value>]) -> Vec<i64> {
    let mut out: Vec<i64> = rows
        .iter()
        .filter_map(|r| r.first())
        .filter_map(|v| v.as_f64())
        .map(|v| v as i64)
        .collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Immutable view of a filter at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSnapshot {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub generation: u64,
}

/// The user's current time scope.
///
/// Every mutation bumps `generation` so results computed against an older
/// snapshot can be recognized as stale.
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    year: Option<i32>,
    month: Option<u32>,
    months: Option<Vec<u32>>,
    generation: u64,
}

impl FilterContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_year(year: i32) -> Self {
        let mut ctx = Self::default();
        ctx.set_year(year);
        ctx
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            year: self.year,
            month: self.month,
            generation: self.generation,
        }
    }

    /// Switch years. The month list is re-derived on next access and any
    /// selected month is dropped, since it may not exist in the new year.
    pub fn set_year(&mut self, year: i32) {
        self.year = Some(year);
        self.month = None;
        self.months = None;
        self.generation += 1;
        debug!(year, generation = self.generation, "filter year set");
    }

    pub fn available_months(&mut self, source: &dyn DataSource) -> Result<&[u32]> {
        if self.months.is_none() {
            let months = match self.year {
                Some(year) => {
                    let bound = query::distinct_months(source.dialect(), year);
                    let result = source.execute(&bound.sql, &bound.params)?;
                    int_column(&result.rows)
                        .into_iter()
                        .filter(|m| (1..=12).contains(m))
                        .map(|m| m as u32)
                        .collect()
                }
                None => Vec::new(),
            };
            debug!(?months, "derived available months");
            self.months = Some(months);
        }
        Ok(self.months.as_deref().unwrap_or_default())
    }

    pub fn set_month(&mut self, month: u32, source: &dyn DataSource) -> Result<()> {
        let name = month_name(month)?;
        let Some(year) = self.year else {
            return Err(ReportError::InvalidFilter(
                "select a year before selecting a month".to_string(),
            ));
        };
        if !self.available_months(source)?.contains(&month) {
            return Err(ReportError::InvalidFilter(format!(
                "{name} has no transactions in {year}"
            )));
        }
        self.month = Some(month);
        self.generation += 1;
        debug!(year, month, generation = self.generation, "filter month set");
        Ok(())
    }

    /// Select the earliest year with data when no year is chosen yet.
    pub fn default_year(&mut self, source: &dyn DataSource) -> Result<()> {
        if self.year.is_none() {
            if let Some(&year) = available_years(source)?.first() {
                self.set_year(year);
            }
        }
        Ok(())
    }

    /// Select the earliest month of the chosen year when no month is chosen yet.
    pub fn default_month(&mut self, source: &dyn DataSource) -> Result<()> {
        if self.year.is_some() && self.month.is_none() {
            if let Some(&month) = self.available_months(source)?.first() {
                self.set_month(month, source)?;
            }
        }
        Ok(())
    }
}
