//! Dashboard views: batches of reports re-run together whenever the filter
//! changes, with results applied only while they still match the filter.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::catalog::ReportCatalog;
use crate::error::{ReportError, Result};
use crate::executor::ReportExecutor;
use crate::filter::{FilterContext, FilterSnapshot};
use crate::models::ReportResult;
use crate::query::Dimension;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Single-month view scoped by year and month.
    Monthly,
    /// Full-history breakdowns.
    History,
}

impl View {
    pub fn reports(&self) -> &'static [&'static str] {
        match self {
            View::Monthly => &[
                "daily-spend",
                "category-spend",
                "city-spend",
                "vendor-spend",
                "discount-by-category",
                "year-spend",
                "average-quantity-spend",
            ],
            View::History => &[
                "monthly-spend",
                "year-spend",
                "month-vendor-category",
                "year-category",
                "average-quantity-spend-yearly",
            ],
        }
    }

    /// Whether any report of this view needs `dim` bound to run.
    pub fn requires(&self, catalog: &ReportCatalog, dim: Dimension) -> bool {
        self.reports()
            .iter()
            .filter_map(|report| catalog.get(report).ok())
            .any(|def| def.required().contains(&dim))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Monthly => write!(f, "monthly"),
            View::History => write!(f, "history"),
        }
    }
}

impl FromStr for View {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(View::Monthly),
            "history" => Ok(View::History),
            other => Err(ReportError::Settings(format!(
                "unknown view '{other}' (expected monthly or history)"
            ))),
        }
    }
}

/// One report's outcome within a refresh.
pub struct Panel {
    pub report: &'static str,
    pub outcome: Result<ReportResult>,
}

/// The outcome of re-running a view against one filter snapshot.
pub struct Refresh {
    pub view: View,
    pub filter: FilterSnapshot,
    pub panels: Vec<Panel>,
}

/// Run every report of `view` sequentially. A failing report does not stop
/// the others; its error is kept in its panel.
pub fn refresh(exec: &ReportExecutor<'_>, view: View, filter: FilterSnapshot) -> Refresh {
    let panels = view
        .reports()
        .iter()
        .map(|&report| Panel {
            report,
            outcome: exec.run(report, &filter),
        })
        .collect();
    debug!(%view, generation = filter.generation, "refresh complete");
    Refresh { view, filter, panels }
}

/// What is currently on screen.
#[derive(Default)]
pub struct DashboardState {
    current: Option<Refresh>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a finished refresh if it was computed against the filter as it
    /// stands now. Returns false when the refresh was stale and discarded.
    pub fn apply(&mut self, refresh: Refresh, filter: &FilterContext) -> bool {
        let generation = refresh.filter.generation;
        let outdated_by_applied = self
            .current
            .as_ref()
            .is_some_and(|c| c.filter.generation > generation);
        if generation != filter.generation() || outdated_by_applied {
            warn!(
                generation,
                current = filter.generation(),
                "discarding stale dashboard refresh"
            );
            return false;
        }
        self.current = Some(refresh);
        true
    }

    pub fn current(&self) -> Option<&Refresh> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TabularResult, Value};
    use crate::query::{Dialect, SqliteDialect};
    use crate::source::DataSource;

    struct EmptySource;

    impl DataSource for EmptySource {
        fn dialect(&self) -> &dyn Dialect {
            &SqliteDialect
        }

        fn execute(&self, sql: &str, _params: &[Value]) -> Result<TabularResult> {
            // Echo back the aliases the statement selects, with no rows.
            let select = sql.split(" FROM ").next().unwrap_or_default();
            let columns = select
                .split(", ")
                .filter_map(|part| part.rsplit(" AS ").next())
                .map(|c| c.to_string())
                .collect();
            Ok(TabularResult { columns, rows: Vec::new() })
        }
    }

    #[test]
    fn test_view_parsing() {
        assert_eq!("Monthly".parse::<View>().unwrap(), View::Monthly);
        assert_eq!("history".parse::<View>().unwrap(), View::History);
        assert!("weekly".parse::<View>().is_err());
    }

    #[test]
    fn test_every_view_report_is_in_the_catalog() {
        let catalog = ReportCatalog::standard().unwrap();
        for view in [View::Monthly, View::History] {
            for report in view.reports() {
                assert!(catalog.get(report).is_ok(), "{view} lists unknown report {report}");
            }
        }
    }

    #[test]
    fn test_only_the_monthly_view_needs_a_month() {
        let catalog = ReportCatalog::standard().unwrap();
        assert!(View::Monthly.requires(&catalog, Dimension::Month));
        assert!(!View::History.requires(&catalog, Dimension::Month));
        assert!(View::History.requires(&catalog, Dimension::Year));
    }

    #[test]
    fn test_refresh_runs_every_panel() {
        let catalog = ReportCatalog::standard().unwrap();
        let exec = ReportExecutor::new(&catalog, &EmptySource);
        let mut ctx = FilterContext::new();
        ctx.set_year(2024);
        let refresh = refresh(&exec, View::History, ctx.snapshot());
        assert_eq!(refresh.panels.len(), View::History.reports().len());
        for panel in &refresh.panels {
            let result = panel.outcome.as_ref().unwrap();
            assert!(result.is_empty(), "{} should be empty", panel.report);
        }
    }

    #[test]
    fn test_missing_month_fails_only_month_scoped_panels() {
        let catalog = ReportCatalog::standard().unwrap();
        let exec = ReportExecutor::new(&catalog, &EmptySource);
        let ctx = FilterContext::for_year(2024);
        let refresh = refresh(&exec, View::Monthly, ctx.snapshot());
        for panel in &refresh.panels {
            if panel.report == "year-spend" {
                assert!(panel.outcome.is_ok());
            } else {
                assert!(matches!(panel.outcome, Err(ReportError::MissingFilter { .. })));
            }
        }
    }

    #[test]
    fn test_stale_refresh_is_discarded() {
        let catalog = ReportCatalog::standard().unwrap();
        let exec = ReportExecutor::new(&catalog, &EmptySource);
        let mut ctx = FilterContext::for_year(2023);
        let stale = refresh(&exec, View::History, ctx.snapshot());
        ctx.set_year(2024);
        let fresh = refresh(&exec, View::History, ctx.snapshot());

        let mut state = DashboardState::new();
        assert!(!state.apply(stale, &ctx));
        assert!(state.current().is_none());
        assert!(state.apply(fresh, &ctx));
        assert_eq!(state.current().unwrap().filter.year, Some(2024));
    }

    #[test]
    fn test_older_refresh_never_replaces_newer_one() {
        let catalog = ReportCatalog::standard().unwrap();
        let exec = ReportExecutor::new(&catalog, &EmptySource);
        let ctx = FilterContext::for_year(2024);
        let mut newer = ctx.snapshot();
        newer.generation += 1;
        let mut state = DashboardState::new();
        state.current = Some(refresh(&exec, View::History, newer));
        let older = refresh(&exec, View::History, ctx.snapshot());
        assert!(!state.apply(older, &ctx));
    }
}
