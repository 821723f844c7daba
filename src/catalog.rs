use crate::error::{ReportError, Result};
use crate::models::{ColumnSpec, ColumnType, PresentationHint};
use crate::query::{Aggregate, Dimension, Grouping, Measure, QueryTemplate, SortKey};

use ColumnType::{Date, Decimal, Integer, String as Text};
use Dimension::{Month, Year};

/// A named report: what to ask the warehouse and what shape comes back.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDefinition {
    /// Short CLI-friendly identifier, e.g. `category-spend`.
    pub key: &'static str,
    /// Display name, e.g. `Category spend`.
    pub name: &'static str,
    pub template: QueryTemplate,
    pub columns: Vec<ColumnSpec>,
    pub hint: PresentationHint,
}

impl ReportDefinition {
    pub fn required(&self) -> &[Dimension] {
        &self.template.filters
    }

    pub fn sort(&self) -> &SortKey {
        &self.template.sort
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportCatalog {
    reports: Vec<ReportDefinition>,
}

impl ReportCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ReportDefinition) -> Result<()> {
        let clash = self.reports.iter().any(|r| {
            r.name == definition.name || r.key.eq_ignore_ascii_case(definition.key)
        });
        if clash {
            return Err(ReportError::DuplicateReport(definition.name.to_string()));
        }
        self.reports.push(definition);
        Ok(())
    }

    /// Look up by display name, or by key ignoring case.
    pub fn get(&self, name: &str) -> Result<&ReportDefinition> {
        self.reports
            .iter()
            .find(|r| r.name == name || r.key.eq_ignore_ascii_case(name))
            .ok_or_else(|| ReportError::UnknownReport(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportDefinition> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// The fixed procurement report set.
    pub fn standard() -> Result<Self> {
        let mut catalog = Self::new();
        for definition in standard_reports() {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }
}

// ---------------------------------------------------------------------------
// Standard report set
// ---------------------------------------------------------------------------

const YEAR_MONTH: &[Dimension] = &[Year, Month];
const YEAR_ONLY: &[Dimension] = &[Year];

fn ranked(
    key: &'static str,
    name: &'static str,
    group: Grouping,
    measure: Measure,
    label: ColumnSpec,
    value_type: ColumnType,
) -> ReportDefinition {
    ReportDefinition {
        key,
        name,
        template: QueryTemplate {
            groupings: vec![group],
            measures: vec![measure],
            filters: YEAR_MONTH.to_vec(),
            skip_null_category: false,
            sort: SortKey::Ranked { amount: measure.alias, name: group.alias() },
        },
        columns: vec![label, ColumnSpec::new(measure.alias, value_type)],
        hint: PresentationHint::RankedCategorical,
    }
}

fn average_quantity_spend(
    key: &'static str,
    name: &'static str,
    filters: &[Dimension],
    groupings: Vec<Grouping>,
) -> ReportDefinition {
    let mut columns: Vec<ColumnSpec> = groupings
        .iter()
        .map(|g| match g {
            Grouping::Year => ColumnSpec::new("year", Integer),
            _ => ColumnSpec::new(g.alias(), Text),
        })
        .collect();
    columns.push(ColumnSpec::new("avg_quantity_per_txn", Decimal));
    columns.push(ColumnSpec::new("avg_spend_per_txn", Decimal));
    let sort = SortKey::Ascending(groupings.iter().map(|g| g.alias()).collect());
    ReportDefinition {
        key,
        name,
        template: QueryTemplate {
            groupings,
            measures: vec![
                Measure::rounded(Aggregate::AvgQuantity, "avg_quantity_per_txn", 2),
                Measure::rounded(Aggregate::AvgNetAmount, "avg_spend_per_txn", 2),
            ],
            filters: filters.to_vec(),
            skip_null_category: true,
            sort,
        },
        columns,
        hint: PresentationHint::RawTable,
    }
}

fn standard_reports() -> Vec<ReportDefinition> {
    let total_spend = Measure::new(Aggregate::SumNetAmount, "total_spend");
    let total_quantity = Measure::new(Aggregate::SumQuantity, "total_quantity");

    vec![
        ReportDefinition {
            key: "daily-spend",
            name: "Daily spend trend",
            template: QueryTemplate {
                groupings: vec![Grouping::Day],
                measures: vec![Measure::new(Aggregate::SumNetAmount, "daily_spend")],
                filters: YEAR_MONTH.to_vec(),
                skip_null_category: false,
                sort: SortKey::Ascending(vec!["day"]),
            },
            columns: vec![ColumnSpec::new("day", Date), ColumnSpec::new("daily_spend", Decimal)],
            hint: PresentationHint::TimeSeries,
        },
        ReportDefinition {
            key: "monthly-spend",
            name: "Monthly spend trend",
            template: QueryTemplate {
                groupings: vec![Grouping::Month],
                measures: vec![Measure::new(Aggregate::SumNetAmount, "monthly_spend")],
                filters: YEAR_ONLY.to_vec(),
                skip_null_category: false,
                sort: SortKey::Ascending(vec!["month"]),
            },
            columns: vec![
                ColumnSpec::new("month", Date),
                ColumnSpec::new("monthly_spend", Decimal),
            ],
            hint: PresentationHint::TimeSeries,
        },
        ranked(
            "category-spend",
            "Category spend",
            Grouping::Category,
            total_spend,
            ColumnSpec::nullable("category", Text),
            Decimal,
        ),
        ranked(
            "city-spend",
            "City spend",
            Grouping::City,
            total_spend,
            ColumnSpec::new("city", Text),
            Decimal,
        ),
        ranked(
            "vendor-spend",
            "Vendor spend",
            Grouping::Vendor,
            Measure::new(Aggregate::SumNetAmount, "vendor_spend"),
            ColumnSpec::new("vendor_name", Text),
            Decimal,
        ),
        ranked(
            "discount-by-category",
            "Discount by category",
            Grouping::Category,
            Measure::new(Aggregate::AvgDiscount, "avg_discount"),
            ColumnSpec::nullable("category", Text),
            Decimal,
        ),
        ranked(
            "category-transactions",
            "Category transaction count",
            Grouping::Category,
            Measure::new(Aggregate::Count, "transaction_count"),
            ColumnSpec::nullable("category", Text),
            Integer,
        ),
        ReportDefinition {
            key: "year-spend",
            name: "Year-wise spend",
            template: QueryTemplate {
                groupings: vec![Grouping::Year],
                measures: vec![total_spend],
                filters: YEAR_ONLY.to_vec(),
                skip_null_category: false,
                sort: SortKey::Ranked { amount: "total_spend", name: "year" },
            },
            columns: vec![ColumnSpec::new("year", Integer), ColumnSpec::new("total_spend", Decimal)],
            hint: PresentationHint::RankedCategorical,
        },
        ReportDefinition {
            key: "month-vendor-category",
            name: "Month×vendor×category",
            template: QueryTemplate {
                groupings: vec![Grouping::Month, Grouping::Vendor, Grouping::Category],
                measures: vec![total_quantity, total_spend],
                filters: Vec::new(),
                skip_null_category: false,
                sort: SortKey::Ascending(vec!["month", "vendor_name", "category"]),
            },
            columns: vec![
                ColumnSpec::new("month", Date),
                ColumnSpec::new("vendor_name", Text),
                ColumnSpec::nullable("category", Text),
                ColumnSpec::new("total_quantity", Decimal),
                ColumnSpec::new("total_spend", Decimal),
            ],
            hint: PresentationHint::RawTable,
        },
        ReportDefinition {
            key: "year-category",
            name: "Year×category consolidated",
            template: QueryTemplate {
                groupings: vec![Grouping::Year, Grouping::Category],
                measures: vec![total_quantity, total_spend],
                filters: Vec::new(),
                skip_null_category: false,
                sort: SortKey::Ascending(vec!["year", "category"]),
            },
            columns: vec![
                ColumnSpec::new("year", Integer),
                ColumnSpec::nullable("category", Text),
                ColumnSpec::new("total_quantity", Decimal),
                ColumnSpec::new("total_spend", Decimal),
            ],
            hint: PresentationHint::RawTable,
        },
        average_quantity_spend(
            "average-quantity-spend",
            "Average quantity & spend",
            YEAR_MONTH,
            vec![Grouping::Category],
        ),
        average_quantity_spend(
            "average-quantity-spend-yearly",
            "Average quantity & spend (yearly)",
            YEAR_ONLY,
            vec![Grouping::Year, Grouping::Category],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_contents() {
        let catalog = ReportCatalog::standard().unwrap();
        assert_eq!(catalog.len(), 12);
        for name in [
            "Daily spend trend",
            "Category spend",
            "City spend",
            "Vendor spend",
            "Discount by category",
            "Year-wise spend",
            "Month×vendor×category",
            "Year×category consolidated",
            "Average quantity & spend",
        ] {
            assert!(catalog.get(name).is_ok(), "missing report: {name}");
        }
    }

    #[test]
    fn test_standard_set_fails_on_a_duplicate_key() {
        let mut reports = standard_reports();
        let mut copy = reports[0].clone();
        copy.name = "Daily spend (copy)";
        copy.key = "DAILY-SPEND";
        reports.push(copy);

        let mut catalog = ReportCatalog::new();
        let err = reports
            .into_iter()
            .try_for_each(|def| catalog.register(def))
            .unwrap_err();
        assert!(matches!(err, ReportError::DuplicateReport(ref n) if n == "Daily spend (copy)"));
        assert_eq!(catalog.len(), 12);
    }

    #[test]
    fn test_get_by_key_ignores_case() {
        let catalog = ReportCatalog::standard().unwrap();
        assert_eq!(catalog.get("VENDOR-SPEND").unwrap().name, "Vendor spend");
    }

    #[test]
    fn test_get_unknown_report() {
        let catalog = ReportCatalog::standard().unwrap();
        let err = catalog.get("UnknownReport").unwrap_err();
        assert!(matches!(err, ReportError::UnknownReport(ref n) if n == "UnknownReport"));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut catalog = ReportCatalog::standard().unwrap();
        let dup = catalog.get("city-spend").unwrap().clone();
        assert!(matches!(catalog.register(dup), Err(ReportError::DuplicateReport(_))));

        let mut renamed = catalog.get("city-spend").unwrap().clone();
        renamed.name = "Another city report";
        assert!(matches!(catalog.register(renamed), Err(ReportError::DuplicateReport(_))));
    }

    #[test]
    fn test_required_dimensions() {
        let catalog = ReportCatalog::standard().unwrap();
        assert_eq!(catalog.get("daily-spend").unwrap().required(), &[Year, Month]);
        assert_eq!(catalog.get("year-spend").unwrap().required(), &[Year]);
        assert!(catalog.get("year-category").unwrap().required().is_empty());
    }

    #[test]
    fn test_columns_cover_every_select_alias() {
        let catalog = ReportCatalog::standard().unwrap();
        for def in catalog.iter() {
            let t = &def.template;
            let aliases: Vec<&str> = t
                .groupings
                .iter()
                .map(|g| g.alias())
                .chain(t.measures.iter().map(|m| m.alias))
                .collect();
            let cols: Vec<&str> = def.columns.iter().map(|c| c.name).collect();
            assert_eq!(aliases, cols, "column drift in {}", def.key);
        }
    }

    #[test]
    fn test_ranked_reports_break_ties_by_name() {
        let catalog = ReportCatalog::standard().unwrap();
        assert_eq!(
            catalog.get("vendor-spend").unwrap().sort(),
            &SortKey::Ranked { amount: "vendor_spend", name: "vendor_name" }
        );
    }
}
