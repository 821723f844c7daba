pub mod config;
pub mod dashboard;
pub mod demo;
pub mod filters;
pub mod report;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::db::SqliteSource;
use crate::error::{ReportError, Result};
use crate::filter::{parse_month, FilterContext};
use crate::settings::{load_settings, warehouse_path, Settings};
use crate::source::DataSource;

#[derive(Parser)]
#[command(name = "procure", about = "Procurement spend reports over the warehouse fact table.")]
pub struct Cli {
    /// Warehouse database file (overrides settings)
    #[arg(long, global = true)]
    pub db: Option<String>,
    /// Log queries and timings to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a sample warehouse with two years of procurement data.
    Demo,
    /// List years that have transactions.
    Years,
    /// List months with transactions in a year.
    Months {
        #[arg(long)]
        year: i32,
    },
    /// List available reports.
    Reports,
    /// Run one report.
    Run {
        /// Report key or name, e.g. category-spend
        report: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output format: table, csv, json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the SQL and bound parameters a report would run.
    Explain {
        report: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// SQL dialect to render: sqlite or snowflake (default: the warehouse's)
        #[arg(long)]
        dialect: Option<String>,
    },
    /// Run every report of a dashboard view.
    Dashboard {
        /// View: monthly or history (default from settings)
        #[arg(long)]
        view: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show warehouse location and row counts.
    Status,
    /// Show or change settings.
    Config {
        /// Default warehouse database file
        #[arg(long)]
        warehouse: Option<String>,
        /// Default dashboard view: monthly or history
        #[arg(long)]
        view: Option<String>,
        /// Currency symbol used in tables
        #[arg(long)]
        currency: Option<String>,
    },
}

#[derive(clap::Args, Clone, Default)]
pub struct FilterArgs {
    /// Year filter: YYYY
    #[arg(long)]
    pub year: Option<i32>,
    /// Month filter: 1-12 or a name such as Mar
    #[arg(long)]
    pub month: Option<String>,
}

/// Command context shared by every subcommand.
pub struct Env {
    pub settings: Settings,
    pub db_path: PathBuf,
}

impl Env {
    pub fn load(db_override: Option<&str>) -> Self {
        let settings = load_settings();
        let db_path = warehouse_path(&settings, db_override);
        Self { settings, db_path }
    }

    pub fn open_source(&self) -> Result<SqliteSource> {
        if !self.db_path.exists() {
            return Err(ReportError::Settings(format!(
                "warehouse not found at {}. Run `procure demo` to create a sample one.",
                self.db_path.display()
            )));
        }
        SqliteSource::open_read_only(&self.db_path)
    }
}

/// Build a filter from CLI flags, validating the month against the data.
pub(crate) fn build_filter(args: &FilterArgs, source: &dyn DataSource) -> Result<FilterContext> {
    let mut ctx = FilterContext::new();
    if let Some(year) = args.year {
        ctx.set_year(year);
    }
    if let Some(month) = &args.month {
        ctx.set_month(parse_month(month)?, source)?;
    }
    Ok(ctx)
}
