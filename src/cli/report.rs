use comfy_table::{Cell, Table};

use crate::catalog::ReportCatalog;
use crate::cli::{build_filter, Env, FilterArgs};
use crate::error::Result;
use crate::executor::ReportExecutor;
use crate::query::dialect_named;
use crate::render::{render, Format};
use crate::source::DataSource;

pub fn list() -> Result<()> {
    let catalog = ReportCatalog::standard()?;
    let mut table = Table::new();
    table.set_header(vec!["Key", "Report", "Filters", "Presentation"]);
    for def in catalog.iter() {
        let filters: Vec<String> = def.required().iter().map(|d| d.to_string()).collect();
        table.add_row(vec![
            Cell::new(def.key),
            Cell::new(def.name),
            Cell::new(if filters.is_empty() { "—".to_string() } else { filters.join(", ") }),
            Cell::new(def.hint),
        ]);
    }
    println!("{table}");
    println!("{} reports", catalog.len());
    Ok(())
}

pub fn run(env: &Env, report: &str, filter: &FilterArgs, format: &str) -> Result<()> {
    let format: Format = format.parse()?;
    let source = env.open_source()?;
    let ctx = build_filter(filter, &source)?;
    let catalog = ReportCatalog::standard()?;
    let exec = ReportExecutor::new(&catalog, &source);
    let result = exec.run(report, &ctx.snapshot())?;
    println!("{}", render(&result, format, &env.settings.currency_symbol)?);
    Ok(())
}

pub fn explain(env: &Env, report: &str, filter: &FilterArgs, dialect: Option<&str>) -> Result<()> {
    let source = env.open_source()?;
    let dialect = match dialect {
        Some(name) => dialect_named(name)?,
        None => source.dialect(),
    };
    let ctx = build_filter(filter, &source)?;
    let catalog = ReportCatalog::standard()?;
    let exec = ReportExecutor::new(&catalog, &source);
    let bound = exec.explain(report, &ctx.snapshot(), dialect)?;
    println!("-- {}", dialect.name());
    println!("{}", bound.sql);
    for (i, p) in bound.params.iter().enumerate() {
        println!("  {} = {p}", dialect.placeholder(i + 1));
    }
    Ok(())
}
