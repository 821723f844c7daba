use colored::Colorize;

use crate::catalog::ReportCatalog;
use crate::cli::{build_filter, Env, FilterArgs};
use crate::dashboard::{refresh, DashboardState, View};
use crate::error::Result;
use crate::executor::ReportExecutor;
use crate::filter::month_name;
use crate::query::Dimension;
use crate::render::render_text;

pub fn run(env: &Env, view: Option<&str>, filter: &FilterArgs) -> Result<()> {
    let view: View = view.unwrap_or(env.settings.default_view.as_str()).parse()?;
    let source = env.open_source()?;
    let catalog = ReportCatalog::standard()?;
    let mut ctx = build_filter(filter, &source)?;
    ctx.default_year(&source)?;
    if view.requires(&catalog, Dimension::Month) {
        ctx.default_month(&source)?;
    }
    let exec = ReportExecutor::new(&catalog, &source);

    let mut state = DashboardState::new();
    state.apply(refresh(&exec, view, ctx.snapshot()), &ctx);
    let Some(current) = state.current() else {
        return Ok(());
    };

    let scope = match (ctx.year(), ctx.month()) {
        (Some(y), Some(m)) => format!("{} {y}", month_name(m)?),
        (Some(y), None) => y.to_string(),
        _ => "all years".to_string(),
    };
    println!("{}", format!("Procurement Analysis — {} ({scope})", current.view).bold());

    let mut failed = 0;
    for panel in &current.panels {
        println!();
        match &panel.outcome {
            Ok(result) => println!("{}", render_text(result, &env.settings.currency_symbol)),
            Err(e) => {
                failed += 1;
                println!("{}\n{}", panel.report.bold(), e.to_string().red());
            }
        }
    }
    if failed > 0 {
        eprintln!("\n{failed} report(s) could not be shown.");
    }
    Ok(())
}
