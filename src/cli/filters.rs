use crate::cli::Env;
use crate::error::Result;
use crate::filter::{available_years, month_name, FilterContext};

pub fn years(env: &Env) -> Result<()> {
    let source = env.open_source()?;
    let years = available_years(&source)?;
    if years.is_empty() {
        println!("No transactions found.");
    }
    for y in years {
        println!("{y}");
    }
    Ok(())
}

pub fn months(env: &Env, year: i32) -> Result<()> {
    let source = env.open_source()?;
    let mut ctx = FilterContext::for_year(year);
    let months = ctx.available_months(&source)?;
    if months.is_empty() {
        println!("No transactions in {year}.");
    }
    for &m in months {
        println!("{m:>2}  {}", month_name(m)?);
    }
    Ok(())
}
