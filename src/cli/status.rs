use crate::cli::Env;
use crate::error::Result;
use crate::filter::available_years;
use crate::query::{FACT_TABLE, VENDOR_TABLE};
use crate::settings::settings_path;
use crate::source::DataSource;

pub fn run(env: &Env) -> Result<()> {
    println!("Settings:   {}", settings_path().display());
    println!("Warehouse:  {}", env.db_path.display());

    if !env.db_path.exists() {
        println!();
        println!("Warehouse not found. Run `procure demo` to create a sample one.");
        return Ok(());
    }

    let source = env.open_source()?;
    let count = |table: &str| -> Result<String> {
        let result = source.execute(&format!("SELECT count(*) FROM {table}"), &[])?;
        Ok(result
            .rows
            .first()
            .and_then(|r| r.first())
            .map(|v| v.to_string())
            .unwrap_or_default())
    };

    let years = available_years(&source)?;
    println!();
    println!("Vendors:       {}", count(VENDOR_TABLE)?);
    println!("Transactions:  {}", count(FACT_TABLE)?);
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => println!("Years:         {first}–{last}"),
        _ => println!("Years:         (none)"),
    }
    Ok(())
}
