mod catalog;
mod cli;
mod dashboard;
mod db;
mod error;
mod executor;
mod filter;
mod fmt;
mod models;
mod query;
mod render;
mod settings;
mod source;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, Env};

/// Log filter comes from PROCURE_LOG, else `debug` with -v, else `warn`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("PROCURE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let env = Env::load(cli.db.as_deref());

    let result = match cli.command {
        Commands::Demo => cli::demo::run(&env.db_path),
        Commands::Years => cli::filters::years(&env),
        Commands::Months { year } => cli::filters::months(&env, year),
        Commands::Reports => cli::report::list(),
        Commands::Run {
            report,
            filter,
            format,
        } => cli::report::run(&env, &report, &filter, &format),
        Commands::Explain {
            report,
            filter,
            dialect,
        } => cli::report::explain(&env, &report, &filter, dialect.as_deref()),
        Commands::Dashboard { view, filter } => {
            cli::dashboard::run(&env, view.as_deref(), &filter)
        }
        Commands::Status => cli::status::run(&env),
        Commands::Config {
            warehouse,
            view,
            currency,
        } => cli::config::run(warehouse, view, currency),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
