mod cli;

use anyhow::Result;
use clap::Parser;
use cli::handlers::{self, RunArgs};
use cli::{Cli, Commands};
use colored::Colorize;
use priceforecast::config::AppConfig;
use priceforecast::error::{describe_error, ForecastError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), user_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            horizon,
            series,
            annual_inflation,
            country,
            catalog,
            xlsx,
            document,
            pdf,
            json,
            combined,
            sequential,
            title,
            decimals,
        } => {
            let args = RunArgs {
                input,
                horizon,
                series,
                annual_inflation,
                country,
                catalog,
                xlsx,
                document,
                pdf,
                json,
                combined,
                sequential,
                title,
                decimals,
            };
            handlers::handle_run(&args, &config)
        }
        Commands::Template { path } => handlers::handle_template(&path),
        Commands::Describe {
            input,
            save_catalog,
        } => handlers::handle_describe(&input, save_catalog.as_deref()),
    }
}

/// Core errors get their user-facing wording; anything else shows the context chain
fn user_message(err: &anyhow::Error) -> String {
    match err.chain().find_map(|e| e.downcast_ref::<ForecastError>()) {
        Some(forecast_err) => describe_error(forecast_err),
        None => format!("{:#}", err),
    }
}
