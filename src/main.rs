use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod definition;
mod matching;
mod report;
mod sample;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("haplomatch=debug,info")
    } else {
        EnvFilter::new("haplomatch=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let result = match &cli.command {
        cli::Commands::Call(args) => cli::call::run(args, cli.format, cli.verbose),
        cli::Commands::Catalog(args) => cli::catalog::run(args, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
