//! Appdeck - application catalog installer
//!
//! Installs Windows applications declared in a JSON catalog: dependency
//! resolution into an ordered plan, verified downloads through a
//! content-addressed cache, silent installer execution, and a durable
//! record of what is installed.

use clap::Parser;

mod cancel;
mod catalog;
mod cli;
mod commands;
mod download;
mod error;
mod hash;
mod manager;
mod planner;
mod progress;
mod runner;
mod state;
mod version;

use cli::{Cli, Commands};
use commands::helpers::Globals;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let globals = Globals {
        catalog: cli.catalog,
        cache_dir: cli.cache_dir,
        state_file: cli.state_file,
    };

    let result = match cli.command {
        Commands::Plan(args) => commands::plan::run(&globals, &args),
        Commands::Install(args) => commands::install::run(&globals, &args),
        Commands::Uninstall(args) => commands::uninstall::run(&globals, &args),
        Commands::Status(args) => commands::status::run(&globals, &args),
        Commands::Cache(args) => commands::cache::run(&globals, &args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(&args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
