//! Multiver CLI - build one project against many host platform versions

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use multiver::resolver::ConfigurationError;
use multiver::util::diagnostic::emit;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color;

    if let Err(e) = run(cli) {
        if let Some(config) = e.downcast_ref::<ConfigurationError>() {
            emit(&config.to_diagnostic(), color);
        } else {
            eprintln!("error: {:#}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("multiver=debug")
    } else {
        EnvFilter::new("multiver=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global = commands::Global {
        verbose: cli.verbose,
        color: !cli.no_color,
        manifest_path: cli.manifest_path,
    };

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &global),
        Commands::BuildAll(args) => commands::build_all::execute(args, &global),
        Commands::Clean(args) => commands::clean::execute(args, &global),
        Commands::Targets(args) => commands::targets::execute(args, &global),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
