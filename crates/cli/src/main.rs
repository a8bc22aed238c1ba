//! contractgen - compile service documents into client data contracts.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod common;
mod compile;
mod revivers;

#[derive(Parser)]
#[command(
    name = "contractgen",
    version,
    about = "Compile service documents into client data contracts"
)]
struct Cli {
    /// Log discovery and naming decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a service document into a contract model (JSON)
    Compile(compile::CompileArgs),
    /// Print the synthesized revival expressions
    Revivers(revivers::Revivers),
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "contractgen=debug"
    } else {
        "contractgen=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match cli.command {
        Commands::Compile(args) => compile::run(args),
        Commands::Revivers(args) => revivers::run(args),
    };
    std::process::exit(code);
}
