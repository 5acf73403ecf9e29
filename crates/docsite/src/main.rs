//! Docs site CLI.
//!
//! Provides commands for:
//! - `serve`: Start the docs API server
//! - `tree`: Print the navigation tree of a version
//! - `page`: Resolve a single content file

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{PageArgs, ServeArgs, TreeArgs};
use error::CliError;
use output::Output;

/// Docs site - content resolver and API server.
#[derive(Parser)]
#[command(name = "docsite", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the docs API server.
    Serve(ServeArgs),
    /// Print the navigation tree of a documentation version.
    Tree(TreeArgs),
    /// Resolve a content file and print it as JSON.
    Page(PageArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise RUST_LOG (default WARN)
    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => tokio::runtime::Runtime::new()
            .map_err(CliError::from)
            .and_then(|rt| rt.block_on(args.execute())),
        Commands::Tree(args) => args.execute(),
        Commands::Page(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
