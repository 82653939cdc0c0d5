//! Folio CLI - Markdown blog renderer.
//!
//! Provides commands for:
//! - `render`: Render one document as JSON or HTML
//! - `toc`: Print a document's table of contents
//! - `list`: List documents, newest first
//! - `check`: Render every document and report problems

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, ListArgs, RenderArgs, TocArgs};
use output::Output;

/// Folio - Markdown blog renderer.
#[derive(Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a document to stdout.
    Render(RenderArgs),
    /// Print the table of contents of a document.
    Toc(TocArgs),
    /// List documents, newest first.
    List(ListArgs),
    /// Render all documents and report failures and diagnostics.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Toc(args) => args.execute(),
        Commands::List(args) => args.execute(),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_with_format() {
        let cli = Cli::try_parse_from(["folio", "render", "setup", "--format", "html", "-v"])
            .unwrap();

        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn test_render_requires_slug() {
        assert!(Cli::try_parse_from(["folio", "render"]).is_err());
    }
}
