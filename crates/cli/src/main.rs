//! mdatlas CLI
//!
//! Main entry point for the mdatlas command-line tool.
//! Extracts Markdown heading structure and serves sections on demand, either
//! as one-shot commands or as an MCP server over stdio.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    SearchCommand, SectionCommand, ServeCommand, StatsCommand, StructureCommand, TocCommand,
};
use mdatlas_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// mdatlas - Markdown structure extraction and section access
#[derive(Parser, Debug)]
#[command(name = "mdatlas")]
#[command(about = "Markdown structure extraction and section access", long_about = None)]
#[command(version)]
struct Cli {
    /// Base directory documents are resolved against (default: current directory)
    #[arg(short, long, global = true, env = "MDATLAS_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MDATLAS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server over stdio
    Serve(ServeCommand),

    /// Show the heading structure of a file
    Structure(StructureCommand),

    /// Show the content of one section
    Section(SectionCommand),

    /// Search section titles
    Search(SearchCommand),

    /// Show document statistics
    Stats(StatsCommand),

    /// Show a table of contents
    Toc(TocCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration for the selected base directory, then apply CLI overrides
    let config = AppConfig::load_from(cli.base_dir, cli.config)?.with_overrides(
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("mdatlas starting");
    tracing::debug!("Base directory: {:?}", config.base_dir);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Structure(_) => "structure",
        Commands::Section(_) => "section",
        Commands::Search(_) => "search",
        Commands::Stats(_) => "stats",
        Commands::Toc(_) => "toc",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Structure(cmd) => cmd.execute(&config).await,
        Commands::Section(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Toc(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_section_command() {
        let cli = Cli::try_parse_from([
            "mdatlas",
            "--base-dir",
            "/docs",
            "section",
            "guide.md",
            "--section-id",
            "section_abc",
            "--include-children",
            "--format",
            "plain",
        ])
        .unwrap();

        assert_eq!(cli.base_dir, Some(PathBuf::from("/docs")));
        match cli.command {
            Commands::Section(cmd) => {
                assert_eq!(cmd.section_id, "section_abc");
                assert!(cmd.include_children);
                assert_eq!(cmd.format, "plain");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
