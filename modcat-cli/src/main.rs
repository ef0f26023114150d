//! modcat - browse the marketplace module catalog from the command line

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use modcat_core::config::CatalogConfig;

mod catalog_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "modcat",
    about = "Browse the marketplace module catalog and the actions available for each module",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[clap(long, global = true)]
    log_json: bool,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse the module catalog
    Catalog(catalog_cli::CatalogCommand),

    /// Print the effective configuration
    Config,
}

fn initialize_tracing(log_level: &LogLevel, json: bool) {
    // RUST_LOG directives refine the level given on the command line
    let mut filter = EnvFilter::new(log_level.to_filter_directive());
    if let Ok(env) = std::env::var("RUST_LOG") {
        for directive in env.split(',').filter(|d| !d.is_empty()) {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    // Logs go to stderr; stdout carries command output
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CatalogConfig> {
    match path {
        Some(path) => CatalogConfig::load_from_path(path),
        None => CatalogConfig::load(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.log_json);

    let config = load_config(cli.config.as_ref())?;
    tracing::debug!(locale = %config.locale, "Configuration loaded");

    match cli.command {
        Command::Catalog(command) => command.execute(&config),
        Command::Config => {
            print!("{}", serde_yaml_ng::to_string(&config)?);
            Ok(())
        }
    }
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
    fn test_parse_catalog_list_flags() {
        let cli = Cli::try_parse_from([
            "modcat",
            "--log-level",
            "debug",
            "catalog",
            "list",
            "--search",
            "payment",
            "--json",
        ])
        .unwrap();
        assert!(matches!(cli.log_level, LogLevel::Debug));
        assert!(matches!(cli.command, Command::Catalog(_)));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        assert!(Cli::try_parse_from(["modcat", "--log-level", "loud", "config"]).is_err());
    }
}
