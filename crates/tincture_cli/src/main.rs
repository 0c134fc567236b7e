#![forbid(unsafe_code)]

//! # Tincture CLI
//!
//! Command-line front end for the `tincture` theme engine.
//!
//! ## Usage
//!
//! ```bash
//! tincture validate theme.json      # Print issues, exit 1 if invalid
//! tincture score theme.toml         # Contrast report and health grade
//! tincture vars theme.yaml          # :root { --theme-*: ...; }
//! tincture default                  # The built-in default theme
//! ```

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tincture::EngineConfig;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn init_logging(cli: &Cli) {
    let filter = match cli.log_directive() {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_logging(&cli);
    let config = load_config(&cli)?;

    match &cli.command {
        Command::Validate(args) => commands::validate(args, &config),
        Command::Score(args) => commands::score(args, &config),
        Command::Vars(args) => commands::vars(args, &config),
        Command::Compress(args) => commands::compress_file(args),
        Command::Decompress(args) => commands::decompress_file(args),
        Command::List(args) => commands::list(args).await,
        Command::Default => commands::default_theme(),
    }
}
