//! BlockFund CLI argument parsing and dispatch

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;

use lib_funding::load_config;

use crate::commands;
use crate::output::{ConsoleOutput, Output, OutputFormat};

/// Replay funding commands against a configured engine
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "blockfund")]
pub struct BlockfundCli {
    /// Engine configuration file (TOML)
    #[arg(short, long, env = "BLOCKFUND_CONFIG")]
    pub config: PathBuf,

    /// Output format (json, table)
    #[arg(short, long, default_value = "table", env = "BLOCKFUND_FORMAT")]
    pub format: String,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: BlockfundCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum BlockfundCommand {
    /// Parse and validate the configuration, print derived accounts
    Validate,

    /// Run a JSON command script and print outcomes and the final summary
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Script file: a JSON array of `{ "caller": "0x…", "op": "…", … }`
    #[arg(short, long)]
    pub script: PathBuf,

    /// Continue past failed steps instead of stopping at the first one
    #[arg(long)]
    pub keep_going: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    // stdout carries command output; logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_cli() -> Result<()> {
    let cli = BlockfundCli::parse();
    init_logging(cli.verbose);
    dispatch(&cli, &ConsoleOutput)
}

/// Execute a parsed command line against `output`
pub fn dispatch(cli: &BlockfundCli, output: &dyn Output) -> Result<()> {
    let format: OutputFormat = cli.format.parse()?;
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    match &cli.command {
        BlockfundCommand::Validate => commands::validate::handle_validate(&config, format, output)?,
        BlockfundCommand::Run(args) => commands::run::handle_run(&config, args, format, output)?,
    }
    Ok(())
}
