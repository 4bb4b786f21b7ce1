//! BucketSync CLI - Command-line interface for BucketSync
//!
//! Provides commands for:
//! - Uploading files and directory trees to a bucket
//! - Downloading objects and prefixes
//! - Listing, inspecting and deleting objects
//! - Reading and writing object grants
//! - Inspecting the configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;

use commands::{
    acl::AclCommand, config::ConfigCommand, download::DownloadCommand, ls::LsCommand,
    rm::RmCommand, stat::StatCommand, upload::UploadCommand,
};
use context::{load_config, AppContext};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "bucketsync", version, about = "Mirror local directories to cloud object storage")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a file or a directory tree
    Upload(UploadCommand),
    /// Download an object, or a prefix with --recursive
    Download(DownloadCommand),
    /// List one directory level
    Ls(LsCommand),
    /// Delete an object
    Rm(RmCommand),
    /// Show object metadata
    Stat(StatCommand),
    /// Read and write object grants
    #[command(subcommand)]
    Acl(AclCommand),
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Log level for the `-v` count, falling back to the configured level
fn log_filter(verbose: u8, quiet: bool, configured: &str) -> String {
    match (verbose, quiet) {
        (0, true) => "warn".to_string(),
        (0, false) => configured.to_string(),
        (1, _) => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(filter: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    let (config, config_path) = load_config(cli.config.as_deref())?;
    init_tracing(
        &log_filter(cli.verbose, cli.quiet, &config.logging.level),
        cli.json,
    );

    if let Commands::Config(cmd) = &cli.command {
        return cmd.execute(&config, &config_path, format);
    }

    let ctx = AppContext::connect(config)?;
    match cli.command {
        Commands::Upload(cmd) => cmd.execute(&ctx, format).await,
        Commands::Download(cmd) => cmd.execute(&ctx, format).await,
        Commands::Ls(cmd) => cmd.execute(&ctx, format).await,
        Commands::Rm(cmd) => cmd.execute(&ctx, format).await,
        Commands::Stat(cmd) => cmd.execute(&ctx, format).await,
        Commands::Acl(cmd) => cmd.execute(&ctx, format).await,
        Commands::Config(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = OutputFormat::from_flags(cli.json, cli.quiet);

    if let Err(e) = run(cli, format).await {
        get_formatter(format).error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
