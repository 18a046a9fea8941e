//! CLI interface using clap
//!
//! Provides the command-line interface for the page analyzer

mod commands;

pub use commands::*;

use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Page Analyzer - track SEO metadata of web pages over time
#[derive(Parser, Debug)]
#[command(name = "page-analyzer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database (path or sqlite:// URL); overrides the config file
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub database: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a URL (only scheme and host are kept)
    Add(AddArgs),

    /// List registered sites with their latest check
    List,

    /// Show a site and its check history
    Show(SiteArgs),

    /// Fetch a site now and record a check
    Check(SiteArgs),

    /// Delete a site and its check history
    Remove(SiteArgs),

    /// Show or write the configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for add command
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// URL to register
    pub url: String,
}

/// Arguments for commands addressing one site
#[derive(Parser, Debug)]
pub struct SiteArgs {
    /// Site ID
    pub id: i64,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub init: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
