//! Page Analyzer - SEO check history for web pages
//!
//! Entry point: loads configuration, opens the store once and hands it to
//! the analyzer together with the HTTP fetcher.

use anyhow::{Context, Result};
use page_analyzer::cli::{add, check, list, remove, report_error, show, show_config, Cli, Commands};
use page_analyzer::{AppConfig, Database, HttpFetcher, PageAnalyzer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging; RUST_LOG takes precedence over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let format = cli.format;
    if let Err(err) = run(cli).await {
        std::process::exit(report_error(&err, format));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load_or_default(&cli.config)?.with_database_url(cli.database.clone());

    if let Commands::Config(args) = &cli.command {
        return show_config(&config, &cli.config, args.init);
    }

    config.ensure_database_dir()?;
    let db = Database::connect(&config.database_url)
        .with_context(|| format!("Failed to open database {:?}", config.database_url))?;
    let fetcher = HttpFetcher::new(config.fetcher_config())?;
    let analyzer = PageAnalyzer::new(Arc::new(db), Arc::new(fetcher));

    // Execute command
    match cli.command {
        Commands::Add(args) => add(&analyzer, &args.url, cli.format)?,
        Commands::List => list(&analyzer, cli.format)?,
        Commands::Show(args) => show(&analyzer, args.id, cli.format)?,
        Commands::Check(args) => check(&analyzer, args.id, cli.format).await?,
        Commands::Remove(args) => remove(&analyzer, args.id)?,
        Commands::Config(_) => {}
    }

    Ok(())
}
