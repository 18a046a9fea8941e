//! Command implementations

use super::OutputFormat;
use crate::analyzer::{CheckOutcome, CheckStatus, PageAnalyzer, Registration, RegistrationStatus, SiteDetail};
use crate::config::AppConfig;
use crate::error::AnalyzerError;
use crate::storage::{Check, DatabaseStats, SiteSummary};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Register a URL
pub fn add(analyzer: &PageAnalyzer, url: &str, format: OutputFormat) -> Result<()> {
    let registration = analyzer.register_site(url)?;

    match format {
        OutputFormat::Json => print_json(&registration),
        OutputFormat::Text => {
            print_registration(&registration);
            Ok(())
        }
    }
}

/// List sites with their latest check
pub fn list(analyzer: &PageAnalyzer, format: OutputFormat) -> Result<()> {
    let sites = analyzer.list_sites()?;

    match format {
        OutputFormat::Json => print_json(&sites),
        OutputFormat::Text => {
            let stats = analyzer.database().stats()?;
            print_sites_text(&sites, &stats);
            Ok(())
        }
    }
}

/// Show a site and its checks
pub fn show(analyzer: &PageAnalyzer, id: i64, format: OutputFormat) -> Result<()> {
    let detail = analyzer.site_detail(id)?;

    match format {
        OutputFormat::Json => print_json(&detail),
        OutputFormat::Text => {
            print_detail_text(&detail);
            Ok(())
        }
    }
}

/// Run a check against a site
pub async fn check(analyzer: &PageAnalyzer, id: i64, format: OutputFormat) -> Result<()> {
    let outcome = analyzer.run_check(id).await?;

    match format {
        OutputFormat::Json => print_json(&outcome),
        OutputFormat::Text => {
            print_outcome_text(&outcome);
            Ok(())
        }
    }
}

/// Delete a site
pub fn remove(analyzer: &PageAnalyzer, id: i64) -> Result<()> {
    analyzer.remove_site(id)?;
    println!("✓ Site {} removed", id);
    Ok(())
}

/// Show the effective configuration, optionally writing it out
pub fn show_config(config: &AppConfig, path: &Path, init: bool) -> Result<()> {
    if init {
        config.save(path)?;
        println!("✓ Configuration written to {:?}", path);
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Process exit code for a command that failed on user input
pub const EXIT_VALIDATION: i32 = 2;

/// Process exit code for a command addressing a site that does not exist
pub const EXIT_NOT_FOUND: i32 = 3;

/// Process exit code for store outages and anything unclassified
pub const EXIT_INTERNAL: i32 = 1;

/// Machine-readable form of a failed command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// `validation`, `not_found` or `internal`
    pub error: &'static str,
    /// Validation reason code, only set for `validation`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub message: String,
    #[serde(skip)]
    pub exit_code: i32,
}

impl ErrorReport {
    /// Classify a command failure
    pub fn from_error(err: &anyhow::Error) -> Self {
        let (error, reason, exit_code) = match err.downcast_ref::<AnalyzerError>() {
            Some(AnalyzerError::Validation(v)) => ("validation", Some(v.reason()), EXIT_VALIDATION),
            Some(AnalyzerError::NotFound(_)) => ("not_found", None, EXIT_NOT_FOUND),
            Some(AnalyzerError::Store(_)) | None => ("internal", None, EXIT_INTERNAL),
        };

        Self {
            error,
            reason,
            message: format!("{:#}", err),
            exit_code,
        }
    }
}

/// Report a failed command and return the exit code to use.
///
/// JSON mode writes the report to stdout so scripts can parse it; text mode
/// writes a one-line message to stderr.
pub fn report_error(err: &anyhow::Error, format: OutputFormat) -> i32 {
    let report = ErrorReport::from_error(err);

    let internal = err
        .downcast_ref::<AnalyzerError>()
        .map_or(true, AnalyzerError::is_internal);
    if internal {
        tracing::error!(error = %report.message, "command failed");
    }

    match format {
        OutputFormat::Json => {
            if print_json(&report).is_err() {
                eprintln!("Error: {}", report.message);
            }
        }
        OutputFormat::Text => eprintln!("Error: {}", report.message),
    }

    report.exit_code
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

fn print_registration(registration: &Registration) {
    let site = &registration.site;
    match registration.status {
        RegistrationStatus::Created => println!("✓ Site added: {} (id {})", site.name, site.id),
        RegistrationStatus::Exists => {
            println!("• Site already exists: {} (id {})", site.name, site.id)
        }
    }
}

fn print_sites_text(sites: &[SiteSummary], stats: &DatabaseStats) {
    if sites.is_empty() {
        println!("No sites registered.");
        return;
    }

    println!("{:<6} {:<40} {:<20} {}", "ID", "NAME", "LAST CHECK", "STATUS");
    for summary in sites {
        let (last_check, status) = match &summary.latest_check {
            Some(check) => (format_time(check), format_status(check)),
            None => (String::new(), String::new()),
        };
        println!(
            "{:<6} {:<40} {:<20} {}",
            summary.site.id, summary.site.name, last_check, status
        );
    }

    println!();
    println!("{} site(s), {} check(s)", stats.sites, stats.checks);
}

fn print_detail_text(detail: &SiteDetail) {
    let site = &detail.site;
    println!("Site #{}: {}", site.id, site.name);
    println!("  Created: {}", site.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!();

    if detail.checks.is_empty() {
        println!("No checks yet.");
        return;
    }

    println!("Checks ({}):", detail.checks.len());
    for check in &detail.checks {
        print_check(check);
    }
}

fn print_outcome_text(outcome: &CheckOutcome) {
    match &outcome.status {
        CheckStatus::Ok => println!("✓ Page checked"),
        CheckStatus::FetchFailed { error } => {
            println!("⚠ Page unreachable ({}): {}", error.kind, error.message)
        }
    }
    print_check(&outcome.check);
}

fn print_check(check: &Check) {
    println!("  #{} at {}  status {}", check.id, format_time(check), format_status(check));
    if !check.h1.is_empty() {
        println!("    h1: {}", check.h1);
    }
    if !check.title.is_empty() {
        println!("    title: {}", check.title);
    }
    if !check.description.is_empty() {
        println!("    description: {}", check.description);
    }
}

fn format_time(check: &Check) -> String {
    check.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_status(check: &Check) -> String {
    check
        .status_code
        .map(|code| code.to_string())
        .unwrap_or_else(|| "unreachable".to_string())
}
