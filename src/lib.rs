//! Page Analyzer - register web pages and record SEO checks over time
//!
//! A submitted URL is normalized to its `scheme://host` identity and stored
//! once. Each check fetches that page, extracts the HTTP status, `<h1>`,
//! `<title>` and meta description, and appends the result to the site's
//! history.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod storage;
pub mod urls;

/// Re-export commonly used types
pub use analyzer::{CheckOutcome, CheckStatus, PageAnalyzer, Registration, RegistrationStatus, SiteDetail};
pub use config::AppConfig;
pub use error::{AnalyzerError, FetchError, FetchErrorKind, StoreError, ValidationError};
pub use extract::{extract_metadata, PageMetadata};
pub use fetch::{FetchResult, HttpFetcher, PageFetcher};
pub use storage::{Check, Database, Site, SiteSummary};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "page-analyzer";
