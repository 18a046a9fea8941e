//! The check pipeline
//!
//! [`PageAnalyzer`] composes validation, normalization, the record store, the
//! fetcher and the extractor into the four operations the presentation layer
//! calls: register a site, list sites, show a site, and run a check.

use crate::error::{AnalyzerError, FetchError, StoreError};
use crate::extract::extract_metadata;
use crate::fetch::PageFetcher;
use crate::storage::{Check, Database, NewCheck, Site, SiteSummary};
use crate::urls;
use serde::Serialize;
use std::sync::Arc;

type Result<T> = std::result::Result<T, AnalyzerError>;

/// Whether a registration inserted a new site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Created,
    Exists,
}

/// Result of [`PageAnalyzer::register_site`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub site: Site,
    pub status: RegistrationStatus,
}

/// A site with its full check history, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteDetail {
    pub site: Site,
    pub checks: Vec<Check>,
}

/// Whether the fetch behind a check reached the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    Ok,
    FetchFailed { error: FetchError },
}

/// Result of [`PageAnalyzer::run_check`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub check: Check,
    #[serde(flatten)]
    pub status: CheckStatus,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, CheckStatus::Ok)
    }
}

/// Orchestrates registration and checks over an injected store and fetcher
pub struct PageAnalyzer {
    db: Arc<Database>,
    fetcher: Arc<dyn PageFetcher>,
}

impl PageAnalyzer {
    /// Create a new analyzer
    pub fn new(db: Arc<Database>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { db, fetcher }
    }

    /// Get the underlying store
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Validate, normalize and register a URL.
    ///
    /// A second registration of the same `scheme://host` returns the existing
    /// site with [`RegistrationStatus::Exists`].
    pub fn register_site(&self, raw_url: &str) -> Result<Registration> {
        let url = urls::validate(raw_url)?;
        let name = urls::normalize(&url);

        match self.db.create_site(&name) {
            Ok(site) => {
                tracing::info!(site_id = site.id, name = %site.name, "site registered");
                Ok(Registration {
                    site,
                    status: RegistrationStatus::Created,
                })
            }
            Err(StoreError::Duplicate { .. }) => {
                let site = self
                    .db
                    .find_site_by_name(&name)?
                    .ok_or_else(|| {
                        // Only reachable if the site was deleted between the two statements.
                        AnalyzerError::Store(StoreError::Duplicate { name: name.clone() })
                    })?;
                tracing::info!(site_id = site.id, name = %site.name, "site already registered");
                Ok(Registration {
                    site,
                    status: RegistrationStatus::Exists,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All sites, newest first, each with its latest check
    pub fn list_sites(&self) -> Result<Vec<SiteSummary>> {
        Ok(self.db.list_sites_with_latest_check()?)
    }

    /// One site and its check history
    pub fn site_detail(&self, id: i64) -> Result<SiteDetail> {
        let site = self.db.get_site(id)?;
        let checks = self.db.list_checks(id)?;
        Ok(SiteDetail { site, checks })
    }

    /// Delete a site together with its check history
    pub fn remove_site(&self, id: i64) -> Result<()> {
        self.db.delete_site(id)?;
        tracing::info!(site_id = id, "site removed");
        Ok(())
    }

    /// Fetch the site once and append the result to its history.
    ///
    /// A failed fetch is still recorded, with no status code and empty
    /// metadata, and reported as [`CheckStatus::FetchFailed`]. No store lock
    /// is held while the fetch is in flight.
    pub async fn run_check(&self, site_id: i64) -> Result<CheckOutcome> {
        let site = self.db.get_site(site_id)?;

        let (new_check, status) = match self.fetcher.fetch(&site.name).await {
            Ok(page) => {
                let meta = extract_metadata(&page.body);
                let check = NewCheck {
                    status_code: Some(page.status_code),
                    h1: meta.h1,
                    title: meta.title,
                    description: meta.description,
                };
                (check, CheckStatus::Ok)
            }
            Err(error) => {
                tracing::warn!(site_id, url = %site.name, error = %error, "fetch failed");
                (NewCheck::default(), CheckStatus::FetchFailed { error })
            }
        };

        let check = self.db.create_check(site_id, &new_check)?;
        tracing::info!(
            site_id,
            check_id = check.id,
            status = ?check.status_code,
            "check recorded"
        );

        Ok(CheckOutcome { check, status })
    }
}
