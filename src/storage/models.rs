//! Persisted entities

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered `scheme://host` identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub id: i64,
    /// Normalized URL, unique across all sites
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One immutable fetch-and-extract result for a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub id: i64,
    pub site_id: i64,
    /// `None` when the fetch failed before any response arrived
    pub status_code: Option<u16>,
    pub h1: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Values for a check that has not been written yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCheck {
    pub status_code: Option<u16>,
    pub h1: String,
    pub title: String,
    pub description: String,
}

/// A site paired with its most recent check, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSummary {
    pub site: Site,
    pub latest_check: Option<Check>,
}

/// Row counts across the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub sites: usize,
    pub checks: usize,
}
