//! Error taxonomy for the check pipeline
//!
//! Every failure the core can produce is classified here. Only
//! [`StoreError::Database`] and [`StoreError::LockPoisoned`] represent
//! infrastructure outages; everything else is an expected, recoverable
//! outcome the caller can act on.

use serde::Serialize;
use thiserror::Error;

/// Rejected user input, raised before any store or network access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    #[error("URL is required")]
    Required,
    #[error("URL is not a valid absolute http(s) URL")]
    InvalidFormat,
    #[error("URL is longer than 255 characters")]
    TooLong,
}

impl ValidationError {
    /// Machine-readable reason code
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidFormat => "invalid_format",
            Self::TooLong => "too_long",
        }
    }
}

/// Why an outbound fetch could not produce a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Timeout,
    Dns,
    Connection,
    Tls,
    HttpError,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Dns => "dns",
            Self::Connection => "connection",
            Self::Tls => "tls",
            Self::HttpError => "http_error",
        };
        f.write_str(s)
    }
}

/// The request never yielded an HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("fetch failed ({kind}): {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Record store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("site already exists: {name}")]
    Duplicate { name: String },

    #[error("site not found: {id}")]
    NotFound { id: i64 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database handle poisoned by a panicked writer")]
    LockPoisoned,
}

/// Errors surfaced by [`crate::PageAnalyzer`] to the presentation layer
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("site not found: {0}")]
    NotFound(i64),

    #[error("internal error: {0}")]
    Store(StoreError),
}

impl AnalyzerError {
    /// Whether this is an infrastructure failure rather than a user-facing outcome
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<StoreError> for AnalyzerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}
