//! Input validation for submitted URLs

use super::normalize;
use crate::error::ValidationError;
use url::Url;

/// Longest URL accepted, matching the `sites.name` column limit
pub const MAX_URL_LENGTH: usize = 255;

/// Validate a raw user-supplied URL and return its parsed form.
///
/// Checks run in order: empty input, absolute `http`/`https` URL with a host,
/// then length of both the input and its normalized form. Surrounding
/// whitespace is ignored.
pub fn validate(raw: &str) -> Result<Url, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Required);
    }

    let url = Url::parse(raw).map_err(|_| ValidationError::InvalidFormat)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidFormat);
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(ValidationError::InvalidFormat),
    }

    // Punycode can make the stored identity longer than the input.
    if raw.chars().count() > MAX_URL_LENGTH || normalize(&url).len() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong);
    }

    Ok(url)
}
