use thiserror::Error;
use url::Url;

/// Base used only to check that a relative reference is well formed.
const PROBE_BASE: &str = "http://relative.invalid/";

/// Errors that can occur while validating a feed source URL.
///
/// Variants are ordered by the priority in which they are checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    /// The URL string was empty or only whitespace.
    #[error("no url provided")]
    Blank,
    /// The URL string is neither an absolute URL nor a valid request path.
    #[error("malformed url")]
    Malformed,
    /// The URL string is a valid reference but lacks a scheme.
    #[error("relative url provided")]
    Relative,
}

/// Validates a feed source URL and returns it parsed.
///
/// Accepts anything with a scheme. Request-style references (`/rss/`,
/// `//host/rss`) parse but are rejected as [`UrlValidationError::Relative`];
/// everything else that fails to parse, including strings with a broken
/// scheme such as `http~://host`, is [`UrlValidationError::Malformed`].
///
/// # Examples
///
/// ```
/// use rss_preview::util::{validate_source_url, UrlValidationError};
///
/// assert!(validate_source_url("https://example.tumblr.com/rss").is_ok());
/// assert_eq!(validate_source_url("  "), Err(UrlValidationError::Blank));
/// assert_eq!(validate_source_url("/rss/"), Err(UrlValidationError::Relative));
/// assert_eq!(
///     validate_source_url("http~://google.com"),
///     Err(UrlValidationError::Malformed)
/// );
/// ```
pub fn validate_source_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Blank);
    }

    match Url::parse(trimmed) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // Only request paths count as relative; "foo/bar" and
            // "http~://x" are not valid request targets.
            if !trimmed.starts_with('/') {
                return Err(UrlValidationError::Malformed);
            }
            let base = Url::parse(PROBE_BASE).map_err(|_| UrlValidationError::Malformed)?;
            match base.join(trimmed) {
                Ok(_) => Err(UrlValidationError::Relative),
                Err(_) => Err(UrlValidationError::Malformed),
            }
        }
        Err(_) => Err(UrlValidationError::Malformed),
    }
}
