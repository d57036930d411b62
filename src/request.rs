//! Input validation for relay requests.
//!
//! Everything here is pure: a request that fails validation never causes a
//! network call.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Rejected user input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// No link supplied
    #[error("URL is required")]
    MissingUrl,
    /// Link is not an absolute http(s) URL
    #[error("URL is not a valid http(s) link")]
    InvalidUrl,
    /// Link does not point at the expected hosting service
    #[error("URL must be a {domain} link")]
    WrongDomain {
        /// Expected hosting domain
        domain: String,
    },
    /// No Telegram id supplied
    #[error("Telegram ID is required")]
    MissingRecipient,
    /// Telegram id is not a number
    #[error("Telegram ID must be numeric")]
    InvalidRecipient,
}

/// Telegram chat id of the user receiving the file details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecipientId(pub i64);

impl RecipientId {
    /// Parse a numeric Telegram id.
    ///
    /// # Errors
    ///
    /// `MissingRecipient` for blank input, `InvalidRecipient` for anything
    /// that is not a plain run of digits.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingRecipient);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidRecipient);
        }
        raw.parse::<i64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidRecipient)
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that `source_url` mentions `hosting_domain` and return it as an
/// absolute http(s) link. A link typed without a scheme gets `https://`.
///
/// # Errors
///
/// Returns the first [`ValidationError`] the link violates.
pub fn validate_source_url(
    source_url: &str,
    hosting_domain: &str,
) -> Result<String, ValidationError> {
    let source_url = source_url.trim();
    if source_url.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    if !source_url.contains(hosting_domain) {
        return Err(ValidationError::WrongDomain {
            domain: hosting_domain.to_string(),
        });
    }

    let normalized = if source_url.contains("://") {
        source_url.to_string()
    } else {
        format!("https://{}", source_url.trim_start_matches('/'))
    };
    match Url::parse(&normalized) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            Ok(normalized)
        }
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// A validated download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    source_url: String,
    recipient: RecipientId,
}

impl SourceRequest {
    /// Validate raw request fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a missing or malformed field.
    pub fn new(
        source_url: Option<&str>,
        recipient: Option<&str>,
        hosting_domain: &str,
    ) -> Result<Self, ValidationError> {
        let source_url = source_url.ok_or(ValidationError::MissingUrl)?;
        let recipient = recipient.ok_or(ValidationError::MissingRecipient)?;

        let source_url = validate_source_url(source_url, hosting_domain)?;
        let recipient = RecipientId::parse(recipient)?;

        Ok(Self {
            source_url,
            recipient,
        })
    }

    /// The MediaFire page link
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Who receives the result
    #[must_use]
    pub const fn recipient(&self) -> RecipientId {
        self.recipient
    }
}
