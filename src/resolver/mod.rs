//! MediaFire link resolution.
//!
//! A [`ResolverStrategy`] turns a MediaFire page link into a [`ResolvedFile`].
//! The [`ResolutionPipeline`] tries the configured strategies in priority
//! order (resolver APIs first, page scraping last) and stops at the first
//! usable result.

mod api;
mod http;
mod pipeline;
mod scrape;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use api::{ApiShape, ApiStrategy};
pub use http::build_client;
pub use pipeline::{
    AttemptOutcome, AttemptRecord, AttemptTrace, Resolution, ResolutionPipeline, ResolveError,
    ValidationError,
};
pub use scrape::ScrapeStrategy;

/// Name used when the upstream does not report one
pub const DEFAULT_FILE_NAME: &str = "file.zip";

/// A direct download link together with the file's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Human readable file name, percent-decoded
    pub display_name: String,
    /// Link that serves the file bytes directly
    pub direct_link: String,
}

impl ResolvedFile {
    /// Build from raw upstream fields.
    ///
    /// The name is percent-decoded and falls back to [`DEFAULT_FILE_NAME`];
    /// a missing or blank link is a [`StrategyError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns `StrategyError::NotFound` when `direct_link` is absent or empty.
    pub fn from_parts(
        display_name: Option<&str>,
        direct_link: Option<&str>,
    ) -> Result<Self, StrategyError> {
        let direct_link = direct_link
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .ok_or_else(|| StrategyError::NotFound("response carries no download link".into()))?;

        Ok(Self {
            display_name: decode_display_name(display_name),
            direct_link: direct_link.to_string(),
        })
    }
}

/// Percent-decode a file name, keeping the raw text when it is not valid
/// percent-encoding and substituting [`DEFAULT_FILE_NAME`] for blank input.
#[must_use]
pub fn decode_display_name(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|name| !name.is_empty()) else {
        return DEFAULT_FILE_NAME.to_string();
    };

    let decoded = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned());
    let decoded = decoded.trim();
    if decoded.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        decoded.to_string()
    }
}

/// Why a single strategy attempt produced no file
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyError {
    /// Upstream answered but had no usable file for the link
    #[error("not found: {0}")]
    NotFound(String),
    /// The attempt exceeded its time budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Connection, TLS or body read failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Upstream answered with a non-success status
    #[error("{0}")]
    Status(String),
    /// Upstream body did not have the expected shape
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl StrategyError {
    /// Classify a reqwest failure, keeping timeouts distinct.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::Parse(err.without_url().to_string())
        } else {
            // The source URL is already in the trace
            Self::Transport(err.without_url().to_string())
        }
    }
}

/// One self-contained way of resolving a MediaFire link.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResolverStrategy: Send + Sync {
    /// Identifier used in logs and the attempt trace
    fn name(&self) -> &'static str;

    /// Try to resolve `source_url` into a direct link
    async fn attempt(&self, source_url: &str) -> Result<ResolvedFile, StrategyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_percent_encoded_name() {
        assert_eq!(
            decode_display_name(Some("My%20Game%20%28v1.2%29.zip")),
            "My Game (v1.2).zip"
        );
    }

    #[test]
    fn test_decode_keeps_invalid_encoding() {
        // %FF alone is not valid UTF-8 once decoded
        assert_eq!(decode_display_name(Some("broken%FF.rar")), "broken%FF.rar");
    }

    #[test]
    fn test_decode_falls_back_to_placeholder() {
        assert_eq!(decode_display_name(None), DEFAULT_FILE_NAME);
        assert_eq!(decode_display_name(Some("   ")), DEFAULT_FILE_NAME);
        assert_eq!(decode_display_name(Some("%20")), DEFAULT_FILE_NAME);
    }

    #[test]
    fn test_from_parts_requires_link() {
        assert!(matches!(
            ResolvedFile::from_parts(Some("a.zip"), None),
            Err(StrategyError::NotFound(_))
        ));
        assert!(matches!(
            ResolvedFile::from_parts(Some("a.zip"), Some("  ")),
            Err(StrategyError::NotFound(_))
        ));
    }

    #[test]
    fn test_from_parts_trims_link() -> Result<(), StrategyError> {
        let file = ResolvedFile::from_parts(None, Some(" https://download1.mediafire.com/x/a.zip "))?;
        assert_eq!(file.direct_link, "https://download1.mediafire.com/x/a.zip");
        assert_eq!(file.display_name, DEFAULT_FILE_NAME);
        Ok(())
    }
}
