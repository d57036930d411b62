//! File size lookup and formatting.
//!
//! The size is an optional enrichment: [`HeadSizeProbe`] asks the CDN for the
//! `Content-Length` of the resolved link and degrades to [`SizeInfo::Unknown`]
//! on any failure.

use crate::resolver::build_client;
use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Literal rendered when the size could not be determined
pub const UNKNOWN_SIZE: &str = "Unknown";

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Size of a resolved file, if the CDN reported one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeInfo {
    /// Reported byte count
    Known(u64),
    /// No usable size information
    Unknown,
}

impl fmt::Display for SizeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(bytes) => f.write_str(&format_bytes(*bytes)),
            Self::Unknown => f.write_str(UNKNOWN_SIZE),
        }
    }
}

/// Human readable size with two decimals, e.g. `1536` → `"1.50 KB"`.
///
/// The unit is the largest power of 1024 not exceeding the value, capped at TB.
/// Zero is rendered as `"0 B"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut scale: u64 = 1;
    while unit + 1 < UNITS.len() && bytes / scale >= 1024 {
        scale *= 1024;
        unit += 1;
    }

    format!("{:.2} {}", bytes as f64 / scale as f64, UNITS[unit])
}

/// Best-effort size lookup for a direct link
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SizeProbe: Send + Sync {
    /// Size of the file behind `direct_link`, never failing
    async fn probe(&self, direct_link: &str) -> SizeInfo;
}

/// Probe that issues a `HEAD` request and reads `Content-Length`.
pub struct HeadSizeProbe {
    client: Client,
    timeout: Duration,
}

impl HeadSizeProbe {
    /// Create a probe with its own timeout, independent of resolver timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout, user_agent)?,
            timeout,
        })
    }
}

#[async_trait]
impl SizeProbe for HeadSizeProbe {
    async fn probe(&self, direct_link: &str) -> SizeInfo {
        let request = self.client.head(direct_link).send();
        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                debug!(error = %e.without_url(), "Size probe request failed");
                return SizeInfo::Unknown;
            }
            Err(_) => {
                debug!(timeout = ?self.timeout, "HEAD request timed out");
                return SizeInfo::Unknown;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "Size probe got non-success status");
            return SizeInfo::Unknown;
        }

        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or_else(
                || {
                    debug!("Size probe response has no usable Content-Length");
                    SizeInfo::Unknown
                },
                SizeInfo::Known,
            )
    }
}
