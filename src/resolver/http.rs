//! HTTP plumbing shared by the resolver strategies and the size probe.

use super::StrategyError;
use crate::utils::format_http_error;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Largest page or API body read from an upstream
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
/// Largest error body read; only an excerpt ends up in the error message
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

/// Creates a client bounded by `timeout` that identifies as a desktop browser.
///
/// # Errors
///
/// Returns the builder error, e.g. when `user_agent` is not a valid header value.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .default_headers(headers)
        .cookie_store(true)
        .build()
}

/// GET `url` and return the body text of a successful response.
pub(super) async fn fetch_text(
    client: &Client,
    source: &str,
    url: &str,
    timeout: Duration,
) -> Result<String, StrategyError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| StrategyError::from_reqwest(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let body = read_capped(response, MAX_ERROR_BODY_BYTES)
            .await
            .unwrap_or_default();
        return Err(StrategyError::Status(format_http_error(source, status, &body)));
    }

    read_capped(response, MAX_BODY_BYTES)
        .await
        .map_err(|e| StrategyError::from_reqwest(e, timeout))
}

/// Read at most `limit` bytes of the body, dropping the rest.
async fn read_capped(mut response: Response, limit: usize) -> Result<String, reqwest::Error> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        debug!(limit, "Upstream body exceeds read limit, truncating");
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Substitute the percent-encoded source link into an endpoint template.
pub(super) fn endpoint_for(template: &str, source_url: &str) -> String {
    let encoded = urlencoding::encode(source_url);
    if template.contains("{url}") {
        template.replace("{url}", &encoded)
    } else {
        let separator = if template.contains('?') { '&' } else { '?' };
        format!("{template}{separator}url={encoded}")
    }
}
