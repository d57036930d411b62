//! Small shared helpers: UTF-8 safe truncation, upstream error summaries and
//! the retry wrapper used for Telegram sends.

use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

/// Longest upstream body excerpt kept in an error message
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use mediafire_relay::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Returns true when a response body looks like an HTML page rather than data.
#[must_use]
pub fn looks_like_html(body: &str) -> bool {
    let trimmed = body.trim_start();
    trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<!doctype")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<HTML")
}

/// Summarizes a failed upstream response for logs and diagnostics.
///
/// HTML error pages from proxies are reduced to the status line, other bodies
/// are truncated to [`MAX_ERROR_BODY_CHARS`].
#[must_use]
pub fn format_http_error(source: &str, status: reqwest::StatusCode, body: &str) -> String {
    if looks_like_html(body) {
        return format!("{source} error: {status} (HTML error page)");
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("{source} error: {status}");
    }

    let excerpt = if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        format!("{}... (truncated)", truncate_str(trimmed, MAX_ERROR_BODY_CHARS))
    } else {
        trimmed.to_string()
    };
    format!("{source} error: {status} - {excerpt}")
}

/// Retry a Telegram API operation with exponential backoff while `should_retry`
/// accepts the error.
///
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max retries: 3 (constants in `config.rs`)
///
/// # Errors
///
/// Returns the last error once retries are exhausted or the error is not retryable.
pub async fn retry_telegram_operation<F, Fut, T, E, C>(operation: F, should_retry: C) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: FnMut(&E) -> bool,
    E: std::fmt::Display,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    RetryIf::spawn(retry_strategy, operation, should_retry)
        .await
        .map_err(|e| {
            warn!("Telegram API operation failed: {e}");
            e
        })
}
