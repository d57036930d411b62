//! Third-party resolver APIs.
//!
//! Each upstream answers with its own JSON layout. [`ApiShape`] tags which
//! layout an endpoint speaks and owns the normalizer that maps it onto
//! [`ResolvedFile`].

use super::http::{build_client, endpoint_for, fetch_text};
use super::{ResolvedFile, ResolverStrategy, StrategyError};
use crate::utils::{looks_like_html, truncate_str};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const NAME_KEYS_LIST: &[&str] = &["nama", "name", "filename", "fileName"];
const NAME_KEYS_ENVELOPE: &[&str] = &["fileName", "filename", "file_name", "name"];
const LINK_KEYS_ENVELOPE: &[&str] = &["downloadLink", "download_link", "link", "url"];
const NAME_KEYS_FLAT: &[&str] = &["filename", "fileName", "name", "title"];
const LINK_KEYS_FLAT: &[&str] = &["link", "download_url", "downloadLink", "url"];

/// Response layout of a resolver API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiShape {
    /// `{ "result": [ { "nama", "link" }, ... ] }`, first entry wins
    ResultList,
    /// `{ "status": true, "data": { "fileName", "downloadLink" } }`
    StatusEnvelope,
    /// `{ "link": ..., "filename": ... }` at the top level
    Flat,
}

impl ApiShape {
    /// Map a decoded response body onto a [`ResolvedFile`].
    ///
    /// # Errors
    ///
    /// `NotFound` when the body is well-formed but empty or negative,
    /// `Parse` when it does not have this shape at all.
    pub fn normalize(self, body: &Value) -> Result<ResolvedFile, StrategyError> {
        match self {
            Self::ResultList => normalize_result_list(body),
            Self::StatusEnvelope => normalize_status_envelope(body),
            Self::Flat => normalize_flat(body),
        }
    }
}

fn normalize_result_list(body: &Value) -> Result<ResolvedFile, StrategyError> {
    let entries = match body.get("result") {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => {
            return Err(StrategyError::NotFound("response has no result".into()))
        }
        Some(other) => {
            return Err(StrategyError::Parse(format!(
                "`result` is not a list: {}",
                excerpt(other)
            )))
        }
    };

    let first = entries
        .first()
        .ok_or_else(|| StrategyError::NotFound("result list is empty".into()))?;

    ResolvedFile::from_parts(first_str(first, NAME_KEYS_LIST), first_str(first, &["link"]))
}

fn normalize_status_envelope(body: &Value) -> Result<ResolvedFile, StrategyError> {
    if !body.get("status").is_some_and(is_truthy) {
        let reason = first_str(body, &["message", "msg", "error"]).unwrap_or("status is not true");
        return Err(StrategyError::NotFound(reason.to_string()));
    }

    let file = ["data", "result"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find(|value| value.is_object())
        .ok_or_else(|| StrategyError::NotFound("response has no file object".into()))?;

    ResolvedFile::from_parts(
        first_str(file, NAME_KEYS_ENVELOPE),
        first_str(file, LINK_KEYS_ENVELOPE),
    )
}

fn normalize_flat(body: &Value) -> Result<ResolvedFile, StrategyError> {
    if !body.is_object() {
        return Err(StrategyError::Parse(format!(
            "expected an object, got {}",
            excerpt(body)
        )));
    }
    ResolvedFile::from_parts(first_str(body, NAME_KEYS_FLAT), first_str(body, LINK_KEYS_FLAT))
}

/// First non-empty string found under any of `keys`, in order.
fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => matches!(n.as_u64(), Some(1 | 200)),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "ok" | "success"),
        _ => false,
    }
}

fn excerpt(value: &Value) -> String {
    truncate_str(value.to_string(), 120)
}

/// Resolver backed by a JSON API endpoint.
pub struct ApiStrategy {
    name: &'static str,
    endpoint: String,
    shape: ApiShape,
    client: Client,
    timeout: Duration,
}

impl ApiStrategy {
    /// Create a strategy for `endpoint` (a template with a `{url}` placeholder).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        name: &'static str,
        endpoint: impl Into<String>,
        shape: ApiShape,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            name,
            endpoint: endpoint.into(),
            shape,
            client: build_client(timeout, user_agent)?,
            timeout,
        })
    }

    /// Layout this endpoint is parsed as
    #[must_use]
    pub const fn shape(&self) -> ApiShape {
        self.shape
    }
}

#[async_trait]
impl ResolverStrategy for ApiStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn attempt(&self, source_url: &str) -> Result<ResolvedFile, StrategyError> {
        let url = endpoint_for(&self.endpoint, source_url);
        debug!(strategy = self.name, timeout_secs = self.timeout.as_secs(), "Resolver API request");

        let text = fetch_text(&self.client, self.name, &url, self.timeout).await?;
        if looks_like_html(&text) {
            return Err(StrategyError::Parse("API returned an HTML page".into()));
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            StrategyError::Parse(format!("invalid JSON ({e}): {}", truncate_str(&text, 120)))
        })?;

        self.shape.normalize(&body)
    }
}
