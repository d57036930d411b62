//! Ordered, first-success-wins orchestration of resolver strategies.

use super::{ApiShape, ApiStrategy, ResolvedFile, ResolverStrategy, ScrapeStrategy, StrategyError};
use crate::config::Settings;
pub use crate::request::ValidationError;
use crate::request::validate_source_url;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result of one strategy attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The strategy produced a usable file
    Success,
    /// The strategy failed, see the record's detail
    Failed,
}

/// One entry of the attempt trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Strategy identifier
    pub strategy: &'static str,
    /// What happened
    pub outcome: AttemptOutcome,
    /// Failure cause, `None` on success
    pub detail: Option<String>,
}

/// Ordered record of the strategies tried for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptTrace {
    records: Vec<AttemptRecord>,
}

impl AttemptTrace {
    fn record_failure(&mut self, strategy: &'static str, error: &StrategyError) {
        self.records.push(AttemptRecord {
            strategy,
            outcome: AttemptOutcome::Failed,
            detail: Some(error.to_string()),
        });
    }

    fn record_success(&mut self, strategy: &'static str) {
        self.records.push(AttemptRecord {
            strategy,
            outcome: AttemptOutcome::Success,
            detail: None,
        });
    }

    /// All records in attempt order
    #[must_use]
    pub fn records(&self) -> &[AttemptRecord] {
        &self.records
    }

    /// Records of failed attempts only
    pub fn failures(&self) -> impl Iterator<Item = &AttemptRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == AttemptOutcome::Failed)
    }

    /// Number of attempts made
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no strategy was tried
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Detail of the most recent failure
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.failures().last().and_then(|r| r.detail.as_deref())
    }
}

/// A resolved file plus the trace that led to it
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved file
    pub file: ResolvedFile,
    /// Attempts made, for diagnostics only
    pub trace: AttemptTrace,
}

/// Why resolution produced no file
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The link was rejected before any strategy ran
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Every strategy failed
    #[error("all resolver strategies failed, last error: {last_error}")]
    Exhausted {
        /// Detail of the last failed attempt
        last_error: String,
        /// Every attempt in order
        trace: AttemptTrace,
    },
}

/// Tries strategies in declared order and returns the first usable file.
pub struct ResolutionPipeline {
    hosting_domain: String,
    strategies: Vec<Arc<dyn ResolverStrategy>>,
    attempt_timeout: Duration,
}

impl ResolutionPipeline {
    /// Create a pipeline over `strategies`, highest priority first.
    #[must_use]
    pub fn new(
        hosting_domain: impl Into<String>,
        strategies: Vec<Arc<dyn ResolverStrategy>>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            hosting_domain: hosting_domain.into(),
            strategies,
            attempt_timeout,
        }
    }

    /// Standard pipeline: result-list API, status-envelope API, the optional
    /// flat API, then page scraping.
    ///
    /// # Errors
    ///
    /// Returns an error if a strategy's HTTP client cannot be built, e.g. for
    /// an invalid `user_agent`.
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let timeout = settings.resolver_timeout();
        let ua = settings.user_agent.as_str();

        let mut strategies: Vec<Arc<dyn ResolverStrategy>> = vec![
            Arc::new(ApiStrategy::new(
                "vreden",
                settings.result_list_api_url.as_str(),
                ApiShape::ResultList,
                timeout,
                ua,
            )?),
            Arc::new(ApiStrategy::new(
                "siputzx",
                settings.status_envelope_api_url.as_str(),
                ApiShape::StatusEnvelope,
                timeout,
                ua,
            )?),
        ];
        if let Some(flat) = settings.flat_api_url.as_deref() {
            strategies.push(Arc::new(ApiStrategy::new(
                "flat-api",
                flat,
                ApiShape::Flat,
                timeout,
                ua,
            )?));
        }
        strategies.push(Arc::new(ScrapeStrategy::new(timeout, ua)?));

        Ok(Self::new(settings.hosting_domain.as_str(), strategies, timeout))
    }

    /// Identifiers of the registered strategies, in priority order
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Domain every source link must belong to
    #[must_use]
    pub fn hosting_domain(&self) -> &str {
        &self.hosting_domain
    }

    /// Resolve `source_url` to a direct link.
    ///
    /// The link is validated before any strategy runs. Strategies are tried
    /// one at a time; the first one returning a non-empty link wins and the
    /// rest are skipped.
    ///
    /// # Errors
    ///
    /// `Validation` for a rejected link, `Exhausted` when every strategy failed.
    pub async fn resolve(&self, source_url: &str) -> Result<Resolution, ResolveError> {
        let source_url = validate_source_url(source_url, &self.hosting_domain)?;

        let mut trace = AttemptTrace::default();
        for strategy in &self.strategies {
            let name = strategy.name();
            debug!(strategy = name, url = %source_url, "Trying resolver strategy");

            let attempt = tokio::time::timeout(self.attempt_timeout, strategy.attempt(&source_url))
                .await
                .unwrap_or(Err(StrategyError::Timeout(self.attempt_timeout)));

            match attempt.and_then(require_link) {
                Ok(file) => {
                    info!(strategy = name, file = %file.display_name, "Resolved MediaFire link");
                    trace.record_success(name);
                    return Ok(Resolution { file, trace });
                }
                Err(e) => {
                    warn!(strategy = name, error = %e, "Resolver strategy failed");
                    trace.record_failure(name, &e);
                }
            }
        }

        let last_error = trace
            .last_error()
            .unwrap_or("no resolver strategies configured")
            .to_string();
        Err(ResolveError::Exhausted { last_error, trace })
    }
}

fn require_link(file: ResolvedFile) -> Result<ResolvedFile, StrategyError> {
    if file.direct_link.trim().is_empty() {
        Err(StrategyError::NotFound("empty download link".into()))
    } else {
        Ok(file)
    }
}
