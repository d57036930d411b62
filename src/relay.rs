//! One relay request end to end: resolve, probe the size, notify the user.

use crate::notify::{FileNotice, NotifyError, NotifySink};
use crate::request::{SourceRequest, ValidationError};
use crate::resolver::{ResolutionPipeline, ResolveError};
use crate::size::SizeProbe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Why a relay request failed
#[derive(Debug, Error)]
pub enum RelayError {
    /// Bad input, nothing was attempted
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Every resolver strategy failed
    #[error("file could not be resolved: {last_error}")]
    NotFound {
        /// Detail of the last strategy failure
        last_error: String,
    },
    /// The user has not started a chat with the bot
    #[error("recipient unreachable: {0}")]
    RecipientUnreachable(String),
    /// Notification failed for another reason
    #[error("notification failed: {0}")]
    Notify(String),
}

impl From<ResolveError> for RelayError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Validation(e) => Self::Validation(e),
            ResolveError::Exhausted { last_error, .. } => Self::NotFound { last_error },
        }
    }
}

impl From<NotifyError> for RelayError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::RecipientUnreachable(detail) => Self::RecipientUnreachable(detail),
            NotifyError::Delivery(detail) => Self::Notify(detail),
        }
    }
}

/// Resolves links and relays the result to Telegram.
#[derive(Clone)]
pub struct RelayService {
    pipeline: Arc<ResolutionPipeline>,
    probe: Arc<dyn SizeProbe>,
    notifier: Arc<dyn NotifySink>,
}

impl RelayService {
    /// Assemble the service from its collaborators.
    #[must_use]
    pub fn new(
        pipeline: Arc<ResolutionPipeline>,
        probe: Arc<dyn SizeProbe>,
        notifier: Arc<dyn NotifySink>,
    ) -> Self {
        Self {
            pipeline,
            probe,
            notifier,
        }
    }

    /// The resolution pipeline in use
    #[must_use]
    pub fn pipeline(&self) -> &ResolutionPipeline {
        &self.pipeline
    }

    /// The notification channel in use
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn NotifySink> {
        &self.notifier
    }

    /// Resolve `source_url` and attach a best-effort size.
    ///
    /// # Errors
    ///
    /// `Validation` for a rejected link, `NotFound` when no strategy succeeded.
    pub async fn lookup(&self, source_url: &str) -> Result<FileNotice, RelayError> {
        let resolution = self.pipeline.resolve(source_url).await?;
        debug!(attempts = resolution.trace.len(), "Resolution trace discarded");

        let file = resolution.file;
        let size = self.probe.probe(&file.direct_link).await;

        Ok(FileNotice {
            name: file.display_name,
            size,
            link: file.direct_link,
        })
    }

    /// Resolve the request's link and send the details to its recipient.
    ///
    /// # Errors
    ///
    /// Any [`RelayError`]; a failed size probe is not an error.
    pub async fn relay(&self, request: &SourceRequest) -> Result<FileNotice, RelayError> {
        let notice = self.lookup(request.source_url()).await?;
        self.notifier.notify(request.recipient(), &notice).await?;

        info!(
            recipient = %request.recipient(),
            file = %notice.name,
            size = %notice.size,
            "Relay completed"
        );
        Ok(notice)
    }
}
