//! Mapping of relay failures onto HTTP responses.

use super::types::ErrorBody;
use crate::relay::RelayError;
use crate::request::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Error returned by the HTTP handlers
#[derive(Debug)]
pub enum AppError {
    /// Malformed or missing input
    BadRequest {
        /// Short description
        error: String,
        /// Optional detail
        details: Option<String>,
    },
    /// Resolution exhausted every strategy
    NotFound {
        /// Guidance and the last strategy error
        details: String,
    },
    /// The bot cannot write to the user yet
    RecipientUnreachable {
        /// Bot handle to mention in the guidance, if known
        bot_username: Option<String>,
    },
    /// Telegram rejected the message for another reason
    Notify(String),
    /// Anything unexpected; the detail is logged, never returned
    Internal(String),
}

impl AppError {
    /// Translate a relay failure, using `bot_username` for user guidance.
    #[must_use]
    pub fn from_relay(err: RelayError, bot_username: Option<&str>) -> Self {
        match err {
            RelayError::Validation(e) => e.into(),
            RelayError::NotFound { last_error } => Self::NotFound {
                details: format!(
                    "Make sure the MediaFire link is correct and the file is public. Last error: {last_error}"
                ),
            },
            RelayError::RecipientUnreachable(_) => Self::RecipientUnreachable {
                bot_username: bot_username.map(ToString::to_string),
            },
            RelayError::Notify(detail) => Self::Notify(detail),
        }
    }

    fn parts(self) -> (StatusCode, ErrorBody) {
        match self {
            Self::BadRequest { error, details } => {
                (StatusCode::BAD_REQUEST, ErrorBody { error, details })
            }
            Self::NotFound { details } => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "File not found on MediaFire".to_string(),
                    details: Some(details),
                },
            ),
            Self::RecipientUnreachable { bot_username } => {
                let bot = bot_username.map_or_else(|| "the bot".to_string(), |name| format!("@{name}"));
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: "Cannot send a message to this Telegram ID".to_string(),
                        details: Some(format!(
                            "Open {bot} in Telegram and send /start first, then try again."
                        )),
                    },
                )
            }
            Self::Notify(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Failed to send file details to Telegram. Please try again later."
                        .to_string(),
                    details: Some(detail),
                },
            ),
            Self::Internal(detail) => {
                error!(error = %detail, "Unexpected error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Failed to process download request".to_string(),
                        details: None,
                    },
                )
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest {
            error: err.to_string(),
            details: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}
