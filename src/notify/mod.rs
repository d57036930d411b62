//! Delivery of resolved file details to the user's chat.

mod telegram;

use crate::request::RecipientId;
use crate::size::SizeInfo;
use async_trait::async_trait;
use thiserror::Error;

pub use telegram::{render_file_message, TelegramNotifier};

/// Substrings Telegram uses when the bot may not write to a chat.
/// All of them mean the user has to open the bot and press Start first.
const RECIPIENT_UNREACHABLE_SIGNALS: &[&str] = &[
    "chat not found",
    "user not found",
    "bot was blocked by the user",
    "bot can't initiate conversation",
    "user is deactivated",
    "peer_id_invalid",
];

/// What the user receives about a resolved file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNotice {
    /// Display name
    pub name: String,
    /// Size, possibly unknown
    pub size: SizeInfo,
    /// Direct download link
    pub link: String,
}

/// Delivery failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// The chat does not exist for the bot yet (user never started it, or blocked it)
    #[error("recipient unreachable: {0}")]
    RecipientUnreachable(String),
    /// Any other delivery failure
    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl NotifyError {
    /// Classify an upstream error description.
    #[must_use]
    pub fn from_description(description: impl Into<String>) -> Self {
        let description = description.into();
        if is_recipient_unreachable(&description) {
            Self::RecipientUnreachable(description)
        } else {
            Self::Delivery(description)
        }
    }
}

/// True if `description` says the bot cannot reach the chat.
#[must_use]
pub fn is_recipient_unreachable(description: &str) -> bool {
    let lower = description.to_ascii_lowercase();
    RECIPIENT_UNREACHABLE_SIGNALS
        .iter()
        .any(|signal| lower.contains(signal))
}

/// Channel that delivers messages to a recipient
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Send the details of a resolved file
    async fn notify(&self, recipient: RecipientId, notice: &FileNotice) -> Result<(), NotifyError>;

    /// Send a plain (HTML formatted) text reply
    async fn reply(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError>;
}
