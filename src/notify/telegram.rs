//! Telegram Bot API implementation of [`NotifySink`].

use super::{FileNotice, NotifyError, NotifySink};
use crate::request::RecipientId;
use crate::utils::retry_telegram_operation;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use teloxide::RequestError;
use tracing::{info, warn};

/// Render the file details message (Telegram HTML).
#[must_use]
pub fn render_file_message(notice: &FileNotice) -> String {
    let name = html_escape::encode_text(&notice.name);
    let link = html_escape::encode_double_quoted_attribute(&notice.link);
    format!(
        "📁 <b>File details</b>\n\n\
         <b>Name:</b> {name}\n\
         <b>Size:</b> {size}\n\n\
         🔗 <a href=\"{link}\">Download</a>",
        size = notice.size,
    )
}

/// Sends messages through the Bot API.
///
/// The bot is handed in by the caller; its token is read once at startup.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    /// Wrap an existing bot.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_html(&self, recipient: RecipientId, text: String) -> Result<(), NotifyError> {
        let chat_id = ChatId(recipient.0);
        let bot = &self.bot;
        retry_telegram_operation(
            move || {
                let text = text.clone();
                async move {
                    bot.send_message(chat_id, text)
                        .parse_mode(ParseMode::Html)
                        .await
                }
            },
            is_transient,
        )
        .await
        .map(|_| ())
        .map_err(|e| NotifyError::from_description(self.redact(&e.to_string())))
    }

    // Network errors embed the request URL, which carries the token
    fn redact(&self, text: &str) -> String {
        let token = self.bot.token();
        if token.is_empty() {
            text.to_string()
        } else {
            text.replace(token, "[TELEGRAM_TOKEN]")
        }
    }
}

fn is_transient(err: &RequestError) -> bool {
    matches!(err, RequestError::Network(_))
}

#[async_trait]
impl NotifySink for TelegramNotifier {
    async fn notify(&self, recipient: RecipientId, notice: &FileNotice) -> Result<(), NotifyError> {
        let result = self.send_html(recipient, render_file_message(notice)).await;
        match &result {
            Ok(()) => info!(recipient = %recipient, file = %notice.name, "File details delivered"),
            Err(e) => warn!(recipient = %recipient, error = %e, "File details not delivered"),
        }
        result
    }

    async fn reply(&self, recipient: RecipientId, text: &str) -> Result<(), NotifyError> {
        self.send_html(recipient, text.to_string()).await
    }
}
