//! Telegram webhook: answers `/start` and `/id` with the sender's chat id.

use super::types::{IncomingMessage, WebhookUpdate};
use super::AppState;
use crate::request::RecipientId;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Commands that trigger the id reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// `/start`
    Start,
    /// `/id`
    Id,
}

impl BotCommand {
    /// Parse the leading command of a message, accepting `/cmd@botname`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let command = token.split('@').next().unwrap_or(token);
        match command.to_ascii_lowercase().as_str() {
            "/start" => Some(Self::Start),
            "/id" => Some(Self::Id),
            _ => None,
        }
    }
}

/// Reply telling the sender their id
#[must_use]
pub fn id_reply(command: BotCommand, first_name: &str, user_id: i64) -> String {
    let greeting = match command {
        BotCommand::Start if !first_name.is_empty() => {
            format!("👋 Hi, {}!\n\n", html_escape::encode_text(first_name))
        }
        BotCommand::Start => "👋 Hi!\n\n".to_string(),
        BotCommand::Id => String::new(),
    };
    format!(
        "{greeting}Your Telegram ID: <code>{user_id}</code>\n\n\
         Paste it on the website together with a MediaFire link and the file details will arrive here."
    )
}

fn command_reply(message: &IncomingMessage) -> Option<(RecipientId, String)> {
    let command = BotCommand::parse(message.text.as_deref()?)?;
    let (user_id, first_name) = message
        .from
        .as_ref()
        .map_or((message.chat.id, ""), |user| (user.id, user.first_name.as_str()));
    Some((
        RecipientId(message.chat.id),
        id_reply(command, first_name, user_id),
    ))
}

/// `POST /api/webhook`. Always acknowledges so Telegram does not redeliver.
pub async fn telegram_webhook(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let update: WebhookUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed webhook update");
            return Json(json!({ "ok": true }));
        }
    };

    let Some((chat, text)) = update.message.as_ref().and_then(command_reply) else {
        debug!("Webhook update ignored");
        return Json(json!({ "ok": true }));
    };

    if let Err(e) = state.relay.notifier().reply(chat, &text).await {
        warn!(chat = %chat, error = %e, "Failed to answer bot command");
    }
    Json(json!({ "ok": true }))
}
