//! Wire types of the HTTP API.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /api/download`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    /// MediaFire page link
    #[serde(default)]
    pub url: Option<String>,
    /// Telegram chat id; accepted as a string or a JSON number
    #[serde(default, deserialize_with = "string_or_number")]
    pub telegram_id: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdField {
        Text(String),
        Number(i64),
    }

    Ok(Option::<IdField>::deserialize(deserializer)?.map(|field| match field {
        IdField::Text(text) => text,
        IdField::Number(number) => number.to_string(),
    }))
}

/// Successful `POST /api/download` response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    /// Always true
    pub success: bool,
    /// Human readable confirmation
    pub message: String,
    /// Resolved file name
    pub file_name: String,
    /// Formatted size or `Unknown`
    pub file_size: String,
    /// Recipient the details were sent to
    pub telegram_id: String,
}

/// Query of `GET /api/download`
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// MediaFire page link
    pub url: Option<String>,
}

/// Successful `GET /api/download` response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    /// Always true
    pub success: bool,
    /// Resolved file name
    pub file_name: String,
    /// Formatted size or `Unknown`
    pub file_size: String,
    /// Direct download link
    pub download_url: String,
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short description
    pub error: String,
    /// Guidance or upstream detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The subset of a Telegram `Update` the webhook reads
#[derive(Debug, Deserialize)]
pub struct WebhookUpdate {
    /// New incoming message, if this update carries one
    pub message: Option<IncomingMessage>,
}

/// Incoming chat message
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    /// Chat the message was sent in
    pub chat: IncomingChat,
    /// Sender, absent for channel posts
    pub from: Option<IncomingUser>,
    /// Message text, absent for media
    pub text: Option<String>,
}

/// Chat of an incoming message
#[derive(Debug, Deserialize)]
pub struct IncomingChat {
    /// Chat id
    pub id: i64,
}

/// Sender of an incoming message
#[derive(Debug, Deserialize)]
pub struct IncomingUser {
    /// User id
    pub id: i64,
    /// First name
    #[serde(default)]
    pub first_name: String,
}
