//! Request bodies for the supported Bot API methods.
//!
//! Optional fields are skipped on serialization so the wire body only
//! carries what the caller set.  Every struct has a `new` taking the
//! required fields and `Default`-able optionals.

use serde::{Deserialize, Serialize};

use crate::types::{ChatId, UpdateKind};

/// Parameters of `getUpdates` — the batch-fetch half of delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetUpdates {
    /// Identifier of the first update to be returned; must be one
    /// greater than the highest previously received `update_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Maximum number of updates per batch, 1–100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Long-poll timeout in seconds; 0 means short polling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Restrict delivery to these kinds; absent means all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<UpdateKind>>,
}

/// Parameters of `setWebhook`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetWebhook {
    /// HTTPS URL to push updates to; empty string removes the webhook.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<UpdateKind>>,
}

impl SetWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: None,
            allowed_updates: None,
        }
    }
}

/// Parameters of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    /// "Markdown" or "HTML".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
            disable_web_page_preview: None,
            disable_notification: None,
            reply_to_message_id: None,
        }
    }
}

/// Parameters of `forwardMessage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardMessage {
    pub chat_id: ChatId,
    pub from_chat_id: ChatId,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
}

/// Caption-bearing parameters shared by `sendPhoto` and `sendDocument`;
/// the file itself travels as a multipart part next to these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendFile {
    pub chat_id: ChatId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

impl SendFile {
    pub fn new(chat_id: impl Into<ChatId>) -> Self {
        Self {
            chat_id: chat_id.into(),
            caption: None,
            disable_notification: None,
            reply_to_message_id: None,
        }
    }
}

/// Parameters of `editMessageText`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditMessageText {
    pub chat_id: ChatId,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

/// Parameters of `answerCallbackQuery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl AnswerCallbackQuery {
    pub fn new(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
            show_alert: None,
            url: None,
        }
    }
}

/// Parameters of `answerInlineQuery`.  Results are raw JSON values since
/// the inline-result vocabulary is large and orthogonal to delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    pub results: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_personal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<String>,
}

/// Parameters of `answerShippingQuery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerShippingQuery {
    pub shipping_query_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_options: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Parameters of `answerPreCheckoutQuery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerPreCheckoutQuery {
    pub pre_checkout_query_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
