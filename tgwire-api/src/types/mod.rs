//! Types mirroring the remote Bot API schema.
//!
//! Only the fields the delivery pipeline and the supported methods touch
//! are declared; unknown fields are ignored on deserialization, which is
//! how the remote side evolves its schema without breaking clients.

pub mod message;
pub mod queries;
pub mod update;

pub use message::{Chat, Message, MessageEntity, MessageEntityKind, User};
pub use queries::{
    CallbackQuery, ChosenInlineResult, InlineQuery, OrderInfo, PreCheckoutQuery, ShippingAddress,
    ShippingQuery,
};
pub use update::{Update, UpdateKind, WebhookInfo};

use serde::{Deserialize, Serialize};

/// A chat target: the numeric id, or a public `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(username: &str) -> Self {
        ChatId::Username(username.to_owned())
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(username) => write!(f, "{username}"),
        }
    }
}
