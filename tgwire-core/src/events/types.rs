//! Classified update values flowing through the router.

use tgwire_api::UpdateKind;
use tgwire_api::types::{
    CallbackQuery, ChosenInlineResult, InlineQuery, Message, PreCheckoutQuery, ShippingQuery,
};

/// The single populated payload slot of a classified update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePayload {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    InlineQuery(InlineQuery),
    ChosenInlineResult(ChosenInlineResult),
    CallbackQuery(CallbackQuery),
    ShippingQuery(ShippingQuery),
    PreCheckoutQuery(PreCheckoutQuery),
}

impl UpdatePayload {
    /// The kind tag this payload belongs to.
    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdatePayload::Message(_) => UpdateKind::Message,
            UpdatePayload::EditedMessage(_) => UpdateKind::EditedMessage,
            UpdatePayload::ChannelPost(_) => UpdateKind::ChannelPost,
            UpdatePayload::EditedChannelPost(_) => UpdateKind::EditedChannelPost,
            UpdatePayload::InlineQuery(_) => UpdateKind::InlineQuery,
            UpdatePayload::ChosenInlineResult(_) => UpdateKind::ChosenInlineResult,
            UpdatePayload::CallbackQuery(_) => UpdateKind::CallbackQuery,
            UpdatePayload::ShippingQuery(_) => UpdateKind::ShippingQuery,
            UpdatePayload::PreCheckoutQuery(_) => UpdateKind::PreCheckoutQuery,
        }
    }
}

/// A classified update: the id, its kind tag, and the one payload.
///
/// Exists only transiently during dispatch; subscribers receive clones.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedUpdate {
    pub id: i64,
    pub kind: UpdateKind,
    pub payload: UpdatePayload,
}

impl TaggedUpdate {
    /// Build a tagged update; the kind tag is derived from the payload
    /// so the two can never disagree.
    pub fn new(id: i64, payload: UpdatePayload) -> Self {
        Self {
            id,
            kind: payload.kind(),
            payload,
        }
    }

    /// The message payload, for the message-shaped kinds.
    pub fn message(&self) -> Option<&Message> {
        match &self.payload {
            UpdatePayload::Message(m)
            | UpdatePayload::EditedMessage(m)
            | UpdatePayload::ChannelPost(m)
            | UpdatePayload::EditedChannelPost(m) => Some(m),
            _ => None,
        }
    }
}
