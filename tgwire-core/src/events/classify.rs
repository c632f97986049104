//! Pure classification of raw updates.

use tgwire_api::Update;

use super::types::{TaggedUpdate, UpdatePayload};

/// Classify a raw update into its tagged form.
///
/// Checks the payload slots in canonical order and returns the first
/// populated one; `None` means the record has no populated slot and is
/// not an update at all.  The remote API promises at most one populated
/// slot; should a misbehaving source populate several, the first in
/// canonical order wins and the rest are ignored.
///
/// Pure and total: no I/O, no logging, deterministic.
pub fn classify(update: &Update) -> Option<TaggedUpdate> {
    let payload = if let Some(message) = &update.message {
        UpdatePayload::Message(message.clone())
    } else if let Some(message) = &update.edited_message {
        UpdatePayload::EditedMessage(message.clone())
    } else if let Some(message) = &update.channel_post {
        UpdatePayload::ChannelPost(message.clone())
    } else if let Some(message) = &update.edited_channel_post {
        UpdatePayload::EditedChannelPost(message.clone())
    } else if let Some(query) = &update.inline_query {
        UpdatePayload::InlineQuery(query.clone())
    } else if let Some(result) = &update.chosen_inline_result {
        UpdatePayload::ChosenInlineResult(result.clone())
    } else if let Some(query) = &update.callback_query {
        UpdatePayload::CallbackQuery(query.clone())
    } else if let Some(query) = &update.shipping_query {
        UpdatePayload::ShippingQuery(query.clone())
    } else if let Some(query) = &update.pre_checkout_query {
        UpdatePayload::PreCheckoutQuery(query.clone())
    } else {
        return None;
    };

    Some(TaggedUpdate::new(update.update_id, payload))
}

/// Structural validity: at least one payload slot is populated.
///
/// This is the same check the webhook listener applies to pushed
/// records before routing them.
pub fn is_well_formed(update: &Update) -> bool {
    classify(update).is_some()
}
