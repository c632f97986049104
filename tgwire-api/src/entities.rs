//! Extraction of typed entity groups from a message.
//!
//! The remote API annotates message text with entities (commands,
//! mentions, links, …) addressed by UTF-16 code-unit offsets.  These
//! helpers slice the annotated spans out and bucket them by kind.

use crate::types::{Message, MessageEntity, MessageEntityKind, User};

/// All entity groups of one message, sliced out of its text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedEntities {
    /// `(command, trailing arguments)` pairs, e.g. `("/start", "now")`.
    pub bot_commands: Vec<(String, String)>,
    /// `@username` mentions.
    pub mentions: Vec<String>,
    pub hashtags: Vec<String>,
    pub urls: Vec<String>,
    pub emails: Vec<String>,
    /// Mentions of users without usernames: `(visible text, user)`.
    pub text_mentions: Vec<(String, User)>,
    /// Clickable text links: `(visible text, url)`.
    pub text_links: Vec<(String, String)>,
    pub bold: Vec<String>,
    pub italic: Vec<String>,
    pub code: Vec<String>,
    pub pre: Vec<String>,
}

/// Slice `text` by UTF-16 code-unit offset and length.
///
/// Returns `None` when the span falls outside the text, which only
/// happens if the remote annotation is inconsistent with the text.
fn slice_utf16(text: &str, offset: u32, length: u32) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let start = offset as usize;
    let end = start.checked_add(length as usize)?;
    if end > units.len() {
        return None;
    }
    Some(String::from_utf16_lossy(&units[start..end]))
}

/// Everything in `text` after the given span, trimmed.
fn tail_after_utf16(text: &str, offset: u32, length: u32) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let start = (offset as usize).saturating_add(length as usize);
    if start >= units.len() {
        return String::new();
    }
    String::from_utf16_lossy(&units[start..]).trim().to_owned()
}

/// Extract every annotated entity of `message`, bucketed by kind.
///
/// Messages without text (or with annotations that do not fit the text)
/// yield empty groups rather than an error.
pub fn extract_entities(message: &Message) -> ExtractedEntities {
    let mut extracted = ExtractedEntities::default();
    let Some(text) = message.text.as_deref() else {
        return extracted;
    };

    for entity in &message.entities {
        let Some(span) = slice_utf16(text, entity.offset, entity.length) else {
            continue;
        };
        collect_entity(&mut extracted, entity, span, text);
    }

    extracted
}

fn collect_entity(
    extracted: &mut ExtractedEntities,
    entity: &MessageEntity,
    span: String,
    text: &str,
) {
    match entity.kind {
        MessageEntityKind::BotCommand => {
            let args = tail_after_utf16(text, entity.offset, entity.length);
            extracted.bot_commands.push((span, args));
        }
        MessageEntityKind::Mention => extracted.mentions.push(span),
        MessageEntityKind::Hashtag => extracted.hashtags.push(span),
        MessageEntityKind::Url => extracted.urls.push(span),
        MessageEntityKind::Email => extracted.emails.push(span),
        MessageEntityKind::TextMention => {
            if let Some(user) = &entity.user {
                extracted.text_mentions.push((span, user.clone()));
            }
        }
        MessageEntityKind::TextLink => {
            if let Some(url) = &entity.url {
                extracted.text_links.push((span, url.clone()));
            }
        }
        MessageEntityKind::Bold => extracted.bold.push(span),
        MessageEntityKind::Italic => extracted.italic.push(span),
        MessageEntityKind::Code => extracted.code.push(span),
        MessageEntityKind::Pre => extracted.pre.push(span),
        MessageEntityKind::Unknown => {}
    }
}

/// Shorthand for just the bot commands of a message.
pub fn bot_commands(message: &Message) -> Vec<(String, String)> {
    extract_entities(message).bot_commands
}
