// shutup-server/src/console.rs
//
// Line-oriented stand-in for a chat platform: each stdin line is one inbound message.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use shutup_common::models::{ConversationId, DisplayLabel, MessageSegment};
use shutup_common::traits::DisplayDecoration;
use shutup_common::{Error, InboundMessage};

/// Token in console input that becomes an at-mention of the bot.
pub const SELF_MENTION: &str = "@self";

/// Parses `<conversation> <text>`. Returns `None` for blank lines.
///
/// `@self` anywhere in the text is turned into an `At` segment for `self_id` and removed
/// from the normalized text, the way chat hosts strip mentions.
pub fn parse_line(line: &str, self_id: &str) -> Option<InboundMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (conversation, body) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    let body = body.trim_start();

    let mut segments = Vec::new();
    let mut rest = body;
    while let Some(pos) = rest.find(SELF_MENTION) {
        if !rest[..pos].trim().is_empty() {
            segments.push(MessageSegment::plain(&rest[..pos]));
        }
        segments.push(MessageSegment::at(self_id));
        rest = &rest[pos + SELF_MENTION.len()..];
    }
    if !rest.trim().is_empty() {
        segments.push(MessageSegment::plain(rest));
    }

    let text = body.replace(SELF_MENTION, "");
    Some(InboundMessage::new(conversation, text.trim(), self_id).with_segments(segments))
}

/// Keeps per-conversation labels in memory and logs every change.
pub struct ConsoleDisplay {
    nickname: String,
    cards: Mutex<HashMap<ConversationId, String>>,
}

impl ConsoleDisplay {
    pub fn new(nickname: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            cards: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl DisplayDecoration for ConsoleDisplay {
    async fn get_label(&self, conversation: &ConversationId) -> Result<DisplayLabel, Error> {
        Ok(DisplayLabel {
            card: self.cards.lock().get(conversation).cloned().unwrap_or_default(),
            nickname: self.nickname.clone(),
            name: self.nickname.clone(),
        })
    }

    async fn set_label(&self, conversation: &ConversationId, label: &str) -> Result<(), Error> {
        info!("[{}] display label -> '{}'", conversation, label);
        let mut cards = self.cards.lock();
        if label.is_empty() {
            cards.remove(conversation);
        } else {
            cards.insert(conversation.clone(), label.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shutup_common::traits::MessageEvent;

    #[test]
    fn test_parse_plain_line() {
        let msg = parse_line("group_1   闭嘴 5m", "bot").unwrap();
        assert_eq!(msg.conversation_id().as_str(), "group_1");
        assert_eq!(msg.message_str(), "闭嘴 5m");
        assert_eq!(msg.segments(), &[MessageSegment::plain("闭嘴 5m")]);
    }

    #[test]
    fn test_parse_mention() {
        let msg = parse_line("g @self 闭嘴", "bot").unwrap();
        assert_eq!(msg.message_str(), "闭嘴");
        assert_eq!(
            msg.segments(),
            &[MessageSegment::at("bot"), MessageSegment::plain(" 闭嘴")]
        );
    }

    #[test]
    fn test_parse_blank_and_bare_conversation() {
        assert!(parse_line("   ", "bot").is_none());
        let msg = parse_line("lonely", "bot").unwrap();
        assert_eq!(msg.message_str(), "");
        assert!(msg.segments().is_empty());
    }

    #[tokio::test]
    async fn test_console_display_round_trip() {
        let display = ConsoleDisplay::new("shutup");
        let id = ConversationId::from("g");
        assert_eq!(display.get_label(&id).await.unwrap().shown(), "shutup");

        display.set_label(&id, "shutup[闭嘴中 3min]").await.unwrap();
        assert_eq!(display.get_label(&id).await.unwrap().card, "shutup[闭嘴中 3min]");

        display.set_label(&id, "").await.unwrap();
        assert_eq!(display.get_label(&id).await.unwrap().card, "");
    }
}
