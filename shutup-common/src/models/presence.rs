// File: shutup-common/src/models/presence.rs

use serde::{Deserialize, Serialize};

/// The bot's externally visible labels in one conversation (group card, nickname, account name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLabel {
    /// Per-conversation display name; empty when the platform has none set.
    pub card: String,
    pub nickname: String,
    pub name: String,
}

impl DisplayLabel {
    /// What the conversation actually shows: the card if one is set, else the nickname.
    pub fn shown(&self) -> &str {
        if self.card.is_empty() {
            &self.nickname
        } else {
            &self.card
        }
    }
}
