// File: shutup-common/src/models/message.rs

use serde::{Deserialize, Serialize};

/// One raw component of an inbound message, as delivered by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageSegment {
    Plain { text: String },
    /// Mention of another participant; `target` is the platform user id.
    At { target: String },
    /// Images, stickers, replies and anything else the gate does not inspect.
    Other,
}

impl MessageSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        MessageSegment::Plain { text: text.into() }
    }

    pub fn at(target: impl Into<String>) -> Self {
        MessageSegment::At { target: target.into() }
    }
}
