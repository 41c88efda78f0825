use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::models::{ConversationId, MessageSegment};
use crate::traits::DisplayDecoration;

/// An inbound message as seen by the gate, plus the signals the gate can send back
/// to the host about it.
#[async_trait]
pub trait MessageEvent: Send + Sync {
    /// Normalized text of the message (host-side formatting already applied).
    fn message_str(&self) -> &str;

    fn conversation_id(&self) -> &ConversationId;

    /// Raw message components, used for wake-prefix and at-mention gating.
    fn segments(&self) -> &[MessageSegment];

    /// Platform id of the bot itself.
    fn self_id(&self) -> &str;

    /// Display-label capability for this message's platform, if it has one.
    fn display_decoration(&self) -> Option<Arc<dyn DisplayDecoration>> {
        None
    }

    /// `false` asks the host to skip the automated (LLM) response for this message.
    fn set_should_call_llm(&self, call: bool);

    /// Stops later handlers from seeing this message.
    fn stop_event(&self);

    fn is_stopped(&self) -> bool;

    async fn send_reply(&self, text: &str) -> Result<(), Error>;
}
