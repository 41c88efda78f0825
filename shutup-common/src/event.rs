//! shutup-common/src/event.rs
//!
//! A self-contained [`MessageEvent`] for hosts that do not bring their own event type,
//! and for tests. Host signals are recorded on the event and can be read back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::Error;
use crate::models::{ConversationId, MessageSegment};
use crate::traits::{DisplayDecoration, MessageEvent};

pub struct InboundMessage {
    conversation: ConversationId,
    text: String,
    segments: Vec<MessageSegment>,
    self_id: String,
    decoration: Option<Arc<dyn DisplayDecoration>>,

    should_call_llm: AtomicBool,
    stopped: AtomicBool,
    replies: Mutex<Vec<String>>,
}

impl InboundMessage {
    /// Builds a plain-text message; the single segment mirrors `text`.
    pub fn new(conversation: impl Into<ConversationId>, text: &str, self_id: &str) -> Self {
        Self {
            conversation: conversation.into(),
            text: text.to_string(),
            segments: vec![MessageSegment::plain(text)],
            self_id: self_id.to_string(),
            decoration: None,
            should_call_llm: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            replies: Mutex::new(Vec::new()),
        }
    }

    pub fn with_segments(mut self, segments: Vec<MessageSegment>) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_decoration(mut self, decoration: Arc<dyn DisplayDecoration>) -> Self {
        self.decoration = Some(decoration);
        self
    }

    pub fn should_call_llm(&self) -> bool {
        self.should_call_llm.load(Ordering::SeqCst)
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().clone()
    }
}

#[async_trait]
impl MessageEvent for InboundMessage {
    fn message_str(&self) -> &str {
        &self.text
    }

    fn conversation_id(&self) -> &ConversationId {
        &self.conversation
    }

    fn segments(&self) -> &[MessageSegment] {
        &self.segments
    }

    fn self_id(&self) -> &str {
        &self.self_id
    }

    fn display_decoration(&self) -> Option<Arc<dyn DisplayDecoration>> {
        self.decoration.clone()
    }

    fn set_should_call_llm(&self, call: bool) {
        self.should_call_llm.store(call, Ordering::SeqCst);
    }

    fn stop_event(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn send_reply(&self, text: &str) -> Result<(), Error> {
        debug!("reply to {}: {}", self.conversation, text);
        self.replies.lock().push(text.to_string());
        Ok(())
    }
}
