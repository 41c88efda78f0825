use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use shutup_common::models::GateDecision;
use shutup_common::traits::MessageEvent;

use crate::Error;
use crate::services::event_handler::EventHandler;
use crate::services::gating_engine::GatingEngine;

pub const SHUTUP_HANDLER_ID: &str = "shutup.gate";

/// Turns a [`GateDecision`] into host signals.
pub struct ShutupHandler {
    engine: Arc<GatingEngine>,
    priority: i32,
}

impl ShutupHandler {
    pub fn new(engine: Arc<GatingEngine>, priority: i32) -> Self {
        Self { engine, priority }
    }
}

#[async_trait]
impl EventHandler for ShutupHandler {
    fn id(&self) -> &str {
        SHUTUP_HANDLER_ID
    }

    async fn handle(&self, event: &dyn MessageEvent) -> Result<bool, Error> {
        match self.engine.decide(event).await {
            GateDecision::Admit => Ok(false),
            GateDecision::Suppress => {
                event.set_should_call_llm(false);
                event.stop_event();
                Ok(true)
            }
            GateDecision::Reply(text) => {
                // The command is consumed even if the reply cannot be delivered.
                if let Err(e) = event.send_reply(&text).await {
                    warn!("Failed to send reply to {}: {}", event.conversation_id(), e);
                }
                event.stop_event();
                debug!("Handled control command in {}", event.conversation_id());
                Ok(true)
            }
        }
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
