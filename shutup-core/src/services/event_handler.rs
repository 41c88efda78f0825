use async_trait::async_trait;
use shutup_common::traits::MessageEvent;

use crate::Error;

/// Base trait for message handlers registered with the host.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns a unique identifier for this handler
    fn id(&self) -> &str;

    /// Process the event. Return Ok(true) if handled, Ok(false) if skipped.
    async fn handle(&self, event: &dyn MessageEvent) -> Result<bool, Error>;

    /// Priority for this handler (higher numbers run first)
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this handler is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Metadata about an event handler for registration and management
#[derive(Debug, Clone)]
pub struct EventHandlerInfo {
    pub id: String,
    pub priority: i32,
    pub enabled: bool,
}
