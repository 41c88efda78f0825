use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use shutup_common::traits::MessageEvent;

use crate::Error;
use crate::services::event_handler::{EventHandler, EventHandlerInfo};

#[derive(Clone)]
struct RegisteredHandler {
    priority: i32,
    handler: Arc<dyn EventHandler>,
}

/// Registry for message handlers, kept sorted by priority (higher numbers first).
pub struct EventHandlerRegistry {
    /// Handlers in dispatch order
    ordered: Arc<RwLock<Vec<RegisteredHandler>>>,
    /// Map of handler ID -> handler for direct lookup
    handlers_by_id: Arc<RwLock<HashMap<String, Arc<dyn EventHandler>>>>,
}

impl Default for EventHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandlerRegistry {
    pub fn new() -> Self {
        Self {
            ordered: Arc::new(RwLock::new(Vec::new())),
            handlers_by_id: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a handler at its own `priority()`
    pub async fn register(&self, handler: Arc<dyn EventHandler>) -> Result<(), Error> {
        let priority = handler.priority();
        self.register_with_priority(handler, priority).await
    }

    /// Register a handler at an explicit priority
    pub async fn register_with_priority(
        &self,
        handler: Arc<dyn EventHandler>,
        priority: i32,
    ) -> Result<(), Error> {
        let handler_id = handler.id().to_string();
        info!("Registering event handler '{}' with priority {}", handler_id, priority);

        {
            let mut id_map = self.handlers_by_id.write().await;
            if id_map.contains_key(&handler_id) {
                return Err(Error::Handler(format!(
                    "Handler with ID '{}' already registered",
                    handler_id
                )));
            }
            id_map.insert(handler_id.clone(), handler.clone());
        }

        {
            let mut ordered = self.ordered.write().await;
            // Stable among equal priorities: later registrations go after earlier ones.
            let insert_pos = ordered
                .iter()
                .position(|h| h.priority < priority)
                .unwrap_or(ordered.len());
            ordered.insert(insert_pos, RegisteredHandler { priority, handler });
            debug!("Handler '{}' registered at position {}", handler_id, insert_pos);
        }

        Ok(())
    }

    /// Unregister a handler by ID
    pub async fn unregister(&self, handler_id: &str) -> Result<(), Error> {
        info!("Unregistering event handler '{}'", handler_id);

        self.handlers_by_id
            .write()
            .await
            .remove(handler_id)
            .ok_or_else(|| Error::Handler(format!("Handler '{}' not found", handler_id)))?;

        self.ordered.write().await.retain(|h| h.handler.id() != handler_id);
        Ok(())
    }

    /// Enabled handlers in dispatch order
    pub async fn handlers(&self) -> Vec<Arc<dyn EventHandler>> {
        self.ordered
            .read()
            .await
            .iter()
            .filter(|h| h.handler.is_enabled())
            .map(|h| h.handler.clone())
            .collect()
    }

    /// Get handler by ID
    pub async fn get_handler(&self, handler_id: &str) -> Option<Arc<dyn EventHandler>> {
        self.handlers_by_id.read().await.get(handler_id).cloned()
    }

    /// List all registered handlers in dispatch order
    pub async fn list_handlers(&self) -> Vec<EventHandlerInfo> {
        self.ordered
            .read()
            .await
            .iter()
            .map(|h| EventHandlerInfo {
                id: h.handler.id().to_string(),
                priority: h.priority,
                enabled: h.handler.is_enabled(),
            })
            .collect()
    }

    /// Runs `event` through every enabled handler until one stops it.
    /// Handler errors are logged and dispatch continues. Returns the ids of handlers
    /// that reported the event as handled.
    pub async fn dispatch(&self, event: &dyn MessageEvent) -> Vec<String> {
        let mut handled = Vec::new();

        for handler in self.handlers().await {
            match handler.handle(event).await {
                Ok(true) => handled.push(handler.id().to_string()),
                Ok(false) => {}
                Err(e) => error!("Handler '{}' failed: {:?}", handler.id(), e),
            }
            if event.is_stopped() {
                debug!("Event stopped by '{}'", handler.id());
                break;
            }
        }

        handled
    }

    /// Clear all registered handlers
    pub async fn clear(&self) {
        let mut ordered = self.ordered.write().await;
        let mut handlers_by_id = self.handlers_by_id.write().await;

        ordered.clear();
        handlers_by_id.clear();

        info!("Cleared all event handlers from registry");
    }
}
