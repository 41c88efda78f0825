//! src/plugin.rs
//!
//! Lifecycle of the shutup plugin: load state, build the engine, start the optional
//! presence loop, hand the host a handler registration, and tear everything down again.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::Duration;
use tracing::info;

use shutup_common::models::ShutupConfig;

use crate::services::event_handler::EventHandler;
use crate::services::gating_engine::GatingEngine;
use crate::services::shutup_handler::ShutupHandler;
use crate::store::SilenceStore;
use crate::tasks::presence_annotator::PresenceAnnotator;
use crate::utils::time::current_epoch_f64;

pub const STORE_FILE_NAME: &str = "silence_map.json";

/// What the host needs to register the gate: the handler and where to put it in
/// its dispatch order.
#[derive(Clone)]
pub struct HandlerRegistration {
    pub handler: Arc<dyn EventHandler>,
    pub priority: i32,
}

pub struct ShutupPlugin {
    engine: Arc<GatingEngine>,
    store: Arc<SilenceStore>,
    annotator: Option<Arc<PresenceAnnotator>>,
    priority: i32,
}

impl ShutupPlugin {
    pub fn store_path(data_dir: &Path) -> PathBuf {
        data_dir.join(STORE_FILE_NAME)
    }

    /// Loads persisted mutes from `data_dir` and starts the presence loop when group
    /// card decoration is enabled.
    pub async fn start(config: ShutupConfig, data_dir: &Path) -> Self {
        let store = Arc::new(SilenceStore::open(Self::store_path(data_dir), current_epoch_f64()).await);
        Self::start_with_store(config, store).await
    }

    pub async fn start_with_store(config: ShutupConfig, store: Arc<SilenceStore>) -> Self {
        let priority = config.priority;

        let annotator = if config.group_card_enabled {
            let annotator = PresenceAnnotator::new(
                store.clone(),
                config.group_card_template.clone(),
                Duration::from_secs(config.update_interval_secs),
            );
            annotator.spawn().await;
            Some(annotator)
        } else {
            None
        };

        let mut engine = GatingEngine::new(config, store.clone());
        if let Some(annotator) = &annotator {
            engine = engine.with_annotator(annotator.clone());
        }

        info!(
            "Shutup plugin started: store={}, decoration={}, priority={}",
            store.path().display(),
            annotator.is_some(),
            priority
        );

        Self {
            engine: Arc::new(engine),
            store,
            annotator,
            priority,
        }
    }

    pub fn registration(&self) -> HandlerRegistration {
        HandlerRegistration {
            handler: Arc::new(ShutupHandler::new(self.engine.clone(), self.priority)),
            priority: self.priority,
        }
    }

    pub fn engine(&self) -> &Arc<GatingEngine> {
        &self.engine
    }

    pub fn annotator(&self) -> Option<&Arc<PresenceAnnotator>> {
        self.annotator.as_ref()
    }

    /// Stops the presence loop (restoring labels), flushes the store, and drops the
    /// in-memory silence map.
    pub async fn terminate(&self) {
        info!("terminate: stopping shutup plugin");
        if let Some(annotator) = &self.annotator {
            annotator.stop().await;
        }
        self.store.flush().await;
        self.store.clear_memory().await;
        info!("terminate: silence map cleared");
    }
}
