// shutup-core/src/tasks/presence_annotator.rs

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use shutup_common::models::config::default_group_card_template;
use shutup_common::models::{ConversationId, DisplayLabel};
use shutup_common::traits::DisplayDecoration;

use crate::services::template::render_or;
use crate::store::SilenceStore;
use crate::utils::time::current_epoch_f64;

/// Per-conversation decoration state: what to restore, and what we last wrote.
struct PresenceRecord {
    original: DisplayLabel,
    applied: Option<String>,
    target: Arc<dyn DisplayDecoration>,
}

/// Mirrors manual-mute state into the bot's display label, e.g. `Bot[闭嘴中 5min]`.
///
/// Purely cosmetic: it reads the silence store but never writes it, and nothing it does
/// feeds back into gating decisions. Every display call is best-effort.
pub struct PresenceAnnotator {
    store: Arc<SilenceStore>,
    template: String,
    period: Duration,
    records: DashMap<ConversationId, PresenceRecord>,
    reconcile: Notify,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Whole minutes left, never less than one while the mute is still running.
pub fn remaining_minutes(expiry: f64, now: f64) -> u64 {
    let minutes = ((expiry - now) / 60.0).floor();
    if minutes < 1.0 { 1 } else { minutes as u64 }
}

impl PresenceAnnotator {
    pub fn new(store: Arc<SilenceStore>, template: String, period: Duration) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            store,
            template,
            period,
            records: DashMap::new(),
            reconcile: Notify::new(),
            shutdown_tx,
            handle: Mutex::new(None),
        })
    }

    /// Starts the periodic reconcile loop. A second call while it runs is a no-op and
    /// returns `false`.
    pub async fn spawn(self: &Arc<Self>) -> bool {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            debug!("Presence loop already running");
            return false;
        }
        self.shutdown_tx.send_replace(false);

        let this = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval(this.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("Presence loop started, interval={}s", this.period.as_secs());

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Presence loop shutting down => break from loop.");
                            break;
                        }
                    }
                    _ = this.reconcile.notified() => {
                        this.tick(current_epoch_f64()).await;
                    }
                    _ = ticker.tick() => {
                        this.tick(current_epoch_f64()).await;
                    }
                }
            }
        }));
        true
    }

    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Wakes the loop for an out-of-band reconcile without waiting for it.
    pub fn request_reconcile(&self) {
        self.reconcile.notify_one();
    }

    /// Called when `conversation` gets muted: captures the original label once, then
    /// applies the decorated one right away.
    pub async fn on_muted(
        &self,
        conversation: &ConversationId,
        target: Arc<dyn DisplayDecoration>,
        expiry: f64,
        now: f64,
    ) {
        if !self.records.contains_key(conversation) {
            let original = match target.get_label(conversation).await {
                Ok(label) => label,
                Err(e) => {
                    warn!("Could not read display label in {}: {}; not decorating", conversation, e);
                    return;
                }
            };
            debug!("Captured original label {:?} in {}", original, conversation);
            self.records
                .entry(conversation.clone())
                .or_insert(PresenceRecord {
                    original,
                    applied: None,
                    target,
                });
        }
        self.refresh(conversation, expiry, now).await;
    }

    /// Called when `conversation` gets unmuted. Restoring happens on the loop, so the
    /// caller never waits on the display backend.
    pub fn on_unmuted(&self, conversation: &ConversationId) {
        if self.records.contains_key(conversation) {
            debug!("Scheduling label restore in {}", conversation);
            self.request_reconcile();
        }
    }

    /// One reconcile pass over every decorated conversation.
    pub async fn tick(&self, now: f64) {
        let ids: Vec<ConversationId> = self.records.iter().map(|e| e.key().clone()).collect();
        if ids.is_empty() {
            return;
        }
        debug!("Presence tick over {} conversation(s)", ids.len());

        for id in ids {
            match self.store.active_expiry(&id, now).await {
                Some(expiry) => self.refresh(&id, expiry, now).await,
                None => self.restore(&id, now).await,
            }
        }
    }

    pub fn render_label(&self, original: &DisplayLabel, remaining: u64) -> String {
        let values = [
            ("remaining", remaining.to_string()),
            ("original_card", original.shown().to_string()),
            ("original_nickname", original.nickname.clone()),
            ("original_name", original.name.clone()),
        ];
        render_or(&self.template, &values, &default_group_card_template())
    }

    async fn refresh(&self, id: &ConversationId, expiry: f64, now: f64) {
        let Some((target, label, previous)) = self.records.get(id).map(|r| {
            let label = self.render_label(&r.original, remaining_minutes(expiry, now));
            (r.target.clone(), label, r.applied.clone())
        }) else {
            return;
        };

        if previous.as_deref() == Some(label.as_str()) {
            return;
        }

        match target.set_label(id, &label).await {
            Ok(()) => {
                debug!("Decorated {} as '{}'", id, label);
                if let Some(mut record) = self.records.get_mut(id) {
                    record.applied = Some(label);
                }
            }
            Err(e) => warn!("Failed to decorate display label in {}: {}", id, e),
        }
    }

    async fn restore(&self, id: &ConversationId, now: f64) {
        let Some((target, original)) = self
            .records
            .get(id)
            .map(|r| (r.target.clone(), r.original.clone()))
        else {
            return;
        };

        match target.set_label(id, &original.card).await {
            Ok(()) => info!("Restored display label in {}", id),
            Err(e) => warn!("Failed to restore display label in {}: {}", id, e),
        }

        // Re-muted while we were restoring: keep the record so the next pass re-decorates.
        if self.store.active_expiry(id, now).await.is_some() {
            if let Some(mut record) = self.records.get_mut(id) {
                record.applied = None;
            }
        } else {
            self.records.remove(id);
        }
    }

    pub fn decorated(&self) -> Vec<ConversationId> {
        self.records.iter().map(|e| e.key().clone()).collect()
    }

    pub fn applied_label(&self, id: &ConversationId) -> Option<String> {
        self.records.get(id).and_then(|r| r.applied.clone())
    }

    /// Cancels the loop, waits for it, then restores every decorated conversation once.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Presence loop ended abnormally: {:?}", e);
            }
        }

        let pending: Vec<(ConversationId, PresenceRecord)> = {
            let ids: Vec<ConversationId> = self.records.iter().map(|e| e.key().clone()).collect();
            ids.into_iter()
                .filter_map(|id| self.records.remove(&id))
                .collect()
        };

        for (id, record) in pending {
            if let Err(e) = record.target.set_label(&id, &record.original.card).await {
                warn!("Failed to restore display label in {} on shutdown: {}", id, e);
            }
        }
        info!("Presence annotator stopped");
    }
}
