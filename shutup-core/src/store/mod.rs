//! src/store/mod.rs
//!
//! Durable `conversation -> expiry` map. The in-memory map is authoritative while the
//! process runs; the JSON file on disk is a write-through cache that is rewritten after
//! every mutation and read once at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

use shutup_common::Error;
use shutup_common::models::ConversationId;

/// Expiry instants in fractional Unix epoch seconds.
pub type SilenceMap = BTreeMap<ConversationId, f64>;

pub struct SilenceStore {
    path: PathBuf,
    /// Every mutation holds this lock through its save, so concurrent callers are
    /// applied one at a time in lock-acquisition order.
    records: Mutex<SilenceMap>,
}

impl SilenceStore {
    /// An empty store backed by `path`. Nothing is read until [`SilenceStore::open`] or
    /// [`SilenceStore::reload`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Mutex::new(SilenceMap::new()),
        }
    }

    /// Loads the persisted map and drops anything that expired while we were down.
    pub async fn open(path: impl Into<PathBuf>, now: f64) -> Self {
        let store = Self::new(path);
        store.reload().await;
        let pruned = store.prune_expired(now).await;
        if !pruned.is_empty() {
            info!("Pruned {} expired silence record(s) at startup", pruned.len());
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory map with the persisted one.
    pub async fn reload(&self) {
        let loaded = self.load().await;
        let mut records = self.records.lock().await;
        *records = loaded;
    }

    /// Reads the persisted map. A missing file is an empty map; unreadable or malformed
    /// content is logged and also treated as empty.
    pub async fn load(&self) -> SilenceMap {
        match read_map(&self.path).await {
            Ok(Some(map)) => {
                info!("Loaded {} silence record(s) from {}", map.len(), self.path.display());
                map
            }
            Ok(None) => {
                debug!("No silence store at {}, starting empty", self.path.display());
                SilenceMap::new()
            }
            Err(e) => {
                warn!("Ignoring unreadable silence store {}: {}", self.path.display(), e);
                SilenceMap::new()
            }
        }
    }

    /// Persists a full snapshot. Failures are logged and swallowed.
    pub async fn save(&self, map: &SilenceMap) {
        if let Err(e) = write_map(&self.path, map).await {
            error!("Failed to persist silence store to {}: {}", self.path.display(), e);
        } else {
            trace!("Persisted {} silence record(s)", map.len());
        }
    }

    /// Writes the current in-memory state to disk.
    pub async fn flush(&self) {
        let records = self.records.lock().await;
        self.save(&records).await;
    }

    pub async fn set(&self, id: &ConversationId, expiry: f64) {
        let mut records = self.records.lock().await;
        records.insert(id.clone(), expiry);
        self.save(&records).await;
    }

    /// Removes the record and returns the expiry it had, if any.
    pub async fn clear(&self, id: &ConversationId) -> Option<f64> {
        let mut records = self.records.lock().await;
        let previous = records.remove(id);
        self.save(&records).await;
        previous
    }

    /// Removes the record only if it has lapsed at `now`. Returns whether it was removed.
    pub async fn clear_if_lapsed(&self, id: &ConversationId, now: f64) -> bool {
        let mut records = self.records.lock().await;
        match records.get(id) {
            Some(expiry) if now >= *expiry => {
                records.remove(id);
                self.save(&records).await;
                true
            }
            _ => false,
        }
    }

    /// Raw stored expiry, lapsed or not.
    pub async fn get(&self, id: &ConversationId) -> Option<f64> {
        self.records.lock().await.get(id).copied()
    }

    /// Stored expiry only while it is still in the future.
    pub async fn active_expiry(&self, id: &ConversationId, now: f64) -> Option<f64> {
        self.get(id).await.filter(|expiry| now < *expiry)
    }

    /// Drops every lapsed record and returns their ids. Saves only if something changed.
    pub async fn prune_expired(&self, now: f64) -> Vec<ConversationId> {
        let mut records = self.records.lock().await;
        let lapsed: Vec<ConversationId> = records
            .iter()
            .filter(|(_, expiry)| now >= **expiry)
            .map(|(id, _)| id.clone())
            .collect();

        if !lapsed.is_empty() {
            for id in &lapsed {
                records.remove(id);
            }
            self.save(&records).await;
        }
        lapsed
    }

    pub async fn snapshot(&self) -> SilenceMap {
        self.records.lock().await.clone()
    }

    /// Empties the in-memory map without touching the file.
    pub async fn clear_memory(&self) {
        self.records.lock().await.clear();
    }

    pub fn view(&self) -> SilenceView<'_> {
        SilenceView { store: self }
    }
}

/// Read-only access to a [`SilenceStore`]. Handed out by the engine so that nothing
/// outside the gating path can change mute state.
#[derive(Clone, Copy)]
pub struct SilenceView<'a> {
    store: &'a SilenceStore,
}

impl SilenceView<'_> {
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub async fn get(&self, id: &ConversationId) -> Option<f64> {
        self.store.get(id).await
    }

    pub async fn active_expiry(&self, id: &ConversationId, now: f64) -> Option<f64> {
        self.store.active_expiry(id, now).await
    }

    pub async fn snapshot(&self) -> SilenceMap {
        self.store.snapshot().await
    }
}

async fn read_map(path: &Path) -> Result<Option<SilenceMap>, Error> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
        return Ok(Some(SilenceMap::new()));
    }
    let map: SilenceMap = serde_json::from_str(&raw)
        .map_err(|e| Error::Persistence(format!("malformed silence store: {}", e)))?;
    Ok(Some(map))
}

async fn write_map(path: &Path, map: &SilenceMap) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let body = serde_json::to_vec_pretty(map)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
