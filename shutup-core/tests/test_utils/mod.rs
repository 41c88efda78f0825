// File: shutup-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};

use shutup_common::Error;
use shutup_common::models::{ConversationId, DisplayLabel, ShutupConfig};
use shutup_common::traits::DisplayDecoration;

pub const BOT_ID: &str = "10001";

/// Replies that expose the substituted duration only, so assertions stay readable.
pub fn test_config() -> ShutupConfig {
    ShutupConfig {
        shutup_reply: "muted {duration}".to_string(),
        unshutup_reply: "unmuted {duration}".to_string(),
        ..ShutupConfig::default()
    }
}

pub fn at_epoch(secs: i64) -> DateTime<Local> {
    Local.timestamp_opt(secs, 0).unwrap()
}

pub fn at_clock(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 3, hour, minute, 0).single().unwrap()
}

/// In-memory display-label backend that records every write.
pub struct RecordingDisplay {
    original: DisplayLabel,
    current: Mutex<HashMap<ConversationId, String>>,
    pub writes: Mutex<Vec<(ConversationId, String)>>,
}

impl RecordingDisplay {
    pub fn new(card: &str) -> Arc<Self> {
        Arc::new(Self {
            original: DisplayLabel {
                card: card.to_string(),
                nickname: "shutup-bot".to_string(),
                name: "Shutup Bot".to_string(),
            },
            current: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
        })
    }

    pub fn label(&self, id: &str) -> Option<String> {
        self.current.lock().unwrap().get(&ConversationId::from(id)).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl DisplayDecoration for RecordingDisplay {
    async fn get_label(&self, conversation: &ConversationId) -> Result<DisplayLabel, Error> {
        let mut label = self.original.clone();
        if let Some(card) = self.current.lock().unwrap().get(conversation) {
            label.card = card.clone();
        }
        Ok(label)
    }

    async fn set_label(&self, conversation: &ConversationId, label: &str) -> Result<(), Error> {
        self.current
            .lock()
            .unwrap()
            .insert(conversation.clone(), label.to_string());
        self.writes
            .lock()
            .unwrap()
            .push((conversation.clone(), label.to_string()));
        Ok(())
    }
}
