//! Bounded chat view model
//!
//! Fixed-capacity ring buffer: newest entries at the front, O(1) push and
//! evict, entries immutable once inserted. Retention and render caps come
//! from [`crate::config::EngineConfig`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEntryKind {
    User,
    System,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub id: Uuid,
    pub kind: ChatEntryKind,
    pub sender_id: Option<Uuid>,
    pub sender_name: String,
    pub body: String,
    /// Privileged senders get distinct styling. Display-only.
    pub privileged: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn user(sender_id: Uuid, sender_name: String, body: String, privileged: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ChatEntryKind::User,
            sender_id: Some(sender_id),
            sender_name,
            body,
            privileged,
            created_at: Utc::now(),
        }
    }

    pub fn system(body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ChatEntryKind::System,
            sender_id: None,
            sender_name: String::new(),
            body,
            privileged: false,
            created_at: Utc::now(),
        }
    }
}

/// Ordered chat history, newest first. FIFO eviction, LIFO display.
#[derive(Debug, Clone)]
pub struct ChatLog {
    entries: VecDeque<ChatEntry>,
    retention: usize,
    rendered: usize,
}

impl ChatLog {
    pub fn new(retention: usize, rendered: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(retention + 1),
            retention,
            rendered,
        }
    }

    /// Prepend an entry, evicting the oldest once over capacity.
    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push_front(entry);
        while self.entries.len() > self.retention {
            self.entries.pop_back();
        }
    }

    /// Entries the UI should render, newest first.
    pub fn rendered(&self) -> Vec<ChatEntry> {
        self.entries.iter().take(self.rendered).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
