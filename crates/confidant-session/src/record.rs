//! Per-session state held by the store.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// A single tracked conversation.
///
/// Records are owned by the store. Callers only ever see copies of the
/// message history or the derived stats.
#[derive(Debug, Clone)]
pub struct SessionRecord<M> {
    id: String,
    messages: VecDeque<M>,
    created_at: DateTime<Utc>,
    last_accessed_at: DateTime<Utc>,
    /// Registration order, used to break ties between equal access times.
    seq: u64,
}

impl<M> SessionRecord<M> {
    pub(crate) fn new(id: String, messages: Vec<M>, now: DateTime<Utc>, seq: u64) -> Self {
        Self {
            id,
            messages: messages.into(),
            created_at: now,
            last_accessed_at: now,
            seq,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &VecDeque<M> {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        self.last_accessed_at
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Append messages and mark the record as accessed at `now`.
    pub(crate) fn append(&mut self, new_messages: impl IntoIterator<Item = M>, now: DateTime<Utc>) {
        self.messages.extend(new_messages);
        // A clock stepping backwards must not put the access before creation.
        self.last_accessed_at = now.max(self.created_at);
    }

    /// Drop the oldest messages until at most `cap` remain. Returns how many were dropped.
    pub(crate) fn trim_to(&mut self, cap: usize) -> usize {
        let excess = self.messages.len().saturating_sub(cap);
        if excess > 0 {
            self.messages.drain(..excess);
        }
        excess
    }

    #[cfg(test)]
    pub(crate) fn touch_at(&mut self, at: DateTime<Utc>) {
        self.last_accessed_at = at.max(self.created_at);
    }

    #[cfg(test)]
    pub(crate) fn messages_mut(&mut self) -> &mut VecDeque<M> {
        &mut self.messages
    }
}
