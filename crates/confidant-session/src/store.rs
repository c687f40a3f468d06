//! Session store: the id → record map and the operations that mutate it.
//!
//! The store is single-threaded and takes "now" from its caller. The
//! [`SessionManager`](crate::SessionManager) wraps it in a lock and supplies
//! timestamps from its clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::config::MemoryConfig;
use crate::eviction;
use crate::record::SessionRecord;
use crate::stats::{GlobalStats, SessionStats};

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Ids removed by the age phase.
    pub expired: Vec<String>,
    /// Ids removed by the capacity phase.
    pub evicted: Vec<String>,
    /// Sessions whose history was trimmed by the message pass.
    pub trimmed_sessions: usize,
    /// Messages dropped by the message pass.
    pub trimmed_messages: usize,
    /// Sessions left after the sweep.
    pub remaining: usize,
    /// Wall time spent inside the sweep.
    pub duration: Duration,
}

impl SweepReport {
    /// Number of sessions removed across both phases.
    pub fn removed(&self) -> usize {
        self.expired.len() + self.evicted.len()
    }
}

/// Owns every [`SessionRecord`] and the limits applied to them.
#[derive(Debug)]
pub struct SessionStore<M> {
    sessions: HashMap<String, SessionRecord<M>>,
    config: MemoryConfig,
    next_seq: u64,
}

impl<M> SessionStore<M> {
    /// Create an empty store. `config` is assumed to be validated.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
            next_seq: 0,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Replace the limits. Existing sessions are only re-checked by the next
    /// update or sweep.
    pub fn set_config(&mut self, config: MemoryConfig) {
        self.config = config;
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Ids of every live session, in no particular order.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, session_id: &str) -> Option<&SessionRecord<M>> {
        self.sessions.get(session_id)
    }

    /// Create or replace a session.
    ///
    /// If this pushes the store over `max_sessions`, the least recently used
    /// sessions are evicted right away. Returns the evicted ids.
    pub fn register(
        &mut self,
        session_id: &str,
        initial_messages: Vec<M>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let seq = self.next_seq;
        self.next_seq += 1;

        let mut record = SessionRecord::new(session_id.to_string(), initial_messages, now, seq);
        record.trim_to(self.config.max_messages_per_session);
        let replaced = self.sessions.insert(session_id.to_string(), record).is_some();

        trace!(
            session_id = %session_id,
            replaced,
            session_count = self.sessions.len(),
            "Session registered"
        );

        if self.sessions.len() <= self.config.max_sessions {
            return Vec::new();
        }

        let victims = eviction::capacity_victims(self.sessions.values(), self.config.max_sessions);
        for id in &victims {
            self.sessions.remove(id);
            debug!(session_id = %id, "Evicting LRU session to make room");
        }
        victims
    }

    /// Append messages to a session and trim it to the per-session cap.
    ///
    /// Unknown ids are ignored. Returns whether the session existed.
    pub fn update(
        &mut self,
        session_id: &str,
        new_messages: impl IntoIterator<Item = M>,
        now: DateTime<Utc>,
    ) -> bool {
        let cap = self.config.max_messages_per_session;
        let Some(record) = self.sessions.get_mut(session_id) else {
            trace!(session_id = %session_id, "Update for unknown session ignored");
            return false;
        };

        record.append(new_messages, now);
        let dropped = record.trim_to(cap);

        trace!(
            session_id = %session_id,
            message_count = record.message_count(),
            dropped,
            "Session updated"
        );
        true
    }

    /// Remove a session, releasing its history. Returns whether it existed.
    pub fn unregister(&mut self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            trace!(session_id = %session_id, "Session unregistered");
        }
        removed
    }

    pub fn session_stats(&self, session_id: &str, now: DateTime<Utc>) -> Option<SessionStats> {
        self.sessions
            .get(session_id)
            .map(|record| SessionStats::of(record, now))
    }

    pub fn global_stats(&self) -> GlobalStats {
        GlobalStats::scan(self.sessions.values())
    }

    /// Run the age phase, the capacity phase and the message-trim pass.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> SweepReport {
        let started = Instant::now();
        let plan = eviction::plan(&self.sessions, &self.config, now);

        for id in &plan.expired {
            self.sessions.remove(id);
            debug!(session_id = %id, "Removing expired session");
        }
        for id in &plan.over_capacity {
            self.sessions.remove(id);
            debug!(session_id = %id, "Evicting least recently used session");
        }

        let cap = self.config.max_messages_per_session;
        let mut trimmed_sessions = 0;
        let mut trimmed_messages = 0;
        for record in self.sessions.values_mut() {
            let dropped = record.trim_to(cap);
            if dropped > 0 {
                trimmed_sessions += 1;
                trimmed_messages += dropped;
            }
        }

        SweepReport {
            expired: plan.expired,
            evicted: plan.over_capacity,
            trimmed_sessions,
            trimmed_messages,
            remaining: self.sessions.len(),
            duration: started.elapsed(),
        }
    }

    /// Remove every session. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.sessions.len();
        // Replace rather than clear so the map's allocation is released too.
        self.sessions = HashMap::new();
        count
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, session_id: &str) -> Option<&mut SessionRecord<M>> {
        self.sessions.get_mut(session_id)
    }
}

impl<M: Clone> SessionStore<M> {
    /// Copy of a session's history, oldest first. Does not count as an access.
    pub fn messages(&self, session_id: &str) -> Option<Vec<M>> {
        self.sessions
            .get(session_id)
            .map(|record| record.messages().iter().cloned().collect())
    }
}
