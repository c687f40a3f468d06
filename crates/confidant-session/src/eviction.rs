//! Eviction policy: decides which sessions a sweep removes.
//!
//! Nothing here mutates state. The store asks for an [`EvictionPlan`] and
//! applies it while holding its lock.
//!
//! A sweep has two phases:
//! 1. Age: a session is expired when either its creation or its last access
//!    lies more than `max_age` in the past.
//! 2. Capacity: if more than `max_sessions` survive the age phase, the least
//!    recently accessed are removed until exactly `max_sessions` remain.
//!    Equal access times fall back to registration order, oldest first.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::MemoryConfig;
use crate::record::SessionRecord;

/// Session ids selected for removal by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionPlan {
    /// Removed by the age phase.
    pub expired: Vec<String>,
    /// Removed by the capacity phase, least recently used first.
    pub over_capacity: Vec<String>,
}

impl EvictionPlan {
    /// Total number of sessions this plan removes.
    pub fn total(&self) -> usize {
        self.expired.len() + self.over_capacity.len()
    }
}

/// Whether more than `max_age` has passed since `since`.
///
/// Timestamps in the future never count as exceeded.
fn exceeds(now: DateTime<Utc>, since: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(since)
        .to_std()
        .is_ok_and(|elapsed| elapsed > max_age)
}

/// Age check shared by both age conditions.
pub fn is_expired<M>(record: &SessionRecord<M>, now: DateTime<Utc>, max_age: Duration) -> bool {
    exceeds(now, record.created_at(), max_age) || exceeds(now, record.last_accessed_at(), max_age)
}

/// Pick the least recently used sessions to drop so at most `max_sessions` remain.
pub fn capacity_victims<'a, M: 'a>(
    candidates: impl IntoIterator<Item = &'a SessionRecord<M>>,
    max_sessions: usize,
) -> Vec<String> {
    let mut candidates: Vec<&SessionRecord<M>> = candidates.into_iter().collect();
    if candidates.len() <= max_sessions {
        return Vec::new();
    }

    let excess = candidates.len() - max_sessions;
    candidates.sort_by_key(|r| (r.last_accessed_at(), r.seq()));
    candidates
        .into_iter()
        .take(excess)
        .map(|r| r.id().to_string())
        .collect()
}

/// Compute the full two-phase plan for the current session set.
pub fn plan<M>(
    sessions: &HashMap<String, SessionRecord<M>>,
    config: &MemoryConfig,
    now: DateTime<Utc>,
) -> EvictionPlan {
    let (mut expired, survivors): (Vec<&SessionRecord<M>>, Vec<&SessionRecord<M>>) = sessions
        .values()
        .partition(|r| is_expired(r, now, config.max_age));
    expired.sort_by_key(|r| r.seq());

    EvictionPlan {
        expired: expired.into_iter().map(|r| r.id().to_string()).collect(),
        over_capacity: capacity_victims(survivors, config.max_sessions),
    }
}
