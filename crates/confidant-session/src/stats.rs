//! Read-only diagnostics over the session set.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::SessionRecord;

/// Per-session diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub message_count: usize,
    /// Milliseconds since the session was registered.
    pub age_ms: i64,
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionStats {
    pub(crate) fn of<M>(record: &SessionRecord<M>, now: DateTime<Utc>) -> Self {
        Self {
            message_count: record.message_count(),
            age_ms: now
                .signed_duration_since(record.created_at())
                .num_milliseconds()
                .max(0),
            last_accessed_at: record.last_accessed_at(),
        }
    }
}

/// Aggregate diagnostics across every live session.
///
/// With no sessions, both timestamps are the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub total_sessions: usize,
    pub total_messages: usize,
    pub oldest_created_at: DateTime<Utc>,
    pub newest_created_at: DateTime<Utc>,
}

impl GlobalStats {
    pub(crate) fn scan<'a, M: 'a>(records: impl IntoIterator<Item = &'a SessionRecord<M>>) -> Self {
        let mut total_sessions = 0;
        let mut total_messages = 0;
        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;

        for record in records {
            total_sessions += 1;
            total_messages += record.message_count();
            let created = record.created_at();
            oldest = Some(oldest.map_or(created, |o| o.min(created)));
            newest = Some(newest.map_or(created, |n| n.max(created)));
        }

        Self {
            total_sessions,
            total_messages,
            oldest_created_at: oldest.unwrap_or_default(),
            newest_created_at: newest.unwrap_or_default(),
        }
    }
}
