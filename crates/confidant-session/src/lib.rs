//! Bounded in-process session memory.
//!
//! This crate keeps per-conversation state (message history plus access
//! timestamps) under three simultaneous limits:
//! - a cap on the number of sessions, enforced by LRU eviction
//! - a cap on messages per session, enforced on every update by dropping
//!   the oldest messages
//! - a maximum age, measured both from creation and from last access
//!
//! Expired and excess sessions are reclaimed by a sweep, either on demand or
//! from a periodic background task.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use confidant_session::{MemoryConfig, SessionManager};
//!
//! let config = MemoryConfig::default()
//!     .with_max_sessions(50)
//!     .with_max_age(Duration::from_secs(3600));
//!
//! let sessions: SessionManager<String> = SessionManager::new(config)?;
//! sessions.register_session("chat-1", Vec::new());
//! sessions.update_session("chat-1", ["hello".to_string()]);
//! sessions.start_cleanup()?;
//! ```

mod clock;
mod config;
mod error;
mod eviction;
mod hook;
mod manager;
mod record;
mod scheduler;
mod stats;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ConfigUpdate, DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_AGE, DEFAULT_MAX_MESSAGES_PER_SESSION,
    DEFAULT_MAX_SESSIONS, MAX_CLEANUP_INTERVAL, MemoryConfig, SessionMemorySettings, load_settings,
};
pub use error::{Error, Result};
pub use eviction::{EvictionPlan, capacity_victims, is_expired, plan as plan_eviction};
pub use hook::{EvictionReason, NoopHook, SweepHook};
pub use manager::SessionManager;
pub use record::SessionRecord;
pub use scheduler::Scheduler;
pub use stats::{GlobalStats, SessionStats};
pub use store::{SessionStore, SweepReport};
