//! Configuration for the session memory manager.
//!
//! [`MemoryConfig`] is the validated runtime form. [`SessionMemorySettings`]
//! is the serde form read from the `[session]` table of a TOML file:
//!
//! ```toml
//! [session]
//! max_sessions = 100
//! max_messages_per_session = 1000
//! max_age_secs = 86400
//! cleanup_interval_secs = 300
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 100;

/// Default maximum number of messages retained per session.
pub const DEFAULT_MAX_MESSAGES_PER_SESSION: usize = 1000;

/// Default age / staleness threshold (24 hours).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Default interval between scheduled sweeps (5 minutes).
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Longest accepted interval between scheduled sweeps (365 days).
pub const MAX_CLEANUP_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Resource limits enforced by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Maximum number of sessions kept after a sweep.
    pub max_sessions: usize,

    /// Maximum number of messages kept per session; older ones are dropped first.
    pub max_messages_per_session: usize,

    /// Sessions older than this, or idle for longer than this, are evicted.
    pub max_age: Duration,

    /// Period of the background sweep.
    pub cleanup_interval: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_messages_per_session: DEFAULT_MAX_MESSAGES_PER_SESSION,
            max_age: DEFAULT_MAX_AGE,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl MemoryConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the per-session message cap.
    pub fn with_max_messages_per_session(mut self, max: usize) -> Self {
        self.max_messages_per_session = max;
        self
    }

    /// Set the age / staleness threshold.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the sweep interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Check that every limit is strictly positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(Error::invalid("max_sessions", "must be greater than zero"));
        }
        if self.max_messages_per_session == 0 {
            return Err(Error::invalid(
                "max_messages_per_session",
                "must be greater than zero",
            ));
        }
        if self.max_age.is_zero() {
            return Err(Error::invalid("max_age", "must be a non-zero duration"));
        }
        if self.cleanup_interval.is_zero() {
            return Err(Error::invalid(
                "cleanup_interval",
                "must be a non-zero duration",
            ));
        }
        if self.cleanup_interval > MAX_CLEANUP_INTERVAL {
            return Err(Error::invalid(
                "cleanup_interval",
                format!("must not exceed {} seconds", MAX_CLEANUP_INTERVAL.as_secs()),
            ));
        }
        Ok(())
    }

    /// Produce a new configuration with `update` applied.
    ///
    /// `self` is never modified; on error the caller keeps using it.
    pub fn apply(&self, update: &ConfigUpdate) -> Result<Self> {
        let mut next = self.clone();
        if let Some(v) = update.max_sessions {
            next.max_sessions = v;
        }
        if let Some(v) = update.max_messages_per_session {
            next.max_messages_per_session = v;
        }
        if let Some(v) = update.max_age {
            next.max_age = v;
        }
        if let Some(v) = update.cleanup_interval {
            next.cleanup_interval = v;
        }
        next.validate()?;
        Ok(next)
    }
}

/// A partial configuration change. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub max_sessions: Option<usize>,
    pub max_messages_per_session: Option<usize>,
    pub max_age: Option<Duration>,
    pub cleanup_interval: Option<Duration>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = Some(max);
        self
    }

    pub fn max_messages_per_session(mut self, max: usize) -> Self {
        self.max_messages_per_session = Some(max);
        self
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }
}

/// Session memory settings as written in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMemorySettings {
    /// Maximum number of sessions kept after a sweep.
    pub max_sessions: usize,
    /// Maximum number of messages kept per session.
    pub max_messages_per_session: usize,
    /// Age / staleness threshold in seconds.
    pub max_age_secs: u64,
    /// Seconds between background sweeps.
    pub cleanup_interval_secs: u64,
}

impl Default for SessionMemorySettings {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_messages_per_session: DEFAULT_MAX_MESSAGES_PER_SESSION,
            max_age_secs: DEFAULT_MAX_AGE.as_secs(),
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL.as_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    session: SessionMemorySettings,
}

impl SessionMemorySettings {
    /// Parse the `[session]` table out of a TOML document.
    ///
    /// Other tables are ignored, and a missing `[session]` table yields defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(contents)?;
        Ok(file.session)
    }
}

impl TryFrom<SessionMemorySettings> for MemoryConfig {
    type Error = Error;

    fn try_from(settings: SessionMemorySettings) -> Result<Self> {
        let config = MemoryConfig {
            max_sessions: settings.max_sessions,
            max_messages_per_session: settings.max_messages_per_session,
            max_age: Duration::from_secs(settings.max_age_secs),
            cleanup_interval: Duration::from_secs(settings.cleanup_interval_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<&MemoryConfig> for SessionMemorySettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            max_sessions: config.max_sessions,
            max_messages_per_session: config.max_messages_per_session,
            max_age_secs: config.max_age.as_secs(),
            cleanup_interval_secs: config.cleanup_interval.as_secs(),
        }
    }
}

/// Load and validate session memory settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<MemoryConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    SessionMemorySettings::from_toml(&contents)?.try_into()
}
