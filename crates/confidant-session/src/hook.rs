//! Monitoring hooks for eviction and sweep outcomes.
//!
//! Hooks are invoked after the store lock has been released, so an
//! implementation may call back into the manager (for example to read
//! [`global_stats`](crate::SessionManager::global_stats)).

use crate::error::Error;
use crate::store::SweepReport;

/// Why a session was removed without being unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
    /// Too old, or idle for too long.
    Expired,
    /// Dropped as least recently used to get back under `max_sessions`.
    Capacity,
}

/// Receives notifications about evictions and sweeps.
///
/// Every method has a no-op default, so implementors only override what
/// they care about.
pub trait SweepHook: Send + Sync + 'static {
    /// Called once per completed sweep, manual or scheduled.
    fn on_sweep(&self, _report: &SweepReport) {}

    /// Called for each session removed by a sweep or by registration
    /// pushing the store over capacity.
    fn on_evict(&self, _session_id: &str, _reason: EvictionReason) {}

    /// Called when a sweep fails or another hook method panics. The scheduler
    /// keeps running afterwards.
    fn on_sweep_error(&self, _error: &Error) {}
}

/// A hook that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl SweepHook for NoopHook {}
