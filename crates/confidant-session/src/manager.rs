//! The session manager: a thread-safe facade over the store and scheduler.

use std::any::Any;
use std::ops::ControlFlow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigUpdate, MemoryConfig};
use crate::error::{Error, Result};
use crate::hook::{EvictionReason, NoopHook, SweepHook};
use crate::scheduler::Scheduler;
use crate::stats::{GlobalStats, SessionStats};
use crate::store::{SessionStore, SweepReport};

struct Inner<M, H> {
    store: Mutex<SessionStore<M>>,
    hook: H,
    clock: Arc<dyn Clock>,
    scheduler: Scheduler,
}

impl<M, H: SweepHook> Inner<M, H> {
    /// One full sweep. A panic inside the sweep is caught and returned as an
    /// error; hook panics are reported separately and never hide the report.
    fn sweep(&self) -> Result<SweepReport> {
        let report = catch_unwind(AssertUnwindSafe(|| {
            let now = self.clock.now();
            self.store.lock().sweep(now)
        }))
        .map_err(|payload| Error::SweepFailed(panic_message(payload.as_ref())))?;

        for id in &report.expired {
            self.call_hook(|hook| hook.on_evict(id, EvictionReason::Expired));
        }
        for id in &report.evicted {
            self.call_hook(|hook| hook.on_evict(id, EvictionReason::Capacity));
        }
        self.call_hook(|hook| hook.on_sweep(&report));
        Ok(report)
    }

    /// Invoke the hook, turning a panic into a reported [`Error::HookFailed`].
    fn call_hook(&self, f: impl FnOnce(&H)) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| f(&self.hook))) {
            self.report_error(&Error::HookFailed(panic_message(payload.as_ref())));
        }
    }

    /// Log an error and pass it to `on_sweep_error`. A panic there is only logged.
    fn report_error(&self, e: &Error) {
        error!(error = %e, "Session sweep error");
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.hook.on_sweep_error(e))) {
            error!(
                error = %panic_message(payload.as_ref()),
                "Sweep error hook panicked"
            );
        }
    }

    fn scheduled_sweep(&self) {
        match self.sweep() {
            Ok(report) if report.removed() > 0 || report.trimmed_sessions > 0 => {
                debug!(
                    expired = report.expired.len(),
                    evicted = report.evicted.len(),
                    trimmed_sessions = report.trimmed_sessions,
                    remaining = report.remaining,
                    "Scheduled sweep removed sessions"
                );
            }
            Ok(_) => {}
            Err(e) => self.report_error(&e),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Bounded in-memory store of conversation sessions.
///
/// The manager enforces three limits at once:
/// - at most `max_sessions` sessions survive a sweep (least recently used go first)
/// - at most `max_messages_per_session` messages per session (oldest go first,
///   enforced on every update)
/// - sessions created or last accessed more than `max_age` ago are removed by
///   the next sweep
///
/// Sweeps run on demand via [`sweep_now`](Self::sweep_now) and periodically
/// once [`start_cleanup`](Self::start_cleanup) has been called. All operations
/// share one lock, so a scheduled sweep never interleaves with a foreground
/// call.
///
/// Cloning is cheap and yields a handle to the same sessions. Dropping the
/// last handle cancels the cleanup task.
pub struct SessionManager<M, H: SweepHook = NoopHook> {
    inner: Arc<Inner<M, H>>,
}

impl<M: Send + 'static> SessionManager<M, NoopHook> {
    /// Create a manager with no monitoring hook.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        Self::with_hook(config, NoopHook)
    }
}

impl<M: Send + 'static, H: SweepHook> SessionManager<M, H> {
    /// Create a manager that reports sweeps and evictions to `hook`.
    pub fn with_hook(config: MemoryConfig, hook: H) -> Result<Self> {
        Self::with_clock(config, hook, Arc::new(SystemClock))
    }

    /// Create a manager that reads time from `clock`.
    pub fn with_clock(config: MemoryConfig, hook: H, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let scheduler = Scheduler::new(config.cleanup_interval);
        Ok(Self {
            inner: Arc::new(Inner {
                store: Mutex::new(SessionStore::new(config)),
                hook,
                clock,
                scheduler,
            }),
        })
    }

    /// Snapshot of the limits currently in force.
    pub fn config(&self) -> MemoryConfig {
        self.inner.store.lock().config().clone()
    }

    /// Start tracking a session, replacing any existing one with the same id.
    pub fn register_session(&self, session_id: &str, initial_messages: Vec<M>) {
        let now = self.inner.clock.now();
        let evicted = self
            .inner
            .store
            .lock()
            .register(session_id, initial_messages, now);
        for id in &evicted {
            self.inner
                .call_hook(|hook| hook.on_evict(id, EvictionReason::Capacity));
        }
    }

    /// Append messages to a session. Unknown ids are ignored.
    pub fn update_session(&self, session_id: &str, new_messages: impl IntoIterator<Item = M>) {
        let now = self.inner.clock.now();
        self.inner
            .store
            .lock()
            .update(session_id, new_messages, now);
    }

    /// Stop tracking a session. Unknown ids are ignored.
    pub fn unregister_session(&self, session_id: &str) {
        self.inner.store.lock().unregister(session_id);
    }

    /// Diagnostics for one session, or `None` if it is not tracked.
    pub fn session_stats(&self, session_id: &str) -> Option<SessionStats> {
        let now = self.inner.clock.now();
        self.inner.store.lock().session_stats(session_id, now)
    }

    /// Aggregate diagnostics across all sessions.
    pub fn global_stats(&self) -> GlobalStats {
        self.inner.store.lock().global_stats()
    }

    /// Run a sweep now, returning the number of sessions removed.
    ///
    /// A failed sweep is reported to the hook and counts as removing nothing.
    /// A panicking hook does not change the count.
    pub fn sweep_now(&self) -> usize {
        match self.sweep() {
            Ok(report) => report.removed(),
            Err(e) => {
                self.inner.report_error(&e);
                0
            }
        }
    }

    /// Run a sweep now and return its full report.
    pub fn sweep(&self) -> Result<SweepReport> {
        self.inner.sweep()
    }

    /// Apply a partial configuration change.
    ///
    /// On error nothing changes. New limits apply to operations issued after
    /// this returns; existing sessions are re-checked by the next update or
    /// sweep. A new cleanup interval takes effect from the next tick.
    pub fn update_config(&self, update: ConfigUpdate) -> Result<()> {
        let mut store = self.inner.store.lock();
        let next = store.config().apply(&update).inspect_err(|e| {
            warn!(error = %e, "Rejected session config update");
        })?;
        // Publish the interval under the lock so concurrent updates cannot
        // leave the scheduler on a stale period.
        self.inner.scheduler.set_interval(next.cleanup_interval);
        store.set_config(next);
        Ok(())
    }

    /// Start the periodic sweep on the current tokio runtime.
    ///
    /// Calling this while the task is already running does nothing.
    pub fn start_cleanup(&self) -> Result<()> {
        let target = Arc::downgrade(&self.inner);
        self.inner.scheduler.start(move || match target.upgrade() {
            Some(inner) => {
                inner.scheduled_sweep();
                ControlFlow::Continue(())
            }
            None => ControlFlow::Break(()),
        })
    }

    /// Stop the periodic sweep. Once this returns, no further tick runs.
    pub async fn stop_cleanup(&self) {
        self.inner.scheduler.stop().await;
    }

    /// Whether the periodic sweep is running.
    pub fn is_cleanup_running(&self) -> bool {
        self.inner.scheduler.is_running()
    }

    /// Drop every session.
    pub fn clear_all(&self) {
        let count = self.inner.store.lock().clear();
        debug!(count, "Cleared all sessions");
    }

    /// Whether a session is tracked.
    pub fn contains(&self, session_id: &str) -> bool {
        self.inner.store.lock().contains(session_id)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    /// Ids of all tracked sessions, in no particular order.
    pub fn session_ids(&self) -> Vec<String> {
        self.inner.store.lock().session_ids()
    }
}

impl<M: Clone + Send + 'static, H: SweepHook> SessionManager<M, H> {
    /// Copy of a session's history, oldest first. Reading does not count as
    /// an access.
    pub fn session_messages(&self, session_id: &str) -> Option<Vec<M>> {
        self.inner.store.lock().messages(session_id)
    }
}

impl<M, H: SweepHook> Clone for SessionManager<M, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, H: SweepHook> std::fmt::Debug for SessionManager<M, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("scheduler", &self.inner.scheduler)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn manager(config: MemoryConfig) -> (SessionManager<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let manager = SessionManager::with_clock(config, NoopHook, clock.clone()).unwrap();
        (manager, clock)
    }

    fn msgs(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("message-{i}")).collect()
    }

    #[derive(Default)]
    struct RecordingHook {
        sweeps: AtomicUsize,
        evictions: Mutex<Vec<(String, EvictionReason)>>,
        errors: AtomicUsize,
    }

    impl SweepHook for Arc<RecordingHook> {
        fn on_sweep(&self, _report: &SweepReport) {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
        }

        fn on_evict(&self, session_id: &str, reason: EvictionReason) {
            self.evictions.lock().push((session_id.to_string(), reason));
        }

        fn on_sweep_error(&self, _error: &Error) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Panics on the first sweep only.
    #[derive(Default)]
    struct FlakyHook {
        calls: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SweepHook for Arc<FlakyHook> {
        fn on_sweep(&self, _report: &SweepReport) {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("hook exploded");
            }
        }

        fn on_sweep_error(&self, _error: &Error) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_rejects_invalid_initial_config() {
        let result = SessionManager::<String>::new(MemoryConfig::new().with_max_sessions(0));
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_register_round_trip() {
        let (manager, _) = manager(MemoryConfig::new());
        manager.register_session("s1", msgs(0..7));

        let stats = manager.session_stats("s1").unwrap();
        assert_eq!(stats.message_count, 7);
        assert_eq!(stats.age_ms, 0);
        assert_eq!(manager.session_messages("s1").unwrap(), msgs(0..7));
    }

    #[test]
    fn test_update_caps_messages() {
        let (manager, _) = manager(MemoryConfig::new().with_max_messages_per_session(1000));
        manager.register_session("s1", Vec::new());
        manager.update_session("s1", msgs(0..2000));

        assert_eq!(manager.session_stats("s1").unwrap().message_count, 1000);
        assert_eq!(manager.session_messages("s1").unwrap(), msgs(1000..2000));
    }

    #[test]
    fn test_update_unknown_leaves_state_unchanged() {
        let (manager, _) = manager(MemoryConfig::new());
        manager.register_session("s1", msgs(0..3));
        let before = manager.global_stats();

        manager.update_session("ghost", msgs(0..5));
        assert_eq!(manager.global_stats(), before);
    }

    #[test]
    fn test_sweep_keeps_most_recent_sessions() {
        let (manager, clock) = manager(MemoryConfig::new().with_max_sessions(10));
        for i in 0..10 {
            manager.register_session(&format!("s{i}"), Vec::new());
        }
        // Touch in reverse order so s0 is the most recent.
        for i in (0..10).rev() {
            clock.advance(Duration::from_secs(1));
            manager.update_session(&format!("s{i}"), msgs(0..1));
        }

        manager
            .update_config(ConfigUpdate::new().max_sessions(5))
            .unwrap();
        assert_eq!(manager.sweep_now(), 5);

        let mut ids = manager.session_ids();
        ids.sort();
        assert_eq!(ids, vec!["s0", "s1", "s2", "s3", "s4"]);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let (manager, clock) = manager(
            MemoryConfig::new()
                .with_max_sessions(3)
                .with_max_age(Duration::from_secs(60)),
        );
        for i in 0..3 {
            manager.register_session(&format!("s{i}"), Vec::new());
        }
        clock.advance(Duration::from_secs(61));
        manager.register_session("fresh", Vec::new());

        assert_eq!(manager.sweep_now(), 2);
        assert_eq!(manager.sweep_now(), 0);
        assert_eq!(manager.session_ids(), vec!["fresh".to_string()]);
    }

    #[test]
    fn test_aged_session_removed() {
        let (manager, clock) = manager(MemoryConfig::new().with_max_age(Duration::from_secs(60)));
        manager.register_session("s1", msgs(0..1));
        clock.advance(Duration::from_secs(61));

        assert_eq!(manager.sweep_now(), 1);
        assert!(!manager.contains("s1"));
    }

    #[test]
    fn test_removed_session_stays_removed() {
        let (manager, _) = manager(MemoryConfig::new());
        manager.register_session("s1", Vec::new());
        manager.unregister_session("s1");
        manager.update_session("s1", msgs(0..1));

        assert!(manager.session_stats("s1").is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_invalid_update_keeps_previous_config() {
        let (manager, _) = manager(MemoryConfig::new().with_max_sessions(7));
        let result = manager.update_config(
            ConfigUpdate::new()
                .max_sessions(3)
                .max_messages_per_session(0),
        );

        assert!(result.is_err());
        assert_eq!(manager.config().max_sessions, 7);
    }

    #[test]
    fn test_config_change_applies_to_later_updates() {
        let (manager, _) = manager(MemoryConfig::new().with_max_messages_per_session(10));
        manager.register_session("s1", msgs(0..8));
        manager
            .update_config(ConfigUpdate::new().max_messages_per_session(4))
            .unwrap();

        // Not re-evaluated until the next update or sweep.
        assert_eq!(manager.session_stats("s1").unwrap().message_count, 8);
        manager.update_session("s1", msgs(8..9));
        assert_eq!(manager.session_messages("s1").unwrap(), msgs(5..9));
    }

    #[test]
    fn test_clear_all() {
        let (manager, _) = manager(MemoryConfig::new());
        manager.register_session("a", msgs(0..2));
        manager.register_session("b", msgs(0..2));
        manager.clear_all();

        let stats = manager.global_stats();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_messages, 0);
    }

    #[test]
    fn test_hook_sees_evictions() {
        let hook = Arc::new(RecordingHook::default());
        let clock = Arc::new(ManualClock::starting_now());
        let manager: SessionManager<u32, _> = SessionManager::with_clock(
            MemoryConfig::new()
                .with_max_sessions(1)
                .with_max_age(Duration::from_secs(10)),
            hook.clone(),
            clock.clone(),
        )
        .unwrap();

        manager.register_session("a", Vec::new());
        clock.advance(Duration::from_secs(1));
        manager.register_session("b", Vec::new());
        clock.advance(Duration::from_secs(20));
        manager.sweep_now();

        let evictions = hook.evictions.lock().clone();
        assert_eq!(
            evictions,
            vec![
                ("a".to_string(), EvictionReason::Capacity),
                ("b".to_string(), EvictionReason::Expired),
            ]
        );
        assert_eq!(hook.sweeps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_panic_is_reported() {
        let hook = Arc::new(FlakyHook::default());
        let manager: SessionManager<u32, _> =
            SessionManager::with_hook(MemoryConfig::new(), hook.clone()).unwrap();

        let report = manager.sweep().unwrap();
        assert_eq!(report.removed(), 0);
        assert_eq!(hook.errors.load(Ordering::SeqCst), 1);

        // The lock is not poisoned; the manager keeps working.
        manager.register_session("s1", vec![1]);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_hook_panic_keeps_removed_count() {
        let hook = Arc::new(FlakyHook::default());
        let clock = Arc::new(ManualClock::starting_now());
        let manager: SessionManager<u32, _> = SessionManager::with_clock(
            MemoryConfig::new().with_max_age(Duration::from_secs(10)),
            hook.clone(),
            clock.clone(),
        )
        .unwrap();
        manager.register_session("a", vec![1]);
        manager.register_session("b", vec![2]);
        clock.advance(Duration::from_secs(11));

        assert_eq!(manager.sweep_now(), 2);
        assert!(manager.is_empty());
        assert_eq!(hook.errors.load(Ordering::SeqCst), 1);
    }

    /// Panics when notified about session "a".
    #[derive(Default)]
    struct PickyHook {
        inner: RecordingHook,
    }

    impl SweepHook for Arc<PickyHook> {
        fn on_sweep(&self, _report: &SweepReport) {
            self.inner.sweeps.fetch_add(1, Ordering::SeqCst);
        }

        fn on_evict(&self, session_id: &str, reason: EvictionReason) {
            if session_id == "a" {
                panic!("cannot evict a");
            }
            self.inner
                .evictions
                .lock()
                .push((session_id.to_string(), reason));
        }

        fn on_sweep_error(&self, error: &Error) {
            if matches!(error, Error::HookFailed(msg) if msg == "cannot evict a") {
                self.inner.errors.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_evict_hook_panic_does_not_skip_others() {
        let hook = Arc::new(PickyHook::default());
        let clock = Arc::new(ManualClock::starting_now());
        let manager: SessionManager<u32, _> = SessionManager::with_clock(
            MemoryConfig::new().with_max_age(Duration::from_secs(10)),
            hook.clone(),
            clock.clone(),
        )
        .unwrap();
        manager.register_session("a", Vec::new());
        manager.register_session("b", Vec::new());
        clock.advance(Duration::from_secs(11));

        assert_eq!(manager.sweep_now(), 2);
        assert_eq!(
            hook.inner.evictions.lock().clone(),
            vec![("b".to_string(), EvictionReason::Expired)]
        );
        assert_eq!(hook.inner.sweeps.load(Ordering::SeqCst), 1);
        assert_eq!(hook.inner.errors.load(Ordering::SeqCst), 1);
    }

    /// A clock that panics once broken.
    #[derive(Debug, Default)]
    struct BrokenClock {
        broken: AtomicBool,
    }

    impl Clock for BrokenClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            if self.broken.load(Ordering::SeqCst) {
                panic!("clock went away");
            }
            chrono::Utc::now()
        }
    }

    #[test]
    fn test_failed_sweep_is_reported() {
        let hook = Arc::new(RecordingHook::default());
        let clock = Arc::new(BrokenClock::default());
        let manager: SessionManager<u32, _> =
            SessionManager::with_clock(MemoryConfig::new(), hook.clone(), clock.clone()).unwrap();
        manager.register_session("s1", vec![1]);
        clock.broken.store(true, Ordering::SeqCst);

        assert!(matches!(manager.sweep(), Err(Error::SweepFailed(msg)) if msg == "clock went away"));
        assert_eq!(manager.sweep_now(), 0);
        assert_eq!(hook.errors.load(Ordering::SeqCst), 1);
        assert_eq!(hook.sweeps.load(Ordering::SeqCst), 0);

        clock.broken.store(false, Ordering::SeqCst);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.sweep_now(), 0);
    }

    #[test]
    fn test_concurrent_config_updates_keep_interval_in_sync() {
        let (manager, _) = manager(MemoryConfig::new());
        std::thread::scope(|scope| {
            for t in 1..=8u64 {
                let manager = manager.clone();
                scope.spawn(move || {
                    for i in 0..200u64 {
                        let secs = t * 1000 + i;
                        manager
                            .update_config(
                                ConfigUpdate::new().cleanup_interval(Duration::from_secs(secs)),
                            )
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(
            manager.inner.scheduler.interval(),
            manager.config().cleanup_interval
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_sweep_evicts() {
        let (manager, clock) = manager(
            MemoryConfig::new()
                .with_max_age(Duration::from_secs(60))
                .with_cleanup_interval(Duration::from_secs(5)),
        );
        manager.register_session("s1", msgs(0..1));
        manager.start_cleanup().unwrap();
        assert!(manager.is_cleanup_running());

        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(manager.is_empty());

        manager.stop_cleanup().await;
        assert!(!manager.is_cleanup_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sweep_after_stop() {
        let (manager, clock) = manager(
            MemoryConfig::new()
                .with_max_age(Duration::from_secs(60))
                .with_cleanup_interval(Duration::from_secs(5)),
        );
        manager.start_cleanup().unwrap();
        manager.start_cleanup().unwrap();
        manager.stop_cleanup().await;

        manager.register_session("s1", msgs(0..1));
        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(manager.contains("s1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_sweep_survives_failure() {
        let hook = Arc::new(FlakyHook::default());
        let manager: SessionManager<u32, _> = SessionManager::with_hook(
            MemoryConfig::new().with_cleanup_interval(Duration::from_secs(1)),
            hook.clone(),
        )
        .unwrap();
        manager.start_cleanup().unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(hook.errors.load(Ordering::SeqCst), 1);
        assert_eq!(hook.calls.load(Ordering::SeqCst), 3);
        assert!(manager.is_cleanup_running());
        manager.stop_cleanup().await;
    }

    /// Panics in every callback, including error reporting.
    #[derive(Default)]
    struct HostileHook {
        sweeps: AtomicUsize,
    }

    impl SweepHook for Arc<HostileHook> {
        fn on_sweep(&self, _report: &SweepReport) {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            panic!("on_sweep failed");
        }

        fn on_sweep_error(&self, _error: &Error) {
            panic!("on_sweep_error failed");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_error_hook_does_not_stop_cleanup() {
        let hook = Arc::new(HostileHook::default());
        let manager: SessionManager<u32, _> = SessionManager::with_hook(
            MemoryConfig::new().with_cleanup_interval(Duration::from_secs(1)),
            hook.clone(),
        )
        .unwrap();
        manager.start_cleanup().unwrap();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(hook.sweeps.load(Ordering::SeqCst), 3);
        assert!(manager.is_cleanup_running());
        assert_eq!(manager.sweep_now(), 0);
        manager.stop_cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_update_reschedules() {
        let hook = Arc::new(RecordingHook::default());
        let manager: SessionManager<u32, _> = SessionManager::with_hook(
            MemoryConfig::new().with_cleanup_interval(Duration::from_secs(300)),
            hook.clone(),
        )
        .unwrap();
        manager.start_cleanup().unwrap();

        manager
            .update_config(ConfigUpdate::new().cleanup_interval(Duration::from_secs(1)))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(hook.sweeps.load(Ordering::SeqCst), 3);
        manager.stop_cleanup().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_manager_ends_cleanup() {
        let hook = Arc::new(RecordingHook::default());
        let manager: SessionManager<u32, _> = SessionManager::with_hook(
            MemoryConfig::new().with_cleanup_interval(Duration::from_secs(1)),
            hook.clone(),
        )
        .unwrap();
        manager.start_cleanup().unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(manager);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(hook.sweeps.load(Ordering::SeqCst), 1);
    }
}
