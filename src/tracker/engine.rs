//! The debounce and session-boundary state machine.
//!
//! One engine belongs to exactly one worker. Every tick reads the foreground
//! window, resolves it to an [`ActiveItem`], and only acts once the same label
//! has been seen `debounce_count` times in a row. Sessions are closed lazily:
//! the duration is computed from the start time when the next item takes
//! over, or when the engine is flushed.

use super::clock::Clock;
use crate::classifier::Classifier;
use crate::config::{CategoryPolicy, TrackerConfig};
use crate::error::AppError;
use crate::focus::{self, NotificationCooldown, BLOCKED_ALERT_TITLE, BREAK_ALERT_TITLE};
use crate::models::{ActiveItem, Category, ItemKind, PendingCandidate, Session, SessionRecord};
use crate::notify::Notifier;
use crate::platform::{Observation, WindowInspector};
use crate::store::ActivityStore;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// External collaborators the engine calls during a tick.
pub struct EngineParts {
    pub inspector: Box<dyn WindowInspector>,
    pub store: Box<dyn ActivityStore>,
    pub notifier: Box<dyn Notifier>,
    pub clock: Box<dyn Clock>,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The engine has been flushed and no longer tracks anything.
    Inert,
    /// The candidate has not been seen often enough yet.
    Absorbed { label: String, stable_count: u32 },
    /// The open session continues.
    Continued,
    /// A new session opened. `closed` is the record emitted for the previous
    /// session, if it was long enough to keep.
    Transitioned { closed: Option<SessionRecord> },
}

#[derive(Debug, Clone, Copy)]
struct Thresholds {
    debounce_count: u32,
    min_log_secs: i64,
    notification_cooldown_secs: i64,
    break_reminder_secs: Option<i64>,
}

pub struct SessionEngine {
    inspector: Box<dyn WindowInspector>,
    store: Box<dyn ActivityStore>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    classifier: Classifier,
    policy: CategoryPolicy,
    thresholds: Thresholds,
    pending: Option<PendingCandidate>,
    session: Option<Session>,
    blocked_cooldown: NotificationCooldown,
    break_cooldown: NotificationCooldown,
    degraded: Arc<AtomicBool>,
    inert: bool,
}

impl SessionEngine {
    pub fn new(parts: EngineParts, classifier: Classifier, config: &TrackerConfig) -> Self {
        Self {
            inspector: parts.inspector,
            store: parts.store,
            notifier: parts.notifier,
            clock: parts.clock,
            classifier,
            policy: config.category_policy,
            thresholds: Thresholds {
                debounce_count: config.debounce_count.max(1),
                min_log_secs: config.min_log_secs,
                notification_cooldown_secs: config.notification_cooldown_secs,
                break_reminder_secs: config.break_reminder_secs,
            },
            pending: None,
            session: None,
            blocked_cooldown: NotificationCooldown::default(),
            break_cooldown: NotificationCooldown::default(),
            degraded: Arc::new(AtomicBool::new(false)),
            inert: false,
        }
    }

    /// Flag raised while session records cannot be persisted.
    pub fn degraded_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.degraded)
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_inert(&self) -> bool {
        self.inert
    }

    pub fn poll_once(&mut self) -> TickOutcome {
        if self.inert {
            return TickOutcome::Inert;
        }

        let now = self.clock.now();
        let observation = self.inspector.inspect_foreground_window().unwrap_or_else(|e| {
            warn!("Window inspection failed: {e}");
            Observation::default()
        });
        let item = self.classifier.resolve(&observation);
        debug!(
            "Observed {:?} / {:?} -> {} ({:?})",
            observation.process_executable, observation.window_title, item.label, item.kind
        );

        let pending = match self.pending.take() {
            Some(mut pending) => {
                pending.observe(item);
                pending
            }
            None => PendingCandidate::new(item),
        };

        if pending.stable_count < self.thresholds.debounce_count {
            let outcome = TickOutcome::Absorbed {
                label: pending.item.label.clone(),
                stable_count: pending.stable_count,
            };
            self.pending = Some(pending);
            return outcome;
        }
        let candidate = pending.item.clone();
        self.pending = Some(pending);

        self.check_blocked(&candidate, now);

        let same_item = self
            .session
            .as_ref()
            .is_some_and(|session| session.item.same_label(&candidate));
        if same_item {
            self.check_break(now);
            return TickOutcome::Continued;
        }

        let closed = self.close_session(now);
        info!("Session opened: {} ({:?})", candidate.label, candidate.kind);
        self.session = Some(Session::open(candidate, now));
        self.blocked_cooldown.reset();
        self.break_cooldown.reset();
        self.pending = None;

        TickOutcome::Transitioned { closed }
    }

    /// Close the open session without debouncing and stop tracking.
    /// Later calls do nothing.
    pub fn flush(&mut self) -> Option<SessionRecord> {
        if self.inert {
            return None;
        }
        self.inert = true;
        self.pending = None;
        let now = self.clock.now();
        self.close_session(now)
    }

    fn close_session(&mut self, now: DateTime<Utc>) -> Option<SessionRecord> {
        let session = self.session.take()?;
        let category = self.policy.resolve(session.item.kind, session.item.category_hint);
        let record = SessionRecord::from_session(session, now, category);

        if record.duration_secs < self.thresholds.min_log_secs {
            debug!(
                "Dropping {}s session for {} (minimum {}s)",
                record.duration_secs, record.item.label, self.thresholds.min_log_secs
            );
            return None;
        }

        match self.persist(&record) {
            Ok(()) => {
                self.degraded.store(false, Ordering::SeqCst);
                info!(
                    "Session closed: {} for {}s ({})",
                    record.item.label, record.duration_secs, record.category
                );
            }
            Err(e) => {
                self.degraded.store(true, Ordering::SeqCst);
                warn!("Dropping session record for {}: {e}", record.item.label);
            }
        }
        Some(record)
    }

    fn persist(&self, record: &SessionRecord) -> Result<(), AppError> {
        let label = &record.item.label;
        let (app_id, site_id) = match record.item.kind {
            ItemKind::Application => (
                Some(self.store.lookup_or_create_application(label, record.category)?),
                None,
            ),
            ItemKind::Website => (
                None,
                Some(self.store.lookup_or_create_website(label, record.category)?),
            ),
        };

        if app_id.or(site_id).is_some_and(|id| id < 0) {
            return Err(AppError::Internal(format!("no id could be assigned to {label}")));
        }

        self.store.append_activity_record(
            app_id,
            site_id,
            record.start_time,
            record.end_time,
            record.duration_secs,
        )
    }

    fn check_blocked(&mut self, candidate: &ActiveItem, now: DateTime<Utc>) {
        match focus::is_item_blocked(self.store.as_ref(), candidate) {
            Ok(true) => {
                if self.blocked_cooldown.ready(now, self.thresholds.notification_cooldown_secs) {
                    self.send(BLOCKED_ALERT_TITLE, &focus::blocked_message(&candidate.label));
                    self.blocked_cooldown.mark(now);
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Focus-mode check failed for {}: {e}", candidate.label),
        }
    }

    fn check_break(&mut self, now: DateTime<Utc>) {
        let Some(threshold) = self.thresholds.break_reminder_secs else {
            return;
        };
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if self.policy.resolve(session.item.kind, session.item.category_hint) != Category::Productive {
            return;
        }

        let elapsed = session.elapsed_secs(now);
        if elapsed >= threshold && self.break_cooldown.ready(now, threshold) {
            let message = focus::break_message(&session.item.label, elapsed / 60);
            self.send(BREAK_ALERT_TITLE, &message);
            self.break_cooldown.mark(now);
        }
    }

    fn send(&self, title: &str, message: &str) {
        info!("Alert: {title} - {message}");
        if let Err(e) = self.notifier.notify(title, message) {
            warn!("Notifier failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::test_utils::setup_test_db;
    use crate::tracker::fakes::{t0, CountingNotifier, ManualClock, RecordingStore, ScriptedInspector};

    struct Harness {
        engine: SessionEngine,
        inspector: ScriptedInspector,
        store: RecordingStore,
        notifier: CountingNotifier,
        clock: ManualClock,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(&TrackerConfig::default())
        }

        fn with_config(config: &TrackerConfig) -> Self {
            let inspector = ScriptedInspector::default();
            let store = RecordingStore::default();
            let notifier = CountingNotifier::default();
            let clock = ManualClock::new(t0());
            let parts = EngineParts {
                inspector: Box::new(inspector.clone()),
                store: Box::new(store.clone()),
                notifier: Box::new(notifier.clone()),
                clock: Box::new(clock.clone()),
            };
            Self {
                engine: SessionEngine::new(parts, Classifier::default(), config),
                inspector,
                store,
                notifier,
                clock,
            }
        }

        /// Observe an application at the current time, then move the clock one poll forward.
        fn tick(&mut self, executable: &str) -> TickOutcome {
            self.tick_with_title(executable, None)
        }

        fn tick_with_title(&mut self, executable: &str, title: Option<&str>) -> TickOutcome {
            self.inspector.show(executable, title);
            let outcome = self.engine.poll_once();
            self.clock.advance(4);
            outcome
        }

        fn open_label(&self) -> Option<String> {
            self.engine.current_session().map(|s| s.item.label.clone())
        }
    }

    #[test]
    fn test_first_tick_is_absorbed() {
        let mut h = Harness::new();
        assert_eq!(
            h.tick("alpha"),
            TickOutcome::Absorbed { label: "alpha".into(), stable_count: 1 }
        );
        assert!(h.engine.current_session().is_none());
    }

    #[test]
    fn test_first_session_emits_nothing() {
        let mut h = Harness::new();
        h.tick("alpha");
        assert_eq!(h.tick("alpha"), TickOutcome::Transitioned { closed: None });
        assert_eq!(h.open_label().as_deref(), Some("alpha"));
        assert!(h.store.records().is_empty());
    }

    #[test]
    fn test_stable_switch() {
        let mut h = Harness::new();
        h.tick("alpha");
        h.tick("alpha"); // session for alpha opens at t0 + 4
        h.tick("beta");
        let outcome = h.tick("beta"); // t0 + 12

        let TickOutcome::Transitioned { closed: Some(record) } = outcome else {
            panic!("expected a transition with a record, got {outcome:?}");
        };
        assert_eq!(record.item.label, "alpha");
        assert_eq!(record.duration_secs, 8);

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "alpha");
        assert_eq!(records[0].duration_secs, 8);
        assert_eq!(records[0].end_time - records[0].start_time, chrono::Duration::seconds(8));
        assert_eq!(h.open_label().as_deref(), Some("beta"));
    }

    #[test]
    fn test_flicker_never_switches() {
        let mut h = Harness::new();
        h.tick("alpha");
        h.tick("alpha");

        h.tick("beta");
        h.tick("alpha");
        h.tick("alpha");
        assert_eq!(h.open_label().as_deref(), Some("alpha"));

        // Fresh tracker: A, B, A, A opens A and never B
        let mut h = Harness::new();
        for exe in ["alpha", "beta", "alpha", "alpha"] {
            h.tick(exe);
            assert_ne!(h.open_label().as_deref(), Some("beta"));
        }
        assert_eq!(h.open_label().as_deref(), Some("alpha"));
        assert!(h.store.records().is_empty());
    }

    #[test]
    fn test_debounce_with_longer_threshold() {
        let config = TrackerConfig { debounce_count: 3, ..TrackerConfig::default() };
        let mut h = Harness::with_config(&config);
        h.tick("alpha");
        h.tick("alpha");
        h.tick("alpha");
        assert_eq!(h.open_label().as_deref(), Some("alpha"));

        // Fewer than three readings of beta, then alpha resumes
        for _ in 0..2 {
            h.tick("beta");
        }
        for _ in 0..5 {
            h.tick("alpha");
        }
        assert_eq!(h.open_label().as_deref(), Some("alpha"));
        assert!(h.store.records().is_empty());
    }

    #[test]
    fn test_short_sessions_are_dropped() {
        let config = TrackerConfig { min_log_secs: 10, ..TrackerConfig::default() };
        let mut h = Harness::with_config(&config);
        h.tick("alpha");
        h.tick("alpha"); // opens at t0 + 4
        h.tick("beta");
        assert_eq!(h.tick("beta"), TickOutcome::Transitioned { closed: None }); // 8s < 10s
        assert!(h.store.records().is_empty());
        assert_eq!(h.open_label().as_deref(), Some("beta"));
    }

    #[test]
    fn test_records_never_overlap() {
        let mut h = Harness::new();
        for exe in ["a", "a", "b", "b", "b", "c", "c", "a", "b", "a", "a", "c", "c"] {
            h.tick(exe);
        }
        h.engine.flush();

        let records = h.store.records();
        assert!(records.len() >= 3);
        for pair in records.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
        for record in &records {
            assert!(record.duration_secs >= 2);
        }
    }

    #[test]
    fn test_inspector_failure_becomes_unknown() {
        let mut h = Harness::new();
        h.tick("alpha");
        h.tick("alpha");

        h.inspector.fail();
        h.engine.poll_once();
        h.clock.advance(4);
        h.engine.poll_once();

        assert_eq!(h.open_label().as_deref(), Some("Unknown"));
        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "alpha");
    }

    #[test]
    fn test_unknown_is_a_loggable_session() {
        let mut h = Harness::new();
        h.inspector.fail();
        h.engine.poll_once();
        h.clock.advance(4);
        h.engine.poll_once();
        h.clock.advance(20);
        h.tick("alpha");
        h.tick("alpha");

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Unknown");
        assert!(!records[0].is_website);
    }

    #[test]
    fn test_website_session_and_category() {
        let mut h = Harness::new();
        let title = Some("Dashboard - YouTube - Google Chrome");
        h.tick_with_title("chrome.exe", title);
        h.tick_with_title("chrome.exe", title);
        h.tick_with_title("chrome.exe", Some("New Tab - Google Chrome"));
        h.tick_with_title("chrome.exe", Some("New Tab - Google Chrome"));

        let records = h.store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "youtube.com");
        assert!(records[0].is_website);
        assert_eq!(records[0].category, Category::Distracting);
        assert_eq!(h.open_label().as_deref(), Some("Google Chrome"));
    }

    #[test]
    fn test_category_fallback_policy() {
        let mut h = Harness::new();
        // Unmapped app and an unlisted domain both arrive with an unknown hint
        h.tick("mytool");
        h.tick("mytool");
        h.tick_with_title("firefox", Some("example.org - Mozilla Firefox"));
        h.tick_with_title("firefox", Some("example.org - Mozilla Firefox"));
        h.tick("mytool");
        h.tick("mytool");

        let records = h.store.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, Category::Productive);
        assert_eq!(records[1].label, "example.org");
        assert_eq!(records[1].category, Category::Distracting);
    }

    #[test]
    fn test_configured_fallback_policy() {
        let config = TrackerConfig {
            category_policy: CategoryPolicy {
                application_fallback: Category::Unknown,
                website_fallback: Category::Unknown,
            },
            ..TrackerConfig::default()
        };
        let mut h = Harness::with_config(&config);
        h.tick("mytool");
        h.tick("mytool");
        h.clock.advance(10);
        let record = h.engine.flush().unwrap();
        assert_eq!(record.category, Category::Unknown);
    }

    #[test]
    fn test_persistence_failure_sets_degraded_and_advances() {
        let mut h = Harness::new();
        let degraded = h.engine.degraded_flag();
        h.tick("alpha");
        h.tick("alpha");

        h.store.fail_writes(true);
        h.tick("beta");
        let outcome = h.tick("beta");
        assert!(matches!(outcome, TickOutcome::Transitioned { closed: Some(_) }));
        assert!(degraded.load(Ordering::SeqCst));
        assert!(h.store.records().is_empty());
        assert_eq!(h.open_label().as_deref(), Some("beta"));

        h.store.fail_writes(false);
        h.tick("gamma");
        h.tick("gamma");
        assert!(!degraded.load(Ordering::SeqCst));
        assert_eq!(h.store.records().len(), 1);
        assert_eq!(h.store.records()[0].label, "beta");
    }

    #[test]
    fn test_blocked_alert_respects_cooldown() {
        let mut h = Harness::new();
        h.store.set_focus(true);
        h.store.block_app("Steam");

        h.tick("steam.exe");
        h.tick("steam.exe"); // opens Steam, first alert
        assert_eq!(h.notifier.sent().len(), 1);

        // Opening a session resets the cooldown after the blocked check has
        // already fired, so the next debounced tick alerts once more
        h.tick("steam.exe"); // absorbed, pending restarted after the transition
        h.tick("steam.exe"); // second alert
        assert_eq!(h.notifier.sent().len(), 2);

        // Two further detections within 30s fire nothing more
        h.tick("steam.exe");
        h.tick("steam.exe");
        assert_eq!(h.notifier.sent().len(), 2);

        let (title, message) = &h.notifier.sent()[0];
        assert_eq!(title, "Focus Mode Active");
        assert_eq!(message, "Avoid Steam - Stay focused and try to reduce distractions!");
    }

    #[test]
    fn test_negative_id_counts_as_persistence_failure() {
        let mut h = Harness::new();
        let degraded = h.engine.degraded_flag();
        h.tick("alpha");
        h.tick("alpha");

        h.store.negative_ids(true);
        h.tick("beta");
        let outcome = h.tick("beta");
        assert!(matches!(outcome, TickOutcome::Transitioned { closed: Some(_) }));
        assert!(degraded.load(Ordering::SeqCst));
        assert!(h.store.records().is_empty());
        assert_eq!(h.open_label().as_deref(), Some("beta"));
    }

    #[test]
    fn test_blocked_executable_alerts_through_sqlite_store() {
        let (db, _dir) = setup_test_db();
        let store = SqliteStore::new(Arc::new(std::sync::Mutex::new(db)));
        store.set_focus_mode_enabled(true).unwrap();
        let stored = store.block_application("steam.exe", &Classifier::default()).unwrap();

        let inspector = ScriptedInspector::default();
        let notifier = CountingNotifier::default();
        let clock = ManualClock::new(t0());
        let parts = EngineParts {
            inspector: Box::new(inspector.clone()),
            store: Box::new(store.clone()),
            notifier: Box::new(notifier.clone()),
            clock: Box::new(clock.clone()),
        };
        let mut engine = SessionEngine::new(parts, Classifier::default(), &TrackerConfig::default());

        inspector.show("steam.exe", None);
        for _ in 0..2 {
            engine.poll_once();
            clock.advance(4);
        }

        let label = engine.current_session().map(|s| s.item.label.clone());
        assert_eq!(label.as_deref(), Some(stored.as_str()));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "Avoid Steam - Stay focused and try to reduce distractions!");
    }

    #[test]
    fn test_blocked_alert_fires_again_after_cooldown() {
        let mut h = Harness::new();
        h.store.set_focus(true);
        h.store.block_site("reddit.com");
        let title = Some("reddit - Google Chrome");

        for _ in 0..4 {
            h.tick_with_title("chrome.exe", title);
        }
        assert_eq!(h.notifier.sent().len(), 2);

        h.clock.advance(31);
        h.tick_with_title("chrome.exe", title);
        assert_eq!(h.notifier.sent().len(), 3);
    }

    #[test]
    fn test_no_alert_without_focus_mode() {
        let mut h = Harness::new();
        h.store.block_app("Steam");
        for _ in 0..4 {
            h.tick("steam.exe");
        }
        assert!(h.notifier.sent().is_empty());
    }

    #[test]
    fn test_notifier_failure_is_swallowed() {
        let mut h = Harness::new();
        h.store.set_focus(true);
        h.store.block_app("Steam");
        h.notifier.set_failing(true);

        h.tick("steam.exe");
        assert!(matches!(h.tick("steam.exe"), TickOutcome::Transitioned { .. }));
        assert_eq!(h.open_label().as_deref(), Some("Steam"));
    }

    #[test]
    fn test_break_reminder() {
        let config = TrackerConfig { break_reminder_secs: Some(60), ..TrackerConfig::default() };
        let mut h = Harness::with_config(&config);
        h.tick("code.exe");
        h.tick("code.exe"); // opens at t0 + 4
        h.tick("code.exe");
        assert!(h.notifier.sent().is_empty());

        h.clock.advance(60);
        h.tick("code.exe");
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Take a break");
        assert_eq!(sent[0].1, "You've been on Visual Studio Code for 1 minutes.");

        // Cooldown equals the threshold
        h.tick("code.exe");
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[test]
    fn test_no_break_reminder_for_distracting() {
        let config = TrackerConfig { break_reminder_secs: Some(60), ..TrackerConfig::default() };
        let mut h = Harness::with_config(&config);
        h.tick("steam.exe");
        h.tick("steam.exe");
        h.clock.advance(120);
        h.tick("steam.exe");
        h.tick("steam.exe");
        assert!(h.notifier.sent().is_empty());
    }

    #[test]
    fn test_flush_closes_and_goes_inert() {
        let mut h = Harness::new();
        h.tick("alpha");
        h.tick("alpha");
        h.clock.advance(6);

        let record = h.engine.flush().unwrap();
        assert_eq!(record.item.label, "alpha");
        assert_eq!(record.duration_secs, 10);
        assert_eq!(h.store.records().len(), 1);

        assert!(h.engine.is_inert());
        assert_eq!(h.engine.flush(), None);
        assert_eq!(h.tick("beta"), TickOutcome::Inert);
        assert_eq!(h.store.records().len(), 1);
    }

    #[test]
    fn test_flush_applies_minimum_duration() {
        let mut h = Harness::new();
        h.tick("alpha");
        h.inspector.show("alpha", None);
        h.engine.poll_once();
        h.clock.advance(1);
        assert_eq!(h.engine.flush(), None);
        assert!(h.store.records().is_empty());
    }

    #[test]
    fn test_flush_without_session() {
        let mut h = Harness::new();
        assert_eq!(h.engine.flush(), None);
        assert!(h.engine.is_inert());
    }
}
