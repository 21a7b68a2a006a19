//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-anchored state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` once a
//! second while the timer runs.
//!
//! ## State Transitions
//!
//! ```text
//! Paused --start--> Running --pause--> Paused
//!                      |
//!                   (expiry)
//!                      v
//!           Paused, next mode  --(auto start)--> Running
//! ```
//!
//! Focus -> ShortBreak | LongBreak -> Focus. The long break lands on every
//! `pomodoros_until_long_break`-th completed focus interval.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings.timer(), gateways, store, clock);
//! engine.restore();
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::TimerCompleted { .. }) on expiry
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::default_target;
use super::{Clock, Mode, RestoreOutcome, TimerSnapshot};
use crate::events::Event;
use crate::gateway::{
    completion_message, AudioGateway, NotificationAction, NotificationGateway, NotificationHandle,
};
use crate::settings::{clamp_volume, TimerSettings};
use crate::storage::{keys, load_json, save_json, KeyValueStore};

/// Pause between an interval ending and the next one auto-starting.
pub const AUTO_START_DELAY_MS: i64 = 1_000;

/// Payload handed to the completion callback for each finished pomodoro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroCompleted {
    /// Length of the focus interval that ran, in minutes.
    pub duration_minutes: u32,
    /// Pomodoro count including this one.
    pub completed_count: u32,
    pub completed_at_ms: i64,
    /// True when the interval ran out while the process was not running.
    pub while_suspended: bool,
}

/// Invoked synchronously when a Focus interval completes.
pub type CompletionCallback = Box<dyn FnMut(&PomodoroCompleted) + Send>;

/// Platform services the engine drives.
pub struct Gateways {
    pub audio: Box<dyn AudioGateway>,
    pub notifications: Box<dyn NotificationGateway>,
}

impl Gateways {
    pub fn new(
        audio: impl AudioGateway + 'static,
        notifications: impl NotificationGateway + 'static,
    ) -> Self {
        Self {
            audio: Box::new(audio),
            notifications: Box::new(notifications),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    /// Ran out in the foreground.
    Live,
    /// Ran out at `at_ms` while the process was gone.
    Suspended { at_ms: i64 },
    /// User skipped ahead.
    Skipped,
}

/// Core timer engine.
pub struct TimerEngine {
    settings: TimerSettings,
    mode: Mode,
    /// Full length of the current interval; fixed until the interval changes.
    interval_secs: u32,
    remaining_secs: u32,
    is_playing: bool,
    completed_count: u32,
    started_at_ms: Option<i64>,
    paused_at_ms: Option<i64>,
    target_pomodoros: u32,
    ambient_wanted: bool,
    ambient_playing: bool,
    scheduled: Option<NotificationHandle>,
    auto_start_due_ms: Option<i64>,
    on_pomodoro_complete: Option<CompletionCallback>,
    audio: Box<dyn AudioGateway>,
    notifications: Box<dyn NotificationGateway>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("mode", &self.mode)
            .field("remaining_secs", &self.remaining_secs)
            .field("is_playing", &self.is_playing)
            .field("completed_count", &self.completed_count)
            .field("ambient_playing", &self.ambient_playing)
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create a paused engine at the start of a Focus interval.
    pub fn new(
        settings: TimerSettings,
        gateways: Gateways,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let interval_secs = settings.duration_secs(Mode::Focus);
        Self {
            settings,
            mode: Mode::Focus,
            interval_secs,
            remaining_secs: interval_secs,
            is_playing: false,
            completed_count: 0,
            started_at_ms: None,
            paused_at_ms: None,
            target_pomodoros: default_target(),
            ambient_wanted: false,
            ambient_playing: false,
            scheduled: None,
            auto_start_due_ms: None,
            on_pomodoro_complete: None,
            audio: gateways.audio,
            notifications: gateways.notifications,
            store,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.interval_secs
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    pub fn target_pomodoros(&self) -> u32 {
        self.target_pomodoros
    }

    pub fn ambient_wanted(&self) -> bool {
        self.ambient_wanted
    }

    pub fn is_ambient_playing(&self) -> bool {
        self.ambient_playing
    }

    pub fn auto_start_pending(&self) -> bool {
        self.auto_start_due_ms.is_some()
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// 0.0 .. 1.0 progress within the current interval.
    pub fn progress(&self) -> f64 {
        if self.interval_secs == 0 {
            return 0.0;
        }
        1.0 - (f64::from(self.remaining_secs) / f64::from(self.interval_secs))
    }

    /// `MM:SS`
    pub fn remaining_label(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            remaining_seconds: self.remaining_secs,
            is_playing: self.is_playing,
            completed_count: self.completed_count,
            started_at_epoch_ms: self.started_at_ms,
            paused_at_epoch_ms: self.paused_at_ms,
            target_pomodoros: self.target_pomodoros,
            ambient_wanted: self.ambient_wanted,
        }
    }

    /// Build a full state snapshot event.
    pub fn status(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            is_playing: self.is_playing,
            remaining_secs: self.remaining_secs,
            total_secs: self.interval_secs,
            remaining_label: self.remaining_label(),
            completed_count: self.completed_count,
            target_pomodoros: self.target_pomodoros,
            ambient_playing: self.ambient_playing,
            at: self.at(self.clock.now_ms()),
        }
    }

    // ── Completion delegate ──────────────────────────────────────────

    /// Replace the completion delegate. Only Focus completions invoke it.
    pub fn set_on_pomodoro_complete(&mut self, callback: CompletionCallback) {
        self.on_pomodoro_complete = Some(callback);
    }

    pub fn clear_on_pomodoro_complete(&mut self) {
        self.on_pomodoro_complete = None;
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.is_playing {
            return None;
        }
        let now = self.clock.now_ms();
        self.auto_start_due_ms = None;
        if self.remaining_secs == 0 || self.remaining_secs > self.interval_secs {
            self.remaining_secs = self.interval_secs;
        }

        let elapsed_ms = i64::from(self.interval_secs - self.remaining_secs) * 1000;
        self.started_at_ms = Some(now - elapsed_ms);
        self.paused_at_ms = None;
        self.is_playing = true;

        self.schedule_completion();
        if self.ambient_wanted {
            self.start_ambient();
        }

        tracing::debug!(mode = %self.mode, remaining_secs = self.remaining_secs, "timer started");
        self.persist();
        Some(Event::TimerStarted {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: self.at(now),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.is_playing {
            return None;
        }
        let now = self.clock.now_ms();
        self.remaining_secs = self.remaining_secs.min(self.wall_remaining(now));
        if self.remaining_secs == 0 {
            return Some(self.complete());
        }

        self.is_playing = false;
        self.started_at_ms = None;
        self.paused_at_ms = Some(now);
        self.auto_start_due_ms = None;
        self.cancel_scheduled();
        self.stop_ambient_playback();

        tracing::debug!(mode = %self.mode, remaining_secs = self.remaining_secs, "timer paused");
        self.persist();
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: self.at(now),
        })
    }

    /// Call once per second. Returns `Some(Event::TimerCompleted)` when the
    /// interval finishes, or `Some(Event::TimerStarted)` when a pending
    /// auto-start fires.
    ///
    /// Each tick takes at least one second off, and snaps to the wall clock
    /// when ticks were missed.
    pub fn tick(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        if !self.is_playing {
            return match self.auto_start_due_ms {
                Some(due) if now >= due => self.start(),
                _ => None,
            };
        }

        self.remaining_secs = self
            .remaining_secs
            .saturating_sub(1)
            .min(self.wall_remaining(now));
        if self.remaining_secs == 0 {
            return Some(self.complete());
        }
        self.persist();
        None
    }

    /// Finish the current interval now: alarm, notification, delegate,
    /// then move to the next mode.
    pub fn complete(&mut self) -> Event {
        self.finish(Finish::Live)
    }

    /// Jump to the next mode without alarm, notification or delegate.
    /// A skipped Focus interval is not counted and always leads to a short
    /// break.
    pub fn skip(&mut self) -> Event {
        self.finish(Finish::Skipped)
    }

    /// Back to the full length of the current mode, paused.
    pub fn reset_timer(&mut self) -> Event {
        let now = self.clock.now_ms();
        self.halt();
        self.paused_at_ms = None;
        self.remaining_secs = self.interval_secs;
        self.ambient_wanted = false;

        tracing::debug!(mode = %self.mode, "timer reset");
        self.persist();
        Event::TimerReset {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            at: self.at(now),
        }
    }

    /// Forget the whole cycle: count 0, Focus, paused.
    pub fn reset_session(&mut self) -> Event {
        let now = self.clock.now_ms();
        self.halt();
        self.scheduled = None;
        if let Err(e) = self.notifications.cancel_all() {
            tracing::warn!(error = %e, "failed to cancel notifications");
        }
        self.paused_at_ms = None;
        self.completed_count = 0;
        self.ambient_wanted = false;
        self.begin_interval(Mode::Focus);

        tracing::debug!("session reset");
        self.persist();
        Event::SessionReset { at: self.at(now) }
    }

    /// Switch interval type by hand. Paused, full length, count untouched.
    pub fn select_mode(&mut self, mode: Mode) -> Event {
        let now = self.clock.now_ms();
        self.halt();
        self.paused_at_ms = Some(now);
        self.begin_interval(mode);

        self.persist();
        Event::ModeSelected {
            mode,
            remaining_secs: self.remaining_secs,
            at: self.at(now),
        }
    }

    /// UI-facing goal; does not touch the long-break cadence.
    pub fn set_target_pomodoros(&mut self, target: u32) {
        self.target_pomodoros = target.max(1);
        self.persist();
    }

    /// Route a tap on a delivered notification.
    pub fn handle_notification_action(&mut self, action: NotificationAction) -> Option<Event> {
        match action {
            NotificationAction::StartBreak => {
                if !self.mode.is_break() {
                    self.select_mode(Mode::ShortBreak);
                }
                self.start()
            }
            NotificationAction::StartFocus => {
                if self.mode != Mode::Focus {
                    self.select_mode(Mode::Focus);
                }
                self.start()
            }
            NotificationAction::Dismiss => None,
        }
    }

    /// Ambient loop on for this session. Plays immediately if running.
    pub fn enable_ambient(&mut self) -> Event {
        self.ambient_wanted = true;
        if self.is_playing {
            self.start_ambient();
        }
        self.persist();
        self.ambient_event()
    }

    pub fn disable_ambient(&mut self) -> Event {
        self.ambient_wanted = false;
        self.stop_ambient_playback();
        self.persist();
        self.ambient_event()
    }

    pub fn set_ambient_volume(&mut self, volume: f32) {
        self.settings.ambient_volume = clamp_volume(volume);
        if self.ambient_playing {
            if let Err(e) = self.audio.set_volume(self.settings.ambient_volume) {
                tracing::warn!(error = %e, "failed to change ambient volume");
            }
        }
    }

    /// Take new settings. A paused interval whose length changed restarts at
    /// the new length; a running one keeps its length until it ends.
    pub fn apply_settings(&mut self, settings: TimerSettings) {
        let volume_changed = settings.ambient_volume != self.settings.ambient_volume;
        let sound_changed = settings.ambient_sound != self.settings.ambient_sound;
        self.settings = settings;

        let new_total = self.settings.duration_secs(self.mode);
        if !self.is_playing && new_total != self.interval_secs {
            self.interval_secs = new_total;
            self.remaining_secs = new_total;
        }
        if self.ambient_playing {
            if sound_changed {
                self.start_ambient();
            } else if volume_changed {
                if let Err(e) = self.audio.set_volume(self.settings.ambient_volume) {
                    tracing::warn!(error = %e, "failed to change ambient volume");
                }
            }
        }
        self.persist();
    }

    // ── Cold start ───────────────────────────────────────────────────

    /// Load the stored snapshot and apply the resume policy.
    ///
    /// Register the completion delegate first: a Focus interval that ran out
    /// while suspended is recorded through it.
    pub fn restore(&mut self) -> RestoreOutcome {
        match load_json::<TimerSnapshot>(self.store.as_ref(), keys::TIMER_SNAPSHOT) {
            Some(snapshot) => self.resume_from(snapshot),
            None => RestoreOutcome::Fresh,
        }
    }

    /// Resume policy. Never resumes playback by itself:
    /// - paused snapshot: taken as is
    /// - running, time left: remaining corrected from the anchor, paused
    /// - running, expired: completed silently (counted, delegate invoked,
    ///   mode advanced; no alarm, notification or auto-start)
    pub fn resume_from(&mut self, snapshot: TimerSnapshot) -> RestoreOutcome {
        let now = self.clock.now_ms();
        self.mode = snapshot.mode;
        self.interval_secs = self.settings.duration_secs(snapshot.mode);
        self.remaining_secs = snapshot.remaining_seconds.min(self.interval_secs);
        self.completed_count = snapshot.completed_count;
        self.target_pomodoros = snapshot.target_pomodoros.max(1);
        self.ambient_wanted = snapshot.ambient_wanted;
        self.ambient_playing = false;
        self.is_playing = false;
        self.scheduled = None;
        self.auto_start_due_ms = None;
        self.started_at_ms = None;
        self.paused_at_ms = snapshot.paused_at_epoch_ms;

        let outcome = match (snapshot.is_playing, snapshot.started_at_epoch_ms) {
            (true, Some(anchor)) => {
                // The previous process may have left a completion pending.
                if let Err(e) = self.notifications.cancel_all() {
                    tracing::warn!(error = %e, "failed to cancel stale notifications");
                }
                let elapsed_secs = secs_between(anchor, now);
                let left = self.interval_secs.saturating_sub(elapsed_secs);
                if left == 0 {
                    let expired_at = anchor + i64::from(self.interval_secs) * 1000;
                    self.remaining_secs = 0;
                    let event = self.finish(Finish::Suspended { at_ms: expired_at });
                    tracing::info!(mode = %snapshot.mode, "interval expired while suspended");
                    return RestoreOutcome::ExpiredWhileSuspended { event };
                }
                self.remaining_secs = left;
                self.paused_at_ms = Some(now);
                RestoreOutcome::Corrected { elapsed_secs }
            }
            _ => {
                if self.remaining_secs == 0 {
                    self.remaining_secs = self.interval_secs;
                }
                RestoreOutcome::Restored
            }
        };

        self.persist();
        outcome
    }

    /// Like [`restore`](Self::restore), except that a snapshot still counting
    /// down is mirrored as running and nothing is written. For a process
    /// that only looks at, or lightly edits, a countdown owned by another.
    pub fn observe(&mut self) -> RestoreOutcome {
        let Some(snapshot) = load_json::<TimerSnapshot>(self.store.as_ref(), keys::TIMER_SNAPSHOT)
        else {
            return RestoreOutcome::Fresh;
        };
        let now = self.clock.now_ms();

        if let (true, Some(anchor)) = (snapshot.is_playing, snapshot.started_at_epoch_ms) {
            let interval_secs = self.settings.duration_secs(snapshot.mode);
            let elapsed_secs = secs_between(anchor, now);
            if elapsed_secs < interval_secs {
                self.mode = snapshot.mode;
                self.interval_secs = interval_secs;
                self.remaining_secs = interval_secs - elapsed_secs;
                self.completed_count = snapshot.completed_count;
                self.target_pomodoros = snapshot.target_pomodoros.max(1);
                self.ambient_wanted = snapshot.ambient_wanted;
                self.ambient_playing = false;
                self.is_playing = true;
                self.started_at_ms = Some(anchor);
                self.paused_at_ms = None;
                self.scheduled = None;
                self.auto_start_due_ms = None;
                return RestoreOutcome::Live { elapsed_secs };
            }
        }
        self.resume_from(snapshot)
    }

    /// Pick up changes another process made to the stored timer while this
    /// one owns the countdown. Call before each `tick()`.
    ///
    /// A stored target or ambient wish on the same run is adopted. A stored
    /// state that stopped or restarted the run ends it here: side effects
    /// are cancelled and the stored state is taken without writing back.
    /// Returns an event when local state changed.
    pub fn follow_store(&mut self) -> Option<Event> {
        if !self.is_playing && self.auto_start_due_ms.is_none() {
            return None;
        }
        let stored = load_json::<TimerSnapshot>(self.store.as_ref(), keys::TIMER_SNAPSHOT)?;
        if stored == self.snapshot() {
            return None;
        }

        if self.is_playing && stored.is_playing && stored.started_at_epoch_ms == self.started_at_ms {
            self.target_pomodoros = stored.target_pomodoros.max(1);
            return match (stored.ambient_wanted, self.ambient_wanted) {
                (true, false) => Some(self.enable_ambient()),
                (false, true) => Some(self.disable_ambient()),
                _ => None,
            };
        }

        self.halt();
        self.mode = stored.mode;
        self.interval_secs = self.settings.duration_secs(stored.mode);
        self.remaining_secs = stored.remaining_seconds.min(self.interval_secs);
        self.completed_count = stored.completed_count;
        self.target_pomodoros = stored.target_pomodoros.max(1);
        self.ambient_wanted = stored.ambient_wanted;
        self.paused_at_ms = stored.paused_at_epoch_ms;

        tracing::info!(mode = %self.mode, "timer changed by another process");
        Some(self.status())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, kind: Finish) -> Event {
        let now = self.clock.now_ms();
        let finished = self.mode;
        self.halt();
        self.paused_at_ms = Some(now);

        if kind == Finish::Live {
            if let Err(e) = self.audio.play_alarm(&self.settings.alarm_sound) {
                tracing::warn!(error = %e, "failed to play alarm");
            }
            let (title, body) = completion_message(finished);
            if let Err(e) = self.notifications.send_immediate(title, body) {
                tracing::warn!(error = %e, "failed to send completion notification");
            }
        }

        let next = if kind == Finish::Skipped {
            match finished {
                Mode::Focus => Mode::ShortBreak,
                _ => Mode::Focus,
            }
        } else {
            if finished == Mode::Focus {
                let completion = PomodoroCompleted {
                    // The interval that ran, not a length changed mid-run.
                    duration_minutes: self.interval_secs / 60,
                    completed_count: self.completed_count + 1,
                    completed_at_ms: match kind {
                        Finish::Suspended { at_ms } => at_ms,
                        _ => now,
                    },
                    while_suspended: matches!(kind, Finish::Suspended { .. }),
                };
                if let Some(callback) = self.on_pomodoro_complete.as_mut() {
                    callback(&completion);
                }
                self.completed_count += 1;
            }
            finished.next(self.completed_count, self.settings.pomodoros_until_long_break)
        };

        self.begin_interval(next);
        let auto_start = kind == Finish::Live && self.settings.auto_start_next;
        if auto_start {
            self.auto_start_due_ms = Some(now + AUTO_START_DELAY_MS);
        }

        tracing::info!(
            finished = %finished,
            next = %next,
            completed_count = self.completed_count,
            "interval finished"
        );
        self.persist();

        if kind == Finish::Skipped {
            return Event::TimerSkipped {
                from: finished,
                to: next,
                at: self.at(now),
            };
        }
        Event::TimerCompleted {
            mode: finished,
            next_mode: next,
            completed_count: self.completed_count,
            while_suspended: matches!(kind, Finish::Suspended { .. }),
            auto_start,
            at: self.at(now),
        }
    }

    /// Stop running: no anchor, no pending notification, no ambient loop,
    /// no armed auto-start. The caller sets `paused_at_ms`.
    fn halt(&mut self) {
        self.is_playing = false;
        self.started_at_ms = None;
        self.auto_start_due_ms = None;
        self.cancel_scheduled();
        self.stop_ambient_playback();
    }

    fn begin_interval(&mut self, mode: Mode) {
        self.mode = mode;
        self.interval_secs = self.settings.duration_secs(mode);
        self.remaining_secs = self.interval_secs;
    }

    fn wall_remaining(&self, now: i64) -> u32 {
        match self.started_at_ms {
            Some(anchor) => self.interval_secs.saturating_sub(secs_between(anchor, now)),
            None => self.remaining_secs,
        }
    }

    fn schedule_completion(&mut self) {
        self.cancel_scheduled();
        match self
            .notifications
            .schedule_completion(self.mode, self.remaining_secs)
        {
            Ok(handle) => self.scheduled = Some(handle),
            Err(e) => tracing::warn!(error = %e, "failed to schedule completion notification"),
        }
    }

    fn cancel_scheduled(&mut self) {
        if let Some(handle) = self.scheduled.take() {
            if let Err(e) = self.notifications.cancel(&handle) {
                tracing::warn!(error = %e, "failed to cancel notification");
            }
        }
    }

    fn start_ambient(&mut self) {
        if let Err(e) = self.audio.stop_ambient() {
            tracing::warn!(error = %e, "failed to stop ambient before restart");
        }
        let sound = self.settings.ambient_sound.clone();
        match self.audio.play_ambient(&sound, self.settings.ambient_volume) {
            Ok(()) => self.ambient_playing = true,
            Err(e) => {
                tracing::warn!(sound = %sound, error = %e, "ambient playback failed");
                self.ambient_playing = false;
            }
        }
    }

    fn stop_ambient_playback(&mut self) {
        if let Err(e) = self.audio.stop_ambient() {
            tracing::warn!(error = %e, "failed to stop ambient");
        }
        self.ambient_playing = false;
    }

    fn ambient_event(&self) -> Event {
        Event::AmbientChanged {
            wanted: self.ambient_wanted,
            playing: self.ambient_playing,
            at: self.at(self.clock.now_ms()),
        }
    }

    fn persist(&self) {
        save_json(self.store.as_ref(), keys::TIMER_SNAPSHOT, &self.snapshot());
    }

    fn at(&self, epoch_ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(epoch_ms).unwrap_or_default()
    }
}

/// Whole seconds from `from_ms` to `to_ms`, 0 if negative.
fn secs_between(from_ms: i64, to_ms: i64) -> u32 {
    u32::try_from((to_ms - from_ms).max(0) / 1000).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::recording::{CallLog, GatewayCall, RecordingAudio, RecordingNotifier};
    use crate::storage::MemoryStore;
    use crate::timer::ManualClock;
    use std::sync::Mutex;

    const T0: i64 = 1_700_000_000_000;

    struct Harness {
        engine: TimerEngine,
        log: CallLog,
        clock: Arc<ManualClock>,
        store: Arc<MemoryStore>,
    }

    fn harness_with(settings: TimerSettings) -> Harness {
        let log = CallLog::new();
        let clock = Arc::new(ManualClock::new(T0));
        let store = Arc::new(MemoryStore::new());
        let engine = TimerEngine::new(
            settings,
            Gateways::new(RecordingAudio::new(log.clone()), RecordingNotifier::new(log.clone())),
            store.clone(),
            clock.clone(),
        );
        Harness {
            engine,
            log,
            clock,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(TimerSettings::default())
    }

    fn reopen(h: &Harness) -> TimerEngine {
        TimerEngine::new(
            h.engine.settings().clone(),
            Gateways::new(
                RecordingAudio::new(h.log.clone()),
                RecordingNotifier::new(h.log.clone()),
            ),
            h.store.clone(),
            h.clock.clone(),
        )
    }

    #[test]
    fn initial_state_is_paused_focus() {
        let h = harness();
        assert_eq!(h.engine.mode(), Mode::Focus);
        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.remaining_secs(), 25 * 60);
        assert_eq!(h.engine.completed_count(), 0);
        assert_eq!(h.engine.remaining_label(), "25:00");
    }

    #[test]
    fn start_pause_resume() {
        let mut h = harness();
        assert!(h.engine.start().is_some());
        assert!(h.engine.is_playing());
        assert!(h.engine.start().is_none());

        h.clock.advance_secs(10);
        assert!(h.engine.pause().is_some());
        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.remaining_secs(), 25 * 60 - 10);

        assert!(h.engine.start().is_some());
        assert_eq!(h.engine.remaining_secs(), 25 * 60 - 10);
    }

    #[test]
    fn play_and_pause_markers_are_exclusive() {
        let mut h = harness();
        h.engine.start();
        let snap = h.engine.snapshot();
        assert!(snap.started_at_epoch_ms.is_some());
        assert!(snap.paused_at_epoch_ms.is_none());

        h.engine.pause();
        let snap = h.engine.snapshot();
        assert!(snap.started_at_epoch_ms.is_none());
        assert!(snap.paused_at_epoch_ms.is_some());
    }

    #[test]
    fn start_anchor_accounts_for_elapsed_time() {
        let mut h = harness();
        h.engine.start();
        h.clock.advance_secs(60);
        h.engine.pause();
        h.clock.advance_secs(600);
        h.engine.start();
        // Anchor is now minus the minute already spent.
        assert_eq!(
            h.engine.snapshot().started_at_epoch_ms,
            Some(h.clock.now_ms() - 60_000)
        );
    }

    #[test]
    fn pause_twice_equals_pause_once() {
        let mut h = harness();
        h.engine.start();
        h.clock.advance_secs(5);
        h.engine.pause();
        let once = h.engine.snapshot();
        let calls = h.log.calls().len();

        h.clock.advance_secs(5);
        assert!(h.engine.pause().is_none());
        assert_eq!(h.engine.snapshot(), once);
        assert_eq!(h.log.calls().len(), calls);
    }

    #[test]
    fn start_schedules_and_pause_cancels_notification() {
        let mut h = harness();
        h.engine.start();
        assert_eq!(h.log.pending_notifications().len(), 1);
        assert!(h.log.calls().contains(&GatewayCall::Schedule {
            mode: Mode::Focus,
            delay_secs: 25 * 60,
            handle: NotificationHandle("n1".into()),
        }));
        h.engine.pause();
        assert!(h.log.pending_notifications().is_empty());
    }

    #[test]
    fn tick_decrements_one_second() {
        let mut h = harness();
        h.engine.start();
        h.engine.tick();
        h.engine.tick();
        assert_eq!(h.engine.remaining_secs(), 25 * 60 - 2);
    }

    #[test]
    fn tick_catches_up_with_wall_clock() {
        let mut h = harness();
        h.engine.start();
        h.clock.advance_secs(300);
        h.engine.tick();
        assert_eq!(h.engine.remaining_secs(), 25 * 60 - 300);
    }

    #[test]
    fn tick_while_paused_is_noop() {
        let mut h = harness();
        assert!(h.engine.tick().is_none());
        assert_eq!(h.engine.remaining_secs(), 25 * 60);
    }

    #[test]
    fn focus_completion_moves_to_short_break() {
        let mut h = harness();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        h.engine
            .set_on_pomodoro_complete(Box::new(move |c| sink.lock().unwrap().push(c.clone())));

        let event = h.engine.complete();
        assert!(matches!(
            event,
            Event::TimerCompleted {
                mode: Mode::Focus,
                next_mode: Mode::ShortBreak,
                completed_count: 1,
                while_suspended: false,
                auto_start: false,
                ..
            }
        ));
        assert_eq!(h.engine.mode(), Mode::ShortBreak);
        assert_eq!(h.engine.remaining_secs(), 5 * 60);
        assert!(!h.engine.is_playing());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].duration_minutes, 25);
        assert_eq!(seen[0].completed_count, 1);
    }

    #[test]
    fn completion_plays_alarm_and_notifies() {
        let mut h = harness();
        h.engine.enable_ambient();
        h.engine.start();
        assert!(h.log.ambient_playing());

        h.engine.complete();
        assert!(!h.log.ambient_playing());
        assert!(!h.engine.is_ambient_playing());
        assert_eq!(h.log.count(|c| matches!(c, GatewayCall::PlayAlarm(s) if s == "bell")), 1);
        assert_eq!(
            h.log.count(|c| matches!(c, GatewayCall::SendImmediate { title, .. } if title == "Focus complete")),
            1
        );
        assert!(h.log.pending_notifications().is_empty());
    }

    #[test]
    fn break_completion_does_not_invoke_delegate() {
        let mut h = harness();
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();
        h.engine
            .set_on_pomodoro_complete(Box::new(move |_| *counter.lock().unwrap() += 1));

        h.engine.complete();
        h.engine.complete();
        assert_eq!(h.engine.mode(), Mode::Focus);
        assert_eq!(h.engine.completed_count(), 1);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn fourth_pomodoro_earns_long_break() {
        let mut h = harness();
        for n in 1..=4 {
            h.engine.complete();
            let expected = if n == 4 { Mode::LongBreak } else { Mode::ShortBreak };
            assert_eq!(h.engine.mode(), expected, "after pomodoro {n}");
            h.engine.complete();
        }
        assert_eq!(h.engine.completed_count(), 4);
    }

    #[test]
    fn auto_start_fires_after_delay() {
        let mut h = harness_with(TimerSettings {
            auto_start_next: true,
            ..TimerSettings::default()
        });
        h.engine.start();
        let event = h.engine.complete();
        assert!(matches!(event, Event::TimerCompleted { auto_start: true, .. }));
        assert!(h.engine.auto_start_pending());

        assert!(h.engine.tick().is_none());
        assert!(!h.engine.is_playing());

        h.clock.advance_ms(AUTO_START_DELAY_MS);
        assert!(matches!(
            h.engine.tick(),
            Some(Event::TimerStarted {
                mode: Mode::ShortBreak,
                ..
            })
        ));
        assert!(h.engine.is_playing());
    }

    #[test]
    fn reset_disarms_auto_start() {
        let mut h = harness_with(TimerSettings {
            auto_start_next: true,
            ..TimerSettings::default()
        });
        h.engine.complete();
        h.engine.reset_timer();
        h.clock.advance_secs(5);
        assert!(h.engine.tick().is_none());
        assert!(!h.engine.is_playing());
    }

    #[test]
    fn reset_timer_restores_full_length_and_clears_ambient() {
        let mut h = harness();
        h.engine.enable_ambient();
        h.engine.start();
        h.clock.advance_secs(90);
        h.engine.tick();
        h.engine.reset_timer();

        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.remaining_secs(), 25 * 60);
        assert!(!h.engine.ambient_wanted());
        assert!(!h.log.ambient_playing());
        assert!(h.log.pending_notifications().is_empty());
    }

    #[test]
    fn reset_session_zeroes_the_cycle() {
        let mut h = harness();
        h.engine.complete();
        h.engine.complete();
        h.engine.complete();
        h.engine.start();
        h.engine.reset_session();

        assert_eq!(h.engine.completed_count(), 0);
        assert_eq!(h.engine.mode(), Mode::Focus);
        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.remaining_secs(), 25 * 60);
        assert!(h.log.calls().contains(&GatewayCall::CancelAll));
    }

    #[test]
    fn ambient_resumes_on_start_when_wanted() {
        let mut h = harness();
        h.engine.enable_ambient();
        assert!(!h.engine.is_ambient_playing());

        h.engine.start();
        assert!(h.engine.is_ambient_playing());
        h.engine.pause();
        assert!(!h.engine.is_ambient_playing());
        assert!(h.engine.ambient_wanted());
        h.engine.start();
        assert!(h.engine.is_ambient_playing());
    }

    #[test]
    fn failed_ambient_stays_not_playing() {
        let log = CallLog::new();
        let mut engine = TimerEngine::new(
            TimerSettings::default(),
            Gateways::new(
                RecordingAudio::failing_ambient(log.clone()),
                RecordingNotifier::new(log.clone()),
            ),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(T0)),
        );
        engine.start();
        engine.enable_ambient();
        assert!(engine.ambient_wanted());
        assert!(!engine.is_ambient_playing());
    }

    #[test]
    fn skip_focus_does_not_count() {
        let mut h = harness();
        let event = h.engine.skip();
        assert!(matches!(
            event,
            Event::TimerSkipped {
                from: Mode::Focus,
                to: Mode::ShortBreak,
                ..
            }
        ));
        assert_eq!(h.engine.completed_count(), 0);
        assert_eq!(h.log.count(|c| matches!(c, GatewayCall::PlayAlarm(_))), 0);
        h.engine.skip();
        assert_eq!(h.engine.mode(), Mode::Focus);
    }

    #[test]
    fn select_mode_keeps_count() {
        let mut h = harness();
        h.engine.complete();
        h.engine.select_mode(Mode::LongBreak);
        assert_eq!(h.engine.mode(), Mode::LongBreak);
        assert_eq!(h.engine.remaining_secs(), 15 * 60);
        assert_eq!(h.engine.completed_count(), 1);
    }

    #[test]
    fn notification_actions_start_the_right_mode() {
        let mut h = harness();
        h.engine.complete();
        let ev = h.engine.handle_notification_action(NotificationAction::StartBreak);
        assert!(matches!(ev, Some(Event::TimerStarted { mode: Mode::ShortBreak, .. })));

        let ev = h.engine.handle_notification_action(NotificationAction::StartFocus);
        assert!(matches!(ev, Some(Event::TimerStarted { mode: Mode::Focus, .. })));
        assert_eq!(h.engine.remaining_secs(), 25 * 60);

        assert!(h.engine.handle_notification_action(NotificationAction::Dismiss).is_none());
        assert!(h.engine.is_playing());
    }

    #[test]
    fn apply_settings_resets_paused_interval_only() {
        let mut h = harness();
        let mut shorter = TimerSettings::default();
        shorter.work_minutes = 10;
        h.engine.apply_settings(shorter.clone());
        assert_eq!(h.engine.remaining_secs(), 10 * 60);

        h.engine.start();
        let mut longer = shorter;
        longer.work_minutes = 50;
        h.engine.apply_settings(longer);
        assert_eq!(h.engine.total_secs(), 10 * 60);
        h.engine.complete();
        h.engine.complete();
        assert_eq!(h.engine.remaining_secs(), 50 * 60);
    }

    #[test]
    fn target_pomodoros_is_cosmetic() {
        let mut h = harness();
        h.engine.set_target_pomodoros(0);
        assert_eq!(h.engine.target_pomodoros(), 1);
        h.engine.set_target_pomodoros(8);
        h.engine.complete();
        assert_eq!(h.engine.mode(), Mode::ShortBreak);
    }

    #[test]
    fn every_change_is_persisted() {
        let mut h = harness();
        h.engine.start();
        h.engine.tick();
        let stored: TimerSnapshot =
            load_json(h.store.as_ref(), keys::TIMER_SNAPSHOT).expect("snapshot saved");
        assert_eq!(stored, h.engine.snapshot());
    }

    #[test]
    fn restore_running_snapshot_corrects_remaining_and_pauses() {
        let mut h = harness();
        h.engine.start();
        h.clock.advance_secs(120);

        let mut engine = reopen(&h);
        let outcome = engine.restore();
        assert_eq!(outcome, RestoreOutcome::Corrected { elapsed_secs: 120 });
        assert!(!engine.is_playing());
        assert_eq!(engine.remaining_secs(), 25 * 60 - 120);
        assert!(engine.snapshot().markers_consistent());
        assert!(h.log.pending_notifications().is_empty());
    }

    #[test]
    fn restore_paused_snapshot_as_is() {
        let mut h = harness();
        h.engine.complete();
        h.engine.start();
        h.clock.advance_secs(30);
        h.engine.pause();
        h.clock.advance_secs(3600);

        let mut engine = reopen(&h);
        assert_eq!(engine.restore(), RestoreOutcome::Restored);
        assert_eq!(engine.mode(), Mode::ShortBreak);
        assert_eq!(engine.remaining_secs(), 5 * 60 - 30);
        assert_eq!(engine.completed_count(), 1);
    }

    #[test]
    fn restore_without_snapshot_is_fresh() {
        let h = harness();
        let mut engine = reopen(&h);
        assert_eq!(engine.restore(), RestoreOutcome::Fresh);
        assert_eq!(engine.remaining_secs(), 25 * 60);
    }

    // The legacy cold-start path only zeroed the clock and left mode and
    // count alone; here it completes like a live expiry, minus the noise.
    #[test]
    fn expired_while_suspended_advances_like_live_completion() {
        let mut h = harness_with(TimerSettings {
            auto_start_next: true,
            ..TimerSettings::default()
        });
        h.engine.start();
        h.clock.advance_secs(26 * 60);

        let mut engine = reopen(&h);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        engine.set_on_pomodoro_complete(Box::new(move |c| sink.lock().unwrap().push(c.clone())));
        h.log.clear();

        let outcome = engine.restore();
        assert!(matches!(
            outcome,
            RestoreOutcome::ExpiredWhileSuspended {
                event: Event::TimerCompleted {
                    while_suspended: true,
                    auto_start: false,
                    ..
                }
            }
        ));
        assert_eq!(engine.mode(), Mode::ShortBreak);
        assert_eq!(engine.completed_count(), 1);
        assert!(!engine.is_playing());
        assert!(!engine.auto_start_pending());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].while_suspended);
        assert_eq!(seen[0].completed_at_ms, T0 + 25 * 60 * 1000);

        assert_eq!(h.log.count(|c| matches!(c, GatewayCall::PlayAlarm(_))), 0);
        assert_eq!(h.log.count(|c| matches!(c, GatewayCall::SendImmediate { .. })), 0);
    }

    #[test]
    fn recorded_minutes_follow_the_interval_that_ran() {
        let mut h = harness_with(TimerSettings {
            work_minutes: 10,
            ..TimerSettings::default()
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        h.engine
            .set_on_pomodoro_complete(Box::new(move |c| sink.lock().unwrap().push(c.clone())));

        h.engine.start();
        h.engine.apply_settings(TimerSettings {
            work_minutes: 50,
            ..TimerSettings::default()
        });
        h.clock.advance_secs(10 * 60);
        assert!(matches!(h.engine.tick(), Some(Event::TimerCompleted { .. })));

        assert_eq!(seen.lock().unwrap()[0].duration_minutes, 10);
        // The next focus interval uses the new length.
        h.engine.complete();
        assert_eq!(h.engine.total_secs(), 50 * 60);
    }

    #[test]
    fn pause_from_another_process_stops_the_countdown() {
        let mut h = harness();
        h.engine.start();
        h.clock.advance_secs(30);

        let mut other = reopen(&h);
        assert_eq!(other.restore(), RestoreOutcome::Corrected { elapsed_secs: 30 });
        assert!(other.pause().is_none());

        h.clock.advance_secs(1);
        assert!(matches!(
            h.engine.follow_store(),
            Some(Event::StateSnapshot { is_playing: false, .. })
        ));
        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.remaining_secs(), 25 * 60 - 30);
        assert!(h.engine.tick().is_none());

        let stored: TimerSnapshot =
            load_json(h.store.as_ref(), keys::TIMER_SNAPSHOT).expect("snapshot saved");
        assert!(!stored.is_playing);
        assert_eq!(stored.remaining_seconds, 25 * 60 - 30);
    }

    #[test]
    fn reset_from_another_process_disarms_auto_start() {
        let mut h = harness_with(TimerSettings {
            auto_start_next: true,
            ..TimerSettings::default()
        });
        h.engine.complete();
        assert!(h.engine.auto_start_pending());

        let mut other = reopen(&h);
        other.restore();
        other.reset_session();

        assert!(h.engine.follow_store().is_some());
        h.clock.advance_secs(2);
        assert!(h.engine.tick().is_none());
        assert!(!h.engine.is_playing());
        assert_eq!(h.engine.mode(), Mode::Focus);
        assert_eq!(h.engine.completed_count(), 0);
    }

    #[test]
    fn observing_leaves_the_countdown_running() {
        let mut h = harness();
        h.engine.start();
        h.clock.advance_secs(30);
        let before: TimerSnapshot =
            load_json(h.store.as_ref(), keys::TIMER_SNAPSHOT).expect("snapshot saved");

        let mut other = reopen(&h);
        assert_eq!(other.observe(), RestoreOutcome::Live { elapsed_secs: 30 });
        assert!(other.is_playing());
        assert_eq!(other.remaining_secs(), 25 * 60 - 30);
        let after: TimerSnapshot =
            load_json(h.store.as_ref(), keys::TIMER_SNAPSHOT).expect("snapshot saved");
        assert_eq!(after, before);

        other.set_target_pomodoros(8);
        other.enable_ambient();
        assert!(matches!(
            h.engine.follow_store(),
            Some(Event::AmbientChanged { wanted: true, .. })
        ));
        assert!(h.engine.is_playing());
        assert!(h.engine.is_ambient_playing());
        assert_eq!(h.engine.target_pomodoros(), 8);
        assert!(h.engine.follow_store().is_none());
    }

    #[test]
    fn observing_an_expired_run_completes_it() {
        let mut h = harness();
        h.engine.start();
        h.clock.advance_secs(26 * 60);

        let mut other = reopen(&h);
        assert!(matches!(other.observe(), RestoreOutcome::ExpiredWhileSuspended { .. }));
        assert_eq!(other.mode(), Mode::ShortBreak);
        assert!(!other.is_playing());
    }
}
