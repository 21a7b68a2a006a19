use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Every timer state change produces an Event.
/// Front ends render from them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// An interval ran out (live, or while the process was suspended).
    TimerCompleted {
        mode: Mode,
        next_mode: Mode,
        completed_count: u32,
        while_suspended: bool,
        auto_start: bool,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Mode,
        to: Mode,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    ModeSelected {
        mode: Mode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    AmbientChanged {
        wanted: bool,
        playing: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        is_playing: bool,
        remaining_secs: u32,
        total_secs: u32,
        remaining_label: String,
        completed_count: u32,
        target_pomodoros: u32,
        ambient_playing: bool,
        at: DateTime<Utc>,
    },
}
