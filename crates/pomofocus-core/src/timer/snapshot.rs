use serde::{Deserialize, Serialize};

use super::Mode;

/// Persisted timer state, rewritten on every change.
///
/// At most one of `started_at_epoch_ms` / `paused_at_epoch_ms` is set.
/// `started_at_epoch_ms` is the anchor `now - elapsed_so_far`, so remaining
/// time can be recomputed from the wall clock after a suspension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: Mode,
    pub remaining_seconds: u32,
    pub is_playing: bool,
    pub completed_count: u32,
    pub started_at_epoch_ms: Option<i64>,
    pub paused_at_epoch_ms: Option<i64>,
    #[serde(default = "default_target")]
    pub target_pomodoros: u32,
    #[serde(default)]
    pub ambient_wanted: bool,
}

pub(crate) fn default_target() -> u32 {
    4
}

impl TimerSnapshot {
    pub fn markers_consistent(&self) -> bool {
        !(self.started_at_epoch_ms.is_some() && self.paused_at_epoch_ms.is_some())
    }
}

/// What the cold-start resume policy did with a stored snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// Nothing stored; fresh Focus interval.
    Fresh,
    /// Stored paused state taken as is.
    Restored,
    /// Was running; remaining time corrected from the wall clock, now paused.
    Corrected { elapsed_secs: u32 },
    /// Still counting down in another process; mirrored as running.
    Live { elapsed_secs: u32 },
    /// Ran out while suspended and was completed silently.
    ExpiredWhileSuspended { event: crate::events::Event },
}
