mod clock;
mod engine;
mod mode;
mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{CompletionCallback, Gateways, PomodoroCompleted, TimerEngine, AUTO_START_DELAY_MS};
pub use mode::Mode;
pub use snapshot::{RestoreOutcome, TimerSnapshot};
