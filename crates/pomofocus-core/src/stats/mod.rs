//! Analytics over the session log.
//!
//! Everything here is a pure function of `&[FocusSession]` and is
//! recomputed on every read; nothing is cached or stored.

mod daily;
mod heatmap;
mod streak;

pub use daily::{category_totals, daily_stats, summary, CategoryTotal, DailyStat, Summary};
pub use heatmap::{heatmap, intensity_level, HeatmapCell, MAX_HEATMAP_WEEKS};
pub use streak::{streaks, Streaks};
