use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::session::FocusSession;

/// One day on the calendar heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    /// Pomodoros completed that day.
    pub count: u32,
    /// 0 (none) ..= 4 (busiest).
    pub level: u8,
}

/// Colour bucket for a day's pomodoro count.
pub fn intensity_level(count: u32) -> u8 {
    match count {
        0 => 0,
        1 => 1,
        2..=3 => 2,
        4..=5 => 3,
        _ => 4,
    }
}

/// Longest heatmap window, two years.
pub const MAX_HEATMAP_WEEKS: u32 = 104;

/// `7 * weeks` cells ending today, oldest first. `weeks` is capped at
/// [`MAX_HEATMAP_WEEKS`].
pub fn heatmap(sessions: &[FocusSession], today: NaiveDate, weeks: u32) -> Vec<HeatmapCell> {
    let days = u64::from(weeks.min(MAX_HEATMAP_WEEKS)) * 7;
    if days == 0 {
        return Vec::new();
    }

    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for s in sessions {
        *counts.entry(s.date).or_default() += 1;
    }

    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| {
            let count = counts.get(&date).copied().unwrap_or(0);
            HeatmapCell {
                date,
                count,
                level: intensity_level(count),
            }
        })
        .collect()
}
