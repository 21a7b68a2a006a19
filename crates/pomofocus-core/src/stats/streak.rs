use chrono::NaiveDate;
use serde::Serialize;

use crate::session::FocusSession;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    /// Run of consecutive days ending today or yesterday; 0 otherwise.
    pub current: u32,
    /// Longest run of consecutive days ever.
    pub best: u32,
}

/// Consecutive-day streaks.
///
/// A streak is alive while the latest session day is today or yesterday.
pub fn streaks(sessions: &[FocusSession], today: NaiveDate) -> Streaks {
    let mut dates: Vec<NaiveDate> = sessions.iter().map(|s| s.date).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let Some(&latest) = dates.first() else {
        return Streaks::default();
    };
    let active = latest == today || today.pred_opt() == Some(latest);

    let mut best = 1;
    let mut run = 1;
    let mut current = u32::from(active);
    // Still walking the run that starts at the latest day.
    let mut in_leading_run = active;
    for pair in dates.windows(2) {
        if (pair[0] - pair[1]).num_days() == 1 {
            run += 1;
            if in_leading_run {
                current = run;
            }
        } else {
            run = 1;
            in_leading_run = false;
        }
        best = best.max(run);
    }

    Streaks { current, best }
}
