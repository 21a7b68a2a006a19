use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::streak::streaks;
use crate::session::FocusSession;

/// Minutes and sessions for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub total_minutes: u32,
    pub sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub minutes: u32,
    pub sessions: u32,
}

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub today_minutes: u32,
    pub today_sessions: u32,
    /// Last seven days including today.
    pub week_minutes: u32,
    pub total_minutes: u32,
    pub total_sessions: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}

/// One entry per day that has sessions, oldest first.
pub fn daily_stats(sessions: &[FocusSession]) -> Vec<DailyStat> {
    let mut by_day: BTreeMap<NaiveDate, (u32, u32)> = BTreeMap::new();
    for s in sessions {
        let entry = by_day.entry(s.date).or_default();
        entry.0 += s.duration_minutes;
        entry.1 += 1;
    }
    by_day
        .into_iter()
        .map(|(date, (total_minutes, sessions))| DailyStat {
            date,
            total_minutes,
            sessions,
        })
        .collect()
}

/// Per-category totals, most minutes first (ties by name).
pub fn category_totals(sessions: &[FocusSession]) -> Vec<CategoryTotal> {
    let mut by_category: HashMap<&str, (u32, u32)> = HashMap::new();
    for s in sessions {
        let entry = by_category.entry(s.category.as_str()).or_default();
        entry.0 += s.duration_minutes;
        entry.1 += 1;
    }
    let mut totals: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (minutes, sessions))| CategoryTotal {
            category: category.to_string(),
            minutes,
            sessions,
        })
        .collect();
    totals.sort_by(|a, b| {
        b.minutes
            .cmp(&a.minutes)
            .then_with(|| a.category.cmp(&b.category))
    });
    totals
}

pub fn summary(sessions: &[FocusSession], today: NaiveDate) -> Summary {
    let week_start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
    let mut out = Summary {
        today_minutes: 0,
        today_sessions: 0,
        week_minutes: 0,
        total_minutes: 0,
        total_sessions: 0,
        current_streak: 0,
        best_streak: 0,
    };
    for s in sessions {
        out.total_minutes += s.duration_minutes;
        out.total_sessions += 1;
        if s.date == today {
            out.today_minutes += s.duration_minutes;
            out.today_sessions += 1;
        }
        if s.date >= week_start && s.date <= today {
            out.week_minutes += s.duration_minutes;
        }
    }
    let streak = streaks(sessions, today);
    out.current_streak = streak.current;
    out.best_streak = streak.best;
    out
}
