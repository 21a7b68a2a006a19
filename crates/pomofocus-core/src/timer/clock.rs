//! Wall-clock source.
//!
//! Every timestamp the core records comes from a [`Clock`], so tests can
//! pin time and simulate suspension by jumping it forward.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Calendar date an instant falls on.
    fn date_of(&self, epoch_ms: i64) -> NaiveDate;

    fn today(&self) -> NaiveDate {
        self.date_of(self.now_ms())
    }
}

/// System time, local calendar.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn date_of(&self, epoch_ms: i64) -> NaiveDate {
        DateTime::from_timestamp_millis(epoch_ms)
            .map(|dt| dt.with_timezone(&Local).date_naive())
            .unwrap_or_default()
    }
}

/// Hand-driven clock, UTC calendar.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Clock set to midday UTC on `date`.
    pub fn on_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self::new(noon)
    }

    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn date_of(&self, epoch_ms: i64) -> NaiveDate {
        DateTime::from_timestamp_millis(epoch_ms)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance_secs(2);
        assert_eq!(clock.now_ms(), 3_000);
        clock.set_ms(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn on_date_lands_on_that_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let clock = ManualClock::on_date(day);
        assert_eq!(clock.today(), day);
        clock.advance_secs(11 * 3600 + 59 * 60);
        assert_eq!(clock.today(), day);
        clock.advance_secs(60);
        assert_eq!(clock.today(), day.succ_opt().unwrap());
    }
}
