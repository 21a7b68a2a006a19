use std::error::Error;

use clap::Subcommand;
use pomofocus_core::session::{clear_sessions, load_sessions};
use pomofocus_core::stats;
use serde_json::json;

use super::print_json;
use crate::app::App;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today, this week and all-time totals
    Today,
    /// Minutes and sessions per day
    Daily {
        /// Only the most recent N days with sessions
        #[arg(long)]
        days: Option<usize>,
    },
    /// Minutes per category
    Categories,
    /// Pomodoros per day over recent weeks
    Heatmap {
        #[arg(
            long,
            default_value = "12",
            value_parser = clap::value_parser!(u32).range(1..=i64::from(stats::MAX_HEATMAP_WEEKS))
        )]
        weeks: u32,
    },
    /// Current and best streak of consecutive days
    Streak,
    /// Delete the whole session history
    Clear,
}

pub fn run(app: &App, action: StatsAction) -> Result<(), Box<dyn Error>> {
    let store = app.store.as_ref();
    let today = app.clock.today();

    match action {
        StatsAction::Today => print_json(&stats::summary(&load_sessions(store), today))?,
        StatsAction::Daily { days } => {
            let mut daily = stats::daily_stats(&load_sessions(store));
            if let Some(days) = days {
                let skip = daily.len().saturating_sub(days);
                daily.drain(..skip);
            }
            print_json(&daily)?;
        }
        StatsAction::Categories => print_json(&stats::category_totals(&load_sessions(store)))?,
        StatsAction::Heatmap { weeks } => {
            print_json(&stats::heatmap(&load_sessions(store), today, weeks))?;
        }
        StatsAction::Streak => print_json(&stats::streaks(&load_sessions(store), today))?,
        StatsAction::Clear => {
            let removed = clear_sessions(store)?;
            print_json(&json!({ "removed": removed }))?;
        }
    }
    Ok(())
}
