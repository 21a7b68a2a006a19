use std::error::Error;
use std::time::Duration;

use clap::{Subcommand, ValueEnum};
use pomofocus_core::timer::Mode;
use pomofocus_core::{Event, NotificationAction, TimerEngine};
use tokio::time::MissedTickBehavior;

use super::print_json;
use crate::app::App;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start and count down in the foreground (Ctrl-C pauses)
    Start,
    /// Pause a timer left running
    Pause,
    /// Back to the full length of the current mode
    Reset,
    /// Forget the cycle: Focus, zero pomodoros
    ResetSession,
    /// Print current timer state as JSON
    Status,
    /// Jump to the next mode without counting the interval
    Skip,
    /// Switch mode by hand (focus, short-break, long-break)
    Mode { mode: Mode },
    /// Set the daily pomodoro goal shown in status
    Target { count: u32 },
    /// Respond to a completion notice, then count down
    Action { action: NoticeAction },
    /// Ambient sound while the timer runs
    Ambient { state: Toggle },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NoticeAction {
    StartBreak,
    StartFocus,
    Dismiss,
}

impl From<NoticeAction> for NotificationAction {
    fn from(action: NoticeAction) -> Self {
        match action {
            NoticeAction::StartBreak => NotificationAction::StartBreak,
            NoticeAction::StartFocus => NotificationAction::StartFocus,
            NoticeAction::Dismiss => NotificationAction::Dismiss,
        }
    }
}

pub fn run(app: &App, action: TimerAction) -> Result<(), Box<dyn Error>> {
    // Looking or tweaking leaves a foreground countdown running; anything
    // else takes the timer over and pauses it first.
    let observing = matches!(
        action,
        TimerAction::Status | TimerAction::Target { .. } | TimerAction::Ambient { .. }
    );
    let (mut engine, _) = if observing {
        app.observed_engine()
    } else {
        app.engine()
    };

    match action {
        TimerAction::Start => {
            if let Some(event) = engine.start() {
                print_json(&event)?;
            }
            count_down(&mut engine)?;
        }
        TimerAction::Pause => match engine.pause() {
            Some(event) => print_json(&event)?,
            // Restoring already paused a countdown left running elsewhere.
            None => print_json(&engine.status())?,
        },
        TimerAction::Reset => print_json(&engine.reset_timer())?,
        TimerAction::ResetSession => print_json(&engine.reset_session())?,
        TimerAction::Status => print_json(&engine.status())?,
        TimerAction::Skip => print_json(&engine.skip())?,
        TimerAction::Mode { mode } => print_json(&engine.select_mode(mode))?,
        TimerAction::Target { count } => {
            engine.set_target_pomodoros(count);
            print_json(&engine.status())?;
        }
        TimerAction::Action { action } => {
            match engine.handle_notification_action(action.into()) {
                Some(event) => {
                    print_json(&event)?;
                    count_down(&mut engine)?;
                }
                None => print_json(&engine.status())?,
            }
        }
        TimerAction::Ambient { state } => {
            let event = match state {
                Toggle::On => engine.enable_ambient(),
                Toggle::Off => engine.disable_ambient(),
            };
            print_json(&event)?;
        }
    }
    Ok(())
}

/// One tick a second until the interval ends with nothing queued after it,
/// Ctrl-C pauses, or another command stops the timer.
fn count_down(engine: &mut TimerEngine) -> Result<(), Box<dyn Error>> {
    if !engine.is_playing() {
        return Ok(());
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(event) = engine.follow_store() {
                        eprintln!();
                        print_json(&event)?;
                        if !engine.is_playing() && !engine.auto_start_pending() {
                            eprintln!("note: timer changed by another pomofocus command");
                            break;
                        }
                    }
                    match engine.tick() {
                        Some(event) => {
                            eprintln!();
                            print_json(&event)?;
                            if matches!(event, Event::TimerCompleted { .. }) && !engine.auto_start_pending() {
                                break;
                            }
                        }
                        None if engine.is_playing() => {
                            eprint!("\r{:<12} {}", engine.mode().label(), engine.remaining_label());
                        }
                        None => {}
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    eprintln!();
                    if let Some(event) = engine.pause() {
                        print_json(&event)?;
                    }
                    break;
                }
            }
        }
        Ok::<(), Box<dyn Error>>(())
    })
}
