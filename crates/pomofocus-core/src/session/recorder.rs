use std::sync::Arc;

use super::{append_session, FocusSession};
use crate::error::Result;
use crate::settings::Settings;
use crate::storage::KeyValueStore;
use crate::task::{TaskBook, TaskProgress};
use crate::timer::{Clock, PomodoroCompleted, TimerEngine};

/// What one completed pomodoro produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPomodoro {
    pub session: FocusSession,
    /// Progress of the selected task, if one was selected.
    pub task: Option<TaskProgress>,
}

/// Turns Focus completions into session records and task progress.
///
/// The selected task and default category are read from the store when a
/// completion arrives, so changing either never requires re-registering.
#[derive(Clone)]
pub struct SessionRecorder {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SessionRecorder {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Install as the engine's completion delegate. Failures are logged;
    /// the timer carries on either way.
    pub fn register(&self, engine: &mut TimerEngine) {
        let recorder = self.clone();
        engine.set_on_pomodoro_complete(Box::new(move |completion| {
            if let Err(e) = recorder.record(completion) {
                tracing::warn!(error = %e, "failed to record pomodoro");
            }
        }));
    }

    pub fn record(&self, completion: &PomodoroCompleted) -> Result<RecordedPomodoro> {
        let store = self.store.as_ref();
        let mut book = TaskBook::load(store);
        let task = book.current().cloned();
        let category = match &task {
            Some(task) => task.category.clone(),
            None => Settings::load(store).default_category,
        };

        let session = FocusSession {
            id: uuid::Uuid::new_v4().to_string(),
            date: self.clock.date_of(completion.completed_at_ms),
            duration_minutes: completion.duration_minutes,
            category,
            task_id: task.as_ref().map(|t| t.id.clone()),
            task_title: task.as_ref().map(|t| t.title.clone()),
            completed_at_epoch_ms: completion.completed_at_ms,
        };
        append_session(store, &session)?;

        let progress = match task {
            Some(task) => {
                let progress = book.record_pomodoro(&task.id, completion.completed_at_ms)?;
                book.save(store)?;
                Some(progress)
            }
            None => None,
        };

        tracing::info!(
            date = %session.date,
            category = %session.category,
            task = session.task_title.as_deref().unwrap_or("-"),
            while_suspended = completion.while_suspended,
            "pomodoro recorded"
        );
        Ok(RecordedPomodoro {
            session,
            task: progress,
        })
    }
}
