//! Completed focus sessions.
//!
//! The session log is append-only: records are never edited or removed one
//! by one, only cleared in bulk.

mod recorder;

pub use recorder::{RecordedPomodoro, SessionRecorder};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{keys, load_json, try_save_json, KeyValueStore};

/// One completed Focus interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    /// Local calendar day of completion, `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub category: String,
    /// Soft reference; the task may since have been deleted.
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub completed_at_epoch_ms: i64,
}

/// Every stored session, oldest first.
pub fn load_sessions(store: &dyn KeyValueStore) -> Vec<FocusSession> {
    load_json(store, keys::SESSIONS).unwrap_or_default()
}

pub fn append_session(store: &dyn KeyValueStore, session: &FocusSession) -> Result<()> {
    let mut sessions = load_sessions(store);
    sessions.push(session.clone());
    try_save_json(store, keys::SESSIONS, &sessions)
}

/// Bulk clear; returns how many were removed.
pub fn clear_sessions(store: &dyn KeyValueStore) -> Result<usize> {
    let n = load_sessions(store).len();
    store.remove(keys::SESSIONS)?;
    tracing::info!(removed = n, "session history cleared");
    Ok(n)
}
