//! Task list with pomodoro estimates.
//!
//! Active and archived tasks are disjoint ordered lists. A task moves to the
//! archive once its completed pomodoros reach the estimate, and can be
//! restored with its counters reset.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::storage::{keys, load_json, try_save_json, KeyValueStore};

/// Built-in category names. Any non-empty string is accepted.
pub const DEFAULT_CATEGORIES: &[&str] = &["work", "study", "personal", "other"];

pub const MIN_ESTIMATE: u32 = 1;
pub const MAX_ESTIMATE: u32 = 99;

/// A unit of work measured in pomodoros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub pomodoro_estimate: u32,
    pub pomodoros_completed: u32,
    pub completed: bool,
    pub completed_at_epoch_ms: Option<i64>,
    pub created_at_epoch_ms: i64,
    /// Position in its list; renumbered on every reorder.
    pub order: u32,
}

impl Task {
    /// Completion percentage (0.0 to 1.0).
    pub fn progress(&self) -> f64 {
        if self.pomodoro_estimate == 0 {
            0.0
        } else {
            (f64::from(self.pomodoros_completed) / f64::from(self.pomodoro_estimate)).min(1.0)
        }
    }

    fn reached_estimate(&self) -> bool {
        self.pomodoros_completed >= self.pomodoro_estimate
    }
}

/// Input for [`TaskBook::add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Falls back to `work`.
    #[serde(default)]
    pub category: Option<String>,
    pub pomodoro_estimate: u32,
}

impl NewTask {
    pub fn new(title: impl Into<String>, pomodoro_estimate: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: None,
            pomodoro_estimate,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update for [`TaskBook::edit`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub pomodoro_estimate: Option<u32>,
}

/// Result of crediting a pomodoro to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskProgress {
    Advanced { completed: u32, estimate: u32 },
    /// The estimate was reached; the task now sits in the archive.
    Archived(Task),
}

/// Active tasks, archived tasks and the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBook {
    active: Vec<Task>,
    archived: Vec<Task>,
    current: Option<String>,
}

impl TaskBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all three records; anything missing or unreadable is empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let active: Vec<Task> = load_json(store, keys::ACTIVE_TASKS).unwrap_or_default();
        let archived = load_json(store, keys::ARCHIVED_TASKS).unwrap_or_default();
        let current = load_json::<Option<String>>(store, keys::CURRENT_TASK)
            .flatten()
            .filter(|id| active.iter().any(|t| &t.id == id));
        Self {
            active,
            archived,
            current,
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        try_save_json(store, keys::ACTIVE_TASKS, &self.active)?;
        try_save_json(store, keys::ARCHIVED_TASKS, &self.archived)?;
        try_save_json(store, keys::CURRENT_TASK, &self.current)
    }

    pub fn active(&self) -> &[Task] {
        &self.active
    }

    pub fn archived(&self) -> &[Task] {
        &self.archived
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&Task> {
        let id = self.current.as_deref()?;
        self.active.iter().find(|t| t.id == id)
    }

    /// Look up in either list.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.active
            .iter()
            .chain(self.archived.iter())
            .find(|t| t.id == id)
    }

    pub fn add(&mut self, new: NewTask, now_ms: i64) -> Result<&Task> {
        let title = validate_title(&new.title)?;
        validate_estimate(new.pomodoro_estimate, MIN_ESTIMATE)?;
        let category = match new.category {
            Some(c) => validate_category(&c)?,
            None => DEFAULT_CATEGORIES[0].to_string(),
        };

        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description: normalize_description(new.description),
            category,
            pomodoro_estimate: new.pomodoro_estimate,
            pomodoros_completed: 0,
            completed: false,
            completed_at_epoch_ms: None,
            created_at_epoch_ms: now_ms,
            order: next_order(&self.active),
        };
        tracing::debug!(id = %task.id, title = %task.title, "task added");
        self.active.push(task);
        Ok(&self.active[self.active.len() - 1])
    }

    /// Apply `patch` to a task in either list. An active task's estimate
    /// cannot drop to or below what it has already completed.
    pub fn edit(&mut self, id: &str, patch: TaskPatch) -> Result<&Task> {
        let is_active = self.active.iter().any(|t| t.id == id);
        let task = self
            .active
            .iter_mut()
            .chain(self.archived.iter_mut())
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("task", id))?;

        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let category = patch.category.as_deref().map(validate_category).transpose()?;
        if let Some(estimate) = patch.pomodoro_estimate {
            let min = if is_active {
                task.pomodoros_completed + 1
            } else {
                MIN_ESTIMATE
            };
            validate_estimate(estimate, min)?;
            task.pomodoro_estimate = estimate;
        }
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(category) = category {
            task.category = category;
        }
        if let Some(description) = patch.description {
            task.description = normalize_description(description);
        }
        Ok(task)
    }

    /// Remove from whichever list holds it.
    pub fn delete(&mut self, id: &str) -> Result<Task> {
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        if let Some(index) = self.active.iter().position(|t| t.id == id) {
            let task = self.active.remove(index);
            renumber(&mut self.active);
            return Ok(task);
        }
        if let Some(index) = self.archived.iter().position(|t| t.id == id) {
            let task = self.archived.remove(index);
            renumber(&mut self.archived);
            return Ok(task);
        }
        Err(CoreError::not_found("task", id))
    }

    /// Move an active task to `to_index` (clamped to the list end).
    pub fn move_task(&mut self, id: &str, to_index: usize) -> Result<()> {
        let from = self
            .active
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("task", id))?;
        let task = self.active.remove(from);
        let to = to_index.min(self.active.len());
        self.active.insert(to, task);
        renumber(&mut self.active);
        Ok(())
    }

    /// Choose the task future pomodoros are credited to. Only active tasks
    /// can be selected.
    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            None => self.current = None,
            Some(id) => {
                if !self.active.iter().any(|t| t.id == id) {
                    return Err(CoreError::not_found("active task", id));
                }
                self.current = Some(id.to_string());
            }
        }
        Ok(())
    }

    /// Credit one pomodoro. Reaching the estimate archives the task.
    pub fn record_pomodoro(&mut self, id: &str, now_ms: i64) -> Result<TaskProgress> {
        let task = self
            .active
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("active task", id))?;
        task.pomodoros_completed += 1;
        if !task.reached_estimate() {
            return Ok(TaskProgress::Advanced {
                completed: task.pomodoros_completed,
                estimate: task.pomodoro_estimate,
            });
        }
        let archived = self.archive(id, now_ms)?;
        Ok(TaskProgress::Archived(archived))
    }

    /// Archive regardless of progress.
    pub fn complete_manually(&mut self, id: &str, now_ms: i64) -> Result<Task> {
        self.archive(id, now_ms)
    }

    /// Back to the end of the active list with counters reset.
    pub fn restore(&mut self, id: &str) -> Result<&Task> {
        let index = self
            .archived
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("archived task", id))?;
        let mut task = self.archived.remove(index);
        renumber(&mut self.archived);

        task.pomodoros_completed = 0;
        task.completed = false;
        task.completed_at_epoch_ms = None;
        task.order = next_order(&self.active);
        tracing::debug!(id = %task.id, "task restored");
        self.active.push(task);
        Ok(&self.active[self.active.len() - 1])
    }

    /// Drop every archived task; returns how many went.
    pub fn clear_archived(&mut self) -> usize {
        let n = self.archived.len();
        self.archived.clear();
        n
    }

    fn archive(&mut self, id: &str, now_ms: i64) -> Result<Task> {
        let index = self
            .active
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::not_found("active task", id))?;
        let mut task = self.active.remove(index);
        renumber(&mut self.active);
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }

        task.completed = true;
        task.completed_at_epoch_ms = Some(now_ms);
        task.order = next_order(&self.archived);
        tracing::info!(
            id = %task.id,
            title = %task.title,
            pomodoros = task.pomodoros_completed,
            "task archived"
        );
        self.archived.push(task.clone());
        Ok(task)
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::Empty("title").into());
    }
    Ok(title.to_string())
}

fn validate_category(category: &str) -> Result<String> {
    let category = category.trim();
    if category.is_empty() {
        return Err(ValidationError::Empty("category").into());
    }
    Ok(category.to_lowercase())
}

fn validate_estimate(estimate: u32, min: u32) -> Result<()> {
    if estimate < min || estimate > MAX_ESTIMATE {
        return Err(ValidationError::OutOfRange {
            field: "pomodoro_estimate",
            value: i64::from(estimate),
            min: i64::from(min),
            max: i64::from(MAX_ESTIMATE),
        }
        .into());
    }
    Ok(())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn next_order(list: &[Task]) -> u32 {
    u32::try_from(list.len()).unwrap_or(u32::MAX)
}

fn renumber(list: &mut [Task]) {
    for (i, task) in list.iter_mut().enumerate() {
        task.order = u32::try_from(i).unwrap_or(u32::MAX);
    }
}
